use std::collections::HashMap;
use std::rc::Rc;

use dcsim_core::Id;

use dcsim_compute::core::flavor::Flavor;
use dcsim_compute::core::host::HostModel;
use dcsim_compute::core::host_pool::HostPool;
use dcsim_compute::core::image::Image;
use dcsim_compute::core::placement::{allocation_policy_resolver, AllocationPolicy};
use dcsim_compute::core::placement_policies::active_servers::ActiveServers;
use dcsim_compute::core::placement_policies::first_fit::FirstFit;
use dcsim_compute::core::placement_policies::worst_fit::WorstFit;
use dcsim_compute::core::server::Server;

const GIB: u64 = 1 << 30;

fn flavor(cpu_count: u32, memory_size: u64) -> Rc<Flavor> {
    Rc::new(Flavor {
        id: 1,
        name: "flavor".to_string(),
        cpu_count,
        memory_size,
        labels: HashMap::new(),
        meta: HashMap::new(),
    })
}

fn server(flavor: Rc<Flavor>) -> Server {
    let image = Rc::new(Image {
        id: 2,
        name: "image".to_string(),
        labels: HashMap::new(),
        meta: HashMap::new(),
    });
    Server::new(3, "server".to_string(), flavor, image, HashMap::new(), HashMap::new(), None)
}

fn pool_of(hosts: &[(Id, u32, u64)]) -> HostPool {
    let mut pool = HostPool::new();
    for &(id, cpu_count, memory_size) in hosts {
        pool.add_host(id, HostModel { cpu_count, memory_size }, true);
    }
    pool
}

#[test]
fn active_servers_prefers_the_busiest_fitting_host() {
    let mut pool = pool_of(&[(1, 8, 8 * GIB), (2, 8, 8 * GIB), (3, 8, 8 * GIB)]);
    let small = flavor(2, GIB);
    pool.allocate(2, &small);
    pool.allocate(2, &small);
    pool.allocate(3, &small);

    let policy = ActiveServers::new();
    let pending = server(flavor(2, GIB));
    assert_eq!(policy.select_host(&pending, &pool), Some(2));
}

#[test]
fn active_servers_breaks_ties_by_lowest_host_id() {
    let pool = pool_of(&[(5, 8, 8 * GIB), (7, 8, 8 * GIB), (9, 8, 8 * GIB)]);
    let policy = ActiveServers::new();
    let pending = server(flavor(2, GIB));
    assert_eq!(policy.select_host(&pending, &pool), Some(5));
}

#[test]
fn active_servers_skips_hosts_that_cannot_fit() {
    let mut pool = pool_of(&[(1, 4, 8 * GIB), (2, 4, 8 * GIB)]);
    // host 1 is busier but has no cores left
    let half = flavor(2, GIB);
    pool.allocate(1, &half);
    pool.allocate(1, &half);
    pool.allocate(2, &half);

    let policy = ActiveServers::new();
    let pending = server(flavor(2, GIB));
    assert_eq!(policy.select_host(&pending, &pool), Some(2));
}

#[test]
fn active_servers_returns_none_when_nothing_fits() {
    let pool = pool_of(&[(1, 2, GIB)]);
    let policy = ActiveServers::new();
    let pending = server(flavor(4, GIB));
    assert_eq!(policy.select_host(&pending, &pool), None);
}

#[test]
fn unavailable_hosts_are_not_candidates() {
    let mut pool = pool_of(&[(1, 8, 8 * GIB), (2, 8, 8 * GIB)]);
    pool.set_unavailable(1);

    let policy = ActiveServers::new();
    let pending = server(flavor(2, GIB));
    assert_eq!(policy.select_host(&pending, &pool), Some(2));
}

#[test]
fn first_fit_selects_the_first_suitable_host() {
    let mut pool = pool_of(&[(1, 2, GIB), (2, 8, 8 * GIB), (3, 8, 8 * GIB)]);
    // host 1 is too small for the pending server
    pool.allocate(1, &flavor(2, GIB));

    let policy = FirstFit::new();
    let pending = server(flavor(4, 2 * GIB));
    assert_eq!(policy.select_host(&pending, &pool), Some(2));
}

#[test]
fn worst_fit_selects_the_host_with_most_free_cores() {
    let mut pool = pool_of(&[(1, 8, 8 * GIB), (2, 8, 8 * GIB), (3, 8, 8 * GIB)]);
    pool.allocate(1, &flavor(4, GIB));
    pool.allocate(3, &flavor(2, GIB));

    let policy = WorstFit::new();
    let pending = server(flavor(2, GIB));
    assert_eq!(policy.select_host(&pending, &pool), Some(2));
}

#[test]
fn resolver_produces_the_named_policy() {
    let pool = pool_of(&[(1, 8, 8 * GIB), (2, 8, 8 * GIB)]);
    let pending = server(flavor(2, GIB));
    for name in ["ActiveServers", "FirstFit", "WorstFit"] {
        let policy = allocation_policy_resolver(name);
        assert_eq!(policy.select_host(&pending, &pool), Some(1));
    }
}

#[test]
#[should_panic]
fn resolver_rejects_unknown_policy_names() {
    allocation_policy_resolver("RoundRobin");
}

#[test]
fn host_view_accounting_round_trips() {
    let mut pool = pool_of(&[(1, 4, 4 * GIB)]);
    let f = flavor(2, GIB);

    assert!(pool.can_fit(1, &f));
    pool.allocate(1, &f);
    pool.allocate(1, &f);

    let view = pool.view(1).unwrap();
    assert_eq!(view.number_of_active_servers, 2);
    assert_eq!(view.provisioned_cores, 4);
    assert_eq!(view.available_memory, 2 * GIB);
    assert!(!pool.can_fit(1, &f));

    pool.release(1, &f);
    pool.release(1, &f);
    let view = pool.view(1).unwrap();
    assert_eq!(view.number_of_active_servers, 0);
    assert_eq!(view.provisioned_cores, 0);
    assert_eq!(view.available_memory, 4 * GIB);
    assert!(pool.can_fit(1, &f));
}

#[test]
fn exact_fit_is_accepted() {
    let pool = pool_of(&[(1, 4, 2 * GIB)]);
    assert!(pool.can_fit(1, &flavor(4, 2 * GIB)));
    assert!(!pool.can_fit(1, &flavor(5, 2 * GIB)));
    assert!(!pool.can_fit(1, &flavor(4, 2 * GIB + 1)));
}
