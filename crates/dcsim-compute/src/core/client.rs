//! Per-caller session facade of the compute service.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::core::common::ResourceId;
use crate::core::error::ComputeError;
use crate::core::flavor::Flavor;
use crate::core::image::Image;
use crate::core::server::Server;
use crate::core::service::ComputeService;

/// A client session bound to a compute service.
///
/// Clients hold no state of their own beyond the closed flag; every mutation
/// is delegated to the service, which also owns identifier uniqueness.
/// Closing a client invalidates future calls but does not destroy entities
/// created through it.
pub struct ComputeClient {
    service: Rc<RefCell<ComputeService>>,
    closed: bool,
}

impl ComputeClient {
    pub fn new(service: Rc<RefCell<ComputeService>>) -> Self {
        Self { service, closed: false }
    }

    fn ensure_open(&self) -> Result<(), ComputeError> {
        if self.closed {
            return Err(ComputeError::ClientClosed);
        }
        Ok(())
    }

    // FLAVORS /////////////////////////////////////////////////////////////////////////////////////

    pub fn new_flavor(
        &self,
        name: &str,
        cpu_count: u32,
        memory_size: u64,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
    ) -> Result<Rc<Flavor>, ComputeError> {
        self.ensure_open()?;
        self.service
            .borrow_mut()
            .create_flavor(name, cpu_count, memory_size, labels, meta)
    }

    pub fn find_flavor(&self, id: ResourceId) -> Result<Option<Rc<Flavor>>, ComputeError> {
        self.ensure_open()?;
        Ok(self.service.borrow().find_flavor(id))
    }

    pub fn query_flavors(&self) -> Result<Vec<Rc<Flavor>>, ComputeError> {
        self.ensure_open()?;
        Ok(self.service.borrow().flavors())
    }

    pub fn delete_flavor(&self, id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        self.service.borrow_mut().delete_flavor(id)
    }

    // IMAGES //////////////////////////////////////////////////////////////////////////////////////

    pub fn new_image(
        &self,
        name: &str,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
    ) -> Result<Rc<Image>, ComputeError> {
        self.ensure_open()?;
        self.service.borrow_mut().create_image(name, labels, meta)
    }

    pub fn find_image(&self, id: ResourceId) -> Result<Option<Rc<Image>>, ComputeError> {
        self.ensure_open()?;
        Ok(self.service.borrow().find_image(id))
    }

    pub fn query_images(&self) -> Result<Vec<Rc<Image>>, ComputeError> {
        self.ensure_open()?;
        Ok(self.service.borrow().images())
    }

    pub fn delete_image(&self, id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        self.service.borrow_mut().delete_image(id)
    }

    // SERVERS /////////////////////////////////////////////////////////////////////////////////////

    /// Creates a server in the `Provisioning` state. With `start = true` the
    /// server is immediately enqueued for placement at the next quantum.
    #[allow(clippy::too_many_arguments)]
    pub fn new_server(
        &self,
        name: &str,
        image_id: ResourceId,
        flavor_id: ResourceId,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
        expected_lifetime: Option<f64>,
        start: bool,
    ) -> Result<Rc<RefCell<Server>>, ComputeError> {
        self.ensure_open()?;
        self.service
            .borrow_mut()
            .create_server(name, image_id, flavor_id, labels, meta, expected_lifetime, start)
    }

    /// Like [`new_server`](Self::new_server), but the creation itself happens
    /// `delay` milliseconds into the simulated future. Returns the id the
    /// server will carry.
    #[allow(clippy::too_many_arguments)]
    pub fn new_server_after(
        &self,
        name: &str,
        image_id: ResourceId,
        flavor_id: ResourceId,
        labels: HashMap<String, String>,
        meta: HashMap<String, Value>,
        expected_lifetime: Option<f64>,
        start: bool,
        delay: f64,
    ) -> Result<ResourceId, ComputeError> {
        self.ensure_open()?;
        self.service.borrow_mut().submit_server_after(
            name,
            image_id,
            flavor_id,
            labels,
            meta,
            expected_lifetime,
            start,
            delay,
        )
    }

    pub fn find_server(&self, id: ResourceId) -> Result<Option<Rc<RefCell<Server>>>, ComputeError> {
        self.ensure_open()?;
        Ok(self.service.borrow().find_server(id))
    }

    pub fn query_servers(&self) -> Result<Vec<Rc<RefCell<Server>>>, ComputeError> {
        self.ensure_open()?;
        Ok(self.service.borrow().servers())
    }

    /// Cancels the pending scheduling request of the given server.
    pub fn cancel_scheduling(&self, server_id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        self.service.borrow_mut().cancel_scheduling(server_id)
    }

    pub fn delete_server(&self, server_id: ResourceId) -> Result<(), ComputeError> {
        self.ensure_open()?;
        self.service.borrow_mut().delete_server(server_id)
    }

    /// Closes this session. Entities created through it stay registered.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
