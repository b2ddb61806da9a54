//! Simulation configuration.

use serde::{Deserialize, Serialize};

/// Auxiliary structure to parse [`ComputeConfig`] from a file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ComputeConfigRaw {
    /// width of the scheduling quantum in milliseconds
    pub scheduling_quantum: Option<f64>,
    /// allocation policy name resolved at service construction
    pub allocation_policy: Option<String>,
    /// seed of the service-owned identifier generator
    pub id_seed: Option<u64>,
    /// physical hosts created at simulation start
    pub hosts: Option<Vec<HostConfig>>,
}

/// Represents physical host(s) configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Host name. Should be set if count = 1.
    pub name: Option<String>,
    /// Host name prefix. Full name is produced by appending the instance
    /// number to the prefix. Should be set if count > 1.
    pub name_prefix: Option<String>,
    /// host CPU capacity
    pub cpu_count: u32,
    /// host memory capacity in bytes
    pub memory_size: u64,
    /// number of such hosts
    pub count: Option<u32>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ComputeConfig {
    /// width of the scheduling quantum in milliseconds
    pub scheduling_quantum: f64,
    /// allocation policy name resolved at service construction
    pub allocation_policy: String,
    /// seed of the service-owned identifier generator
    pub id_seed: u64,
    /// physical hosts created at simulation start
    pub hosts: Vec<HostConfig>,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            scheduling_quantum: 60_000.,
            allocation_policy: "ActiveServers".to_string(),
            id_seed: 1,
            hosts: Vec::new(),
        }
    }
}

impl ComputeConfig {
    pub fn new(scheduling_quantum: f64) -> Self {
        Self {
            scheduling_quantum,
            ..Default::default()
        }
    }

    /// Returns the total host count.
    pub fn number_of_hosts(&self) -> u32 {
        self.hosts.iter().map(|host| host.count.unwrap_or(1)).sum()
    }

    /// Creates a config by reading parameter values from a .yaml file, using
    /// default values for absent parameters.
    pub fn from_file(file_name: &str) -> Self {
        let raw: ComputeConfigRaw = serde_yaml::from_str(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
        .unwrap_or_else(|_| panic!("Can't parse YAML from file {}", file_name));

        let defaults = ComputeConfig::default();
        Self {
            scheduling_quantum: raw.scheduling_quantum.unwrap_or(defaults.scheduling_quantum),
            allocation_policy: raw.allocation_policy.unwrap_or(defaults.allocation_policy),
            id_seed: raw.id_seed.unwrap_or(defaults.id_seed),
            hosts: raw.hosts.unwrap_or_default(),
        }
    }
}
