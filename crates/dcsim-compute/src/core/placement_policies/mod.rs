pub mod active_servers;
pub mod first_fit;
pub mod worst_fit;
