// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod docker_repo;
pub mod error;
pub mod models;
pub mod publisher;
pub mod source;
pub mod sysinfo_repo;
pub mod version;
pub mod worker;
