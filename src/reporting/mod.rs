pub mod format;
pub mod service;
pub mod trend;
