//! Database initialization and stores

pub mod custom_services;
pub mod init;
pub mod services;

pub use custom_services::*;
pub use init::*;
pub use services::*;
