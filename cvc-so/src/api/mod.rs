//! HTTP API handlers for cvc-so

pub mod buildinfo;
pub mod custom_services;
pub mod elements;
pub mod error;
pub mod health;
pub mod services;
pub mod templates;

pub use buildinfo::get_build_info;
pub use custom_services::{
    create_custom_service, get_custom_service, import_custom_service, list_custom_services,
};
pub use elements::{set_reference, set_selection};
pub use error::ApiError;
pub use health::health_routes;
pub use services::{
    delete_service, get_readiness, get_service, list_services, preview_service, save_draft,
    save_service,
};
pub use templates::get_template;
