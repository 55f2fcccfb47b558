//! # CVC Common Library
//!
//! Shared code for the church volunteer coordination services:
//! - Order of worship model, line classification and parsing
//! - Reconciliation of edited orders against recorded song picks and readings
//! - Service-type templates and service-date keys
//! - Database initialization and the service document store
//! - Configuration loading
//! - Debounced task handles

pub mod config;
pub mod db;
pub mod debounce;
pub mod error;
pub mod order;
pub mod time;

pub use error::{Error, Result};
pub use order::{
    classify, parse_order, reconcile, ElementKind, ElementType, ServiceDocument, ServiceElement,
    ServiceType, SongSelection,
};
pub use time::ServiceDate;
