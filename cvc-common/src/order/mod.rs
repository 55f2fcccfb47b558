//! Order of worship: element model, classification, parsing and reconciliation
//!
//! Data flow for a pastor save:
//!
//! ```text
//! raw text -> parse_order (reuses exact matches) -> reconcile (against stored
//! elements) -> full-document save
//! ```

pub mod classifier;
pub mod document;
pub mod element;
pub mod parser;
pub mod reconciler;
pub mod templates;

pub use classifier::{classify, classify_fuzzy, FuzzyClassification, Suggestion};
pub use document::{Readiness, ServiceDocument, ServiceType};
pub use element::{ElementKind, ElementType, ServiceElement, SongKind, SongSelection};
pub use parser::{import_order, parse_order, ImportLine};
pub use reconciler::{reconcile, reconcile_with_report, ReconcileReport};
pub use templates::template_for;
