//! Query engine behind the AMR genomic-surveillance portal: filtering,
//! ordering, aggregation, organism similarity, novelty scores and exports
//! over an in-memory set of genome records.

pub mod about;
pub mod aggregate;
pub mod boundary;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod geo;
pub mod logging;
pub mod query;
pub mod relationship;
pub mod url_state;

pub use dataset::RecordSet;
pub use engine::{Engine, Operation, PortalEngine, PortalView};
pub use error::PortalError;
pub use portal_protocol as protocol;
