//! # Matriculas Common Library
//!
//! Shared code for the matriculas dashboard services including:
//! - Record model and the nine-dataset catalog
//! - Matricula normalization and the r1/r2 enrichment join
//! - Two-tier dataset cache (capped in-memory tier, uncapped SQLite tier)
//! - Dataset access gateway over a remote HTTP data source
//! - Cross-reference resolution and aggregation statistics
//! - Roles, users and configuration loading

pub mod cache;
pub mod config;
pub mod datasets;
pub mod db;
pub mod enrich;
pub mod error;
pub mod gateway;
pub mod matricula;
pub mod record;
pub mod resolver;
pub mod roles;
pub mod search;
pub mod source;
pub mod stats;
pub mod users;

pub use datasets::DatasetKey;
pub use error::{Error, Result};
pub use gateway::{DatasetGateway, FetchState};
pub use record::{Dataset, FieldValue, Record};
pub use roles::Role;
