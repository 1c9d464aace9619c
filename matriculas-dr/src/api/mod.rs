//! HTTP API handlers for matriculas-dr

pub mod auth;
pub mod buildinfo;
pub mod datasets;
pub mod error;
pub mod health;
pub mod matricula;
pub mod stats;
pub mod users;

pub use auth::{identity_middleware, CurrentUser};
pub use buildinfo::get_build_info;
pub use datasets::{
    clear_all_caches, clear_dataset_cache, get_dataset, list_datasets, refresh_all, refresh_dataset,
};
pub use error::ApiError;
pub use health::health_routes;
pub use matricula::get_matricula;
pub use stats::{cica_stats, mutation_details, reconocedores_stats};
pub use users::{login, register};
