//! Hackify shared crate: models, errors, configuration and the download task queue.
pub mod config;
pub mod errors;
pub mod models;
pub mod sanitize;
pub mod task_queue;
