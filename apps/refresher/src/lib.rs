//! # tally-refresher
//!
//! The background job that keeps stored table totals current.
//!
//! - [`config`] - `RefresherConfig` (file + environment)
//! - [`job`] - a single refresh pass
//! - [`error`] - `RefresherError`

pub mod config;
pub mod error;
pub mod job;

pub use config::RefresherConfig;
pub use error::{RefresherError, RefresherResult};
pub use job::{run_once, RefreshReport};
