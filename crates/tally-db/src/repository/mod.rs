//! # Repository Module
//!
//! One repository per table in the schema.
//!
//! - [`TableRepository`] - Venue tables, session transitions, settlement
//! - [`SaleRepository`] - Sales charged to tables

pub mod sale;
pub mod table;

pub use sale::SaleRepository;
pub use table::TableRepository;
