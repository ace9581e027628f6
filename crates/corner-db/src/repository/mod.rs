//! # Repository Implementations
//!
//! One repository per aggregate. Each wraps the shared `SqlitePool` and
//! exposes typed async operations; no SQL leaks out of this module.

pub mod appointment;
pub mod customer;
pub mod product;
pub mod returns;
pub mod settings;
pub mod transaction;
