//! Core business logic for contentplan.

pub mod services;

pub use services::*;
