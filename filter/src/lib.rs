//! Data view filter compilation
//!
//! Parses URL query filters and JSON filter expressions, validates them
//! against a space's property definitions and emits backend filter trees.

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod filters;
pub mod utils;
