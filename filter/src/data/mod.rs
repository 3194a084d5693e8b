//! Property data layer
//!
//! - `property` - property definitions and per-request snapshots
//! - `traits` - the `PropertyService` the filter pipeline reads through
//! - `memory` - fixture-backed `PropertyService` used by the CLI and tests

pub mod memory;
pub mod property;
pub mod traits;

pub use memory::{InMemoryPropertyService, PropertyFixture};
pub use property::{Property, PropertyFormat, PropertySnapshot, ValueFamily};
pub use traits::{PropertyError, PropertyService};
