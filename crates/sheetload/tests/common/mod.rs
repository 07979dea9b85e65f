//! Shared test utilities for sheetload integration tests.
//!
//! - `WorkbookBuilder` writes real `.xlsx` packages
//! - `TestHarness` runs polling cycles against a temporary directory and an
//!   in-memory SQLite warehouse

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
