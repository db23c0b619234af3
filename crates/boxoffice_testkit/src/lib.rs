//! # boxoffice Testkit
//!
//! Test utilities for boxoffice.
//!
//! This crate provides:
//! - Document fixtures and pre-seeded stores
//! - Property-based test generators using proptest
//! - A shared tracing initializer for test output
//!
//! ## Usage
//!
//! ```rust,ignore
//! use boxoffice_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_store() {
//!     let store = seeded_store(25);
//!     // ... exercise pagination against 25 events
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
