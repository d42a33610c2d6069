//! # VersoDB Testkit
//!
//! Test utilities for VersoDB.
//!
//! This crate provides:
//! - Fixture record types with hand-written descriptor tables
//! - Temporary database helpers with automatic cleanup
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use versodb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     let mut test_db = TestDatabase::loaded("1.0");
//!     let mut player = Player { name: "x".into(), ..Player::default() };
//!     test_db.create_record(&mut player).unwrap();
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
