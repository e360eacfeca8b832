//! Integration test suite.
//!
//! - Scenario and CRUD properties over the public handle
//! - Concurrent writers on one database directory
//! - Reopening and on-disk layout

pub mod concurrency_tests;
pub mod helpers;
pub mod persistence_tests;
pub mod scenario_tests;
