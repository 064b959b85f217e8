//! Common test utilities for REST API testing.
//!
//! - [`harness`] - an in-process server over the in-memory backend
//! - [`fixtures`] - entity bodies

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;
