//! Profile bridge - Identity and Catalog services over a queue pair
//!
//! The Identity service answers "profile plus the products this user created"
//! without calling the Catalog service directly: it publishes an owner id on a
//! durable request queue and polls a shared response queue once. The Catalog
//! service runs a long-lived responder that drains the request queue.

pub mod bus;
pub mod catalog;
pub mod config;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod models;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod utils;
