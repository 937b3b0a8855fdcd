//! hostsdb library crate
//!
//! Exposes the server entry point so integration tests can build the router
//! against their own store.

pub mod server;

#[cfg(test)]
pub mod test_utils;
