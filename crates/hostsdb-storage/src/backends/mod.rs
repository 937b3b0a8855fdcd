//! Storage backend implementations
//!
//! This module contains implementations of the [`HostStore`](crate::HostStore)
//! trait for different databases. At least one backend must be enabled via
//! feature flags.

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;
