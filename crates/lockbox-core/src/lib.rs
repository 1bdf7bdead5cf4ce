//! Lockbox Core - configuration and repository discovery
//!
//! This crate provides the configuration system, the error types shared by
//! the other Lockbox crates, and the [`RootLocator`] that finds a project's
//! trust store.

pub mod config;
pub mod error;
pub mod locator;

pub use config::Config;
pub use error::{ConfigError, CoreError, LocateError, Result};
pub use locator::{RootLocator, TrustStore};
