//! Shared configuration and error handling for the BugLens upload client
//!
//! This crate provides the functionality shared across the upload client:
//! - Configuration management following 12-factor principles
//! - Configuration error types

pub mod config;
pub mod error;

pub use config::Config;
pub use error::ConfigError;
