//! # AMD Common Library
//!
//! Shared code for the answering-machine detection services:
//! - Error type used during startup and configuration
//! - TOML configuration model and resolution
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
