//! # Kitodo Common Library
//!
//! Shared code for the Kitodo metadata tools including:
//! - Error type shared by configuration and file handling
//! - Configuration loading and resolution
//! - Logging initialisation
//! - Date helpers used by date-typed metadata

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
