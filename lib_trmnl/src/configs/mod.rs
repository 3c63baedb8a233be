//! # Configuration Modules
//!
//! The application configuration file (`config.json`) and the view catalogue
//! it carries.

/// Typed application configuration with defaults, loading and validation.
pub mod config_app;
