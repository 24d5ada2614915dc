//! Configuration module for Profile-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Credentials may also come from the environment, which overrides the file.
//!
//! # Example
//!
//! ```no_run
//! use profile_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Delay between actions: {}ms", config.rate_limit.request_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiBackendConfig, BackendConfig, BrowserBackendConfig, Config, RateLimitConfig, Secret,
    SessionConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
