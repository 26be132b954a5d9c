// Configuration module
//
// This module contains all configuration-related functionality split into focused submodules:
// - error: Startup configuration errors
// - listen: Listen endpoint grammar
// - types: Core configuration structures and types
// - loader: Validation of raw settings into a Config

pub mod error;
pub mod listen;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use listen::{Endpoint, parse_listen};
pub use types::{Config, Settings, Verbosity};
