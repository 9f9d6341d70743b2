//! Layered configuration for corsair.
//!
//! Produces the flat string-keyed configuration the policy engine consumes,
//! plus logging settings, from:
//! - TOML and JSON files or strings
//! - Embedded key/value pairs
//! - Environment variable overrides (optionally seeded from `.env`)
//!
//! # Example
//!
//! ```no_run
//! use corsair_config::ConfigLoader;
//!
//! # fn main() -> Result<(), corsair_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_file("cors.toml")?
//!     .with_env_prefix("CORSAIR")
//!     .load()?;
//!
//! let policies = config.policy_set();
//! println!("active policies: {:?}", policies.active_policies());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [cors]
//! policy = "api,public"
//! matchstrategy = "firstmatch"
//! api_origin = "https://*.example.com"
//! api_methods = "GET, POST"
//! api_credentials = true
//! public_origin = "*"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `CORSAIR__CORS__API_ORIGIN=copy` sets key `api_origin`
//! - `CORSAIR__LOGGING__LEVEL=debug`
//! - `CORSAIR__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{CorsairConfig, LoggingSettings};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ConfigDocument, CorsValue, LogFormat, LoggingSection};
