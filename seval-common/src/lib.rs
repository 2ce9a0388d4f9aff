//! # SEval Common Library
//!
//! Shared code for the SEval human-evaluation tools including:
//! - Domain types (conditions, metrics, preference choices, evaluation items)
//! - Error taxonomy and common Result alias
//! - Root folder resolution and TOML bootstrap configuration
//! - Filesystem layout conventions for stimuli and results
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod layout;
pub mod record;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use types::{Condition, Metric, PreferenceChoice};
