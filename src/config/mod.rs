//! Configuration module for docsync
//!
//! This module handles parser and sync preferences, including JSON
//! (de)serialization and persistent storage in the platform config directory.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
