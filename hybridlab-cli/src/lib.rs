//! Command-line front end for hybridlab.
//!
//! Provides the settings file and the generate / rotate / encrypt /
//! decrypt workflows used by the `hybridlab` binary.

pub mod commands;
pub mod config;

pub use config::Settings;
