//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Cache management (clear, stats, list)
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`elevation`] - Height field statistics and GeoTIFF export
//! - [`image`] - Imagery export to PNG
//! - [`init`] - Configuration initialization
//! - [`probe`] - Content existence checks
//! - [`resolve`] - Address resolution

pub mod cache;
pub mod common;
pub mod config;
pub mod elevation;
pub mod image;
pub mod init;
pub mod probe;
pub mod resolve;
