//! Configuration management for pgjbuilder
//!
//! The engine itself is configured through its API. This module adds an
//! optional `pgjb.toml` file so hosts (the `pgjb` CLI in particular) can set
//! search paths, the template extension, caching and the include depth limit
//! without code.
//!
//! # Modules
//!
//! - `engine` - [`EngineConfig`], its TOML format and lookup order

mod engine;

pub use engine::EngineConfig;
