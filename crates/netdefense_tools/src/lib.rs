//! # NetDefense Development Tools
//!
//! Command-line helpers for working on game data:
//! - Data validators for `buildings.ron` and `rules.ron`
//! - Catalog inspection by device class

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod validate;
