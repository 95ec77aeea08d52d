//! Data structures for building catalog configuration.
//!
//! This module contains pure data structures that define the building
//! catalog. All structs are designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `netdefense_server::config`.

mod catalog_data;

pub use catalog_data::CatalogData;
