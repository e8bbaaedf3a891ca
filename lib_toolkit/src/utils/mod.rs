//! # Utilities Module
//!
//! This module serves as a collection point for general-purpose helpers that
//! don't belong to a more specific module.
//!
//! ## Contained Modules:
//!
//! - **`json`**: JSON pretty-printing for diagnostics, plus conversions between
//!   JSON object maps, JSON strings and URL-encoded form strings.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// JSON pretty-printing and map/JSON conversion helpers.
pub mod json;
