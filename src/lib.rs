#![forbid(unsafe_code)]
//! Localization catalog normalization and merging for Rust.
//!
//! Reads Apple `.strings`, `.stringsdict`, `.xcstrings`, Android `strings.xml`,
//! flat/nested JSON, `.properties` and CSV files into one canonical
//! multi-language [`Catalog`], writes catalogs back to any of them, and merges
//! several independently edited copies of a catalog without losing
//! translator work.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use locmerge::{MergeOptions, Source, merge};
//!
//! let sources = vec![
//!     Source::read_from("main/Localizable.xcstrings")?,
//!     Source::read_from("branch/Localizable.xcstrings")?,
//! ];
//! let result = merge(&sources, &MergeOptions::new());
//! for missing in &result.report.missing_keys {
//!     eprintln!("{}: {}", missing.key, missing.reason);
//! }
//! std::fs::write(
//!     "Localizable.xcstrings",
//!     result.catalog.export(locmerge::FormatType::Xcstrings, "en")?,
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Supported Formats
//!
//! - **Apple `.strings`**: simple key-value pairs
//! - **Apple `.stringsdict`**: plural rules
//! - **Apple `.xcstrings`**: String Catalogs, every language in one file
//! - **Android `strings.xml`**: strings, plurals and string arrays
//! - **JSON**: flat or nested key-value objects
//! - **`.properties`**: Java resource bundles
//! - **CSV**: one row per key, one column per language

pub mod analysis;
pub mod codec;
pub mod error;
pub mod formats;
pub mod merge;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    codec::{ParseOptions, ParsedSource, Source, convert, infer_language_from_path},
    error::Error,
    formats::{FormatType, JsonStyle},
    merge::{
        ConflictReport, MergeConflict, MergeOptions, MergeReport, MergeResult, detect_conflicts,
        merge,
    },
    types::{
        Catalog, Entry, EntryState, Fragment, Localization, Plural, PluralCategory, StringValue,
        ValidationIssue,
    },
};
