pub mod android_strings;
pub mod csv;
mod dom;
pub mod json;
pub mod properties;
pub mod strings;
pub mod stringsdict;
pub mod xcstrings;

use std::{fmt::Display, path::Path, str::FromStr};

use crate::error::Error;

// Reexporting the formats for easier access
pub use android_strings::Format as AndroidStringsFormat;
pub use self::csv::Format as CsvFormat;
pub use json::{Format as JsonFormat, JsonStyle};
pub use properties::Format as PropertiesFormat;
pub use strings::Format as StringsFormat;
pub use stringsdict::Format as StringsdictFormat;
pub use xcstrings::Format as XcstringsFormat;

/// Every on-disk format the crate can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    Strings,
    Stringsdict,
    Xcstrings,
    AndroidStrings,
    Json,
    Properties,
    Csv,
}

impl FormatType {
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Strings => "strings",
            FormatType::Stringsdict => "stringsdict",
            FormatType::Xcstrings => "xcstrings",
            FormatType::AndroidStrings => "xml",
            FormatType::Json => "json",
            FormatType::Properties => "properties",
            FormatType::Csv => "csv",
        }
    }

    /// Whether one file holds every language of the catalog.
    pub fn is_multi_language(&self) -> bool {
        matches!(self, FormatType::Xcstrings | FormatType::Csv)
    }

    /// Selects the format from a file name's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        extension.parse()
    }
}

impl FromStr for FormatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strings" => Ok(FormatType::Strings),
            "stringsdict" => Ok(FormatType::Stringsdict),
            "xcstrings" => Ok(FormatType::Xcstrings),
            "xml" | "android" => Ok(FormatType::AndroidStrings),
            "json" => Ok(FormatType::Json),
            "properties" => Ok(FormatType::Properties),
            "csv" => Ok(FormatType::Csv),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormatType::Strings => "Strings",
            FormatType::Stringsdict => "Stringsdict",
            FormatType::Xcstrings => "Xcstrings",
            FormatType::AndroidStrings => "AndroidStrings",
            FormatType::Json => "Json",
            FormatType::Properties => "Properties",
            FormatType::Csv => "Csv",
        };
        f.write_str(name)
    }
}
