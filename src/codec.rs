//! Reading sources into the canonical [`Catalog`] and writing catalogs back out.
//!
//! A [`Source`] is one ingested file: a name (whose extension selects the
//! format), its decoded content, and the language it declares or that can be
//! inferred from its path. Parsing is a pure function of the source and
//! [`ParseOptions`].

use std::{
    fs,
    path::{Component, Path},
    str::FromStr,
};

use unic_langid::LanguageIdentifier;

use crate::{
    error::Error,
    formats::*,
    traits::{Parser, decode_bytes},
    types::{Catalog, Fragment, ValidationIssue},
};

/// One ingested localization file. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    name: String,
    content: String,
    language: Option<String>,
}

impl Source {
    /// Creates a source from decoded text. The language is inferred from the
    /// name when it contains an `xx.lproj` or `values-xx` component.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let language = infer_language_from_path(&name);
        Source {
            name,
            content: content.into(),
            language,
        }
    }

    /// Creates a source from raw bytes, honoring a UTF-8/UTF-16 byte order mark.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, Error> {
        let name = name.into();
        let content = decode_bytes(bytes).map_err(|e| e.in_source(name.as_str()))?;
        Ok(Source::new(name, content))
    }

    /// Reads a source from disk. The path doubles as the source name.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| Error::from(e).in_source(name.as_str()))?;
        Source::from_bytes(name, &bytes)
    }

    /// Declares the language explicitly, replacing any inferred one.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn format(&self) -> Result<FormatType, Error> {
        FormatType::from_path(&self.name).map_err(|e| e.in_source(self.name.as_str()))
    }

    /// Parses this source into a catalog.
    ///
    /// Structural errors are attributed to the source name. Entries that are
    /// dropped for being incomplete are returned in [`ParsedSource::dropped`].
    pub fn parse(&self, options: &ParseOptions) -> Result<ParsedSource, Error> {
        let format = self.format()?;
        let (catalog, dropped) = self
            .parse_as(format, options)
            .map_err(|e| e.in_source(self.name.as_str()))?;
        if options.strict {
            if let Some(issue) = dropped.first() {
                return Err(Error::from(issue.clone()).in_source(self.name.as_str()));
            }
        }
        tracing::debug!(
            source = %self.name,
            %format,
            keys = catalog.len(),
            dropped = dropped.len(),
            "parsed source"
        );
        Ok(ParsedSource {
            name: self.name.clone(),
            format,
            catalog,
            dropped,
        })
    }

    fn parse_as(
        &self,
        format: FormatType,
        options: &ParseOptions,
    ) -> Result<(Catalog, Vec<ValidationIssue>), Error> {
        let content = self.content.as_str();
        let (declared, fragment, dropped) = match format {
            FormatType::Xcstrings => {
                let (mut catalog, dropped) = XcstringsFormat::from_str(content)?.into_catalog();
                if catalog.source_language.is_empty() {
                    catalog.source_language = options.fallback_language.clone();
                }
                return Ok((catalog, dropped));
            }
            FormatType::Csv => {
                let table = CsvFormat::from_str(content)?;
                return Ok((table.into_catalog(&options.fallback_language), Vec::new()));
            }
            FormatType::Strings => {
                let parsed = StringsFormat::from_str(content)?;
                (parsed.language.clone(), Fragment::from(parsed), Vec::new())
            }
            FormatType::Stringsdict => {
                let mut parsed = StringsdictFormat::from_str(content)?;
                let dropped = std::mem::take(&mut parsed.dropped);
                (None, Fragment::from(parsed), dropped)
            }
            FormatType::AndroidStrings => {
                let mut parsed = AndroidStringsFormat::from_str(content)?;
                let dropped = std::mem::take(&mut parsed.dropped);
                (None, Fragment::from(parsed), dropped)
            }
            FormatType::Json => {
                let mut parsed = JsonFormat::from_str(content)?;
                let dropped = std::mem::take(&mut parsed.dropped);
                (None, Fragment::from(parsed), dropped)
            }
            FormatType::Properties => (
                None,
                Fragment::from(PropertiesFormat::from_str(content)?),
                Vec::new(),
            ),
        };

        let language = self
            .language
            .clone()
            .or(declared)
            .or_else(|| options.language_hint.clone())
            .unwrap_or_else(|| options.fallback_language.clone());

        let mut catalog = Catalog::from_fragment(&language, fragment);
        catalog.source_language = options.fallback_language.clone();
        Ok((catalog, dropped))
    }
}

/// Parsing behavior for [`Source::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Language for single-language sources that neither declare one nor have
    /// one in their path.
    pub language_hint: Option<String>,
    /// Used when nothing else names a language, and as the `sourceLanguage` of
    /// catalogs read from formats that do not declare one.
    pub fallback_language: String,
    /// Fails the source instead of dropping incomplete entries.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            language_hint: None,
            fallback_language: "en".to_string(),
            strict: false,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a language hint.
    pub fn with_language_hint(mut self, language_hint: Option<String>) -> Self {
        self.language_hint = language_hint;
        self
    }

    /// Enables/disables strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the fallback (development) language.
    pub fn with_fallback_language(mut self, language: impl Into<String>) -> Self {
        self.fallback_language = language.into();
        self
    }
}

/// The result of parsing one [`Source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub name: String,
    pub format: FormatType,
    pub catalog: Catalog,
    pub dropped: Vec<ValidationIssue>,
}

impl Catalog {
    /// Serializes the catalog to `format`. Single-language formats write the
    /// `language` slice; multi-language formats ignore it.
    pub fn export(&self, format: FormatType, language: &str) -> Result<String, Error> {
        self.export_with_style(format, language, JsonStyle::default())
    }

    /// Like [`Catalog::export`], choosing the JSON layout.
    pub fn export_with_style(
        &self,
        format: FormatType,
        language: &str,
        style: JsonStyle,
    ) -> Result<String, Error> {
        if !format.is_multi_language() && !self.is_empty() && !self.has_language(language) {
            return Err(Error::InvalidResource(format!(
                "catalog has no `{}` localizations (available: {})",
                language,
                self.languages().into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let slice = self.language_slice(language);
        match format {
            FormatType::Strings => {
                StringsFormat::from_fragment(Some(language.to_string()), &slice).to_text()
            }
            FormatType::Stringsdict => StringsdictFormat::from_fragment(&slice).to_text(),
            FormatType::AndroidStrings => AndroidStringsFormat::from_fragment(&slice).to_text(),
            FormatType::Json => JsonFormat::from_fragment(&slice, style).to_text(),
            FormatType::Properties => PropertiesFormat::from_fragment(&slice).to_text(),
            FormatType::Xcstrings => XcstringsFormat::from(self).to_text(),
            FormatType::Csv => CsvFormat::from(self).to_text(),
        }
    }

    /// Writes the catalog to `path`, selecting the format from its extension.
    ///
    /// Without an explicit `language`, single-language formats use the
    /// language in the path, then the catalog's source language.
    pub fn write_file<P: AsRef<Path>>(
        &self,
        path: P,
        language: Option<&str>,
        style: JsonStyle,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        let format = FormatType::from_path(path)?;
        let language = language
            .map(str::to_string)
            .or_else(|| infer_language_from_path(&path.display().to_string()))
            .unwrap_or_else(|| self.source_language.clone());
        let text = self.export_with_style(format, &language, style)?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// Reads `input` and writes it to `output`, both formats chosen by extension.
///
/// Returns the intermediate parsed source.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    language: Option<&str>,
    options: &ParseOptions,
    style: JsonStyle,
) -> Result<ParsedSource, Error> {
    let mut source = Source::read_from(input)?;
    if let Some(language) = language {
        source = source.with_language(language);
    }
    let parsed = source.parse(options)?;

    // A single-language input keeps its language unless the output path names one.
    let slice_language = match parsed.catalog.languages().into_iter().next() {
        Some(only) if !parsed.format.is_multi_language() => Some(only),
        _ => None,
    };
    let output_language = language
        .map(str::to_string)
        .or_else(|| infer_language_from_path(&output.as_ref().display().to_string()))
        .or(slice_language);
    parsed
        .catalog
        .write_file(output, output_language.as_deref(), style)?;
    Ok(parsed)
}

/// Infers a language code from `xx.lproj` (Apple) or `values-xx` (Android)
/// path components.
///
/// Android qualifiers `values-zh-rCN` and `values-b+zh+Hans` become `zh-CN` and
/// `zh-Hans`. `Base.lproj` and non-language qualifiers such as `values-night`
/// yield `None`.
pub fn infer_language_from_path(path: &str) -> Option<String> {
    Path::new(path).components().rev().find_map(|component| {
        let Component::Normal(component) = component else {
            return None;
        };
        let component = component.to_str()?;
        if let Some(lang) = component.strip_suffix(".lproj") {
            normalize_language(lang)
        } else if let Some(rest) = component.strip_prefix("values-") {
            android_qualifier_language(rest)
        } else {
            None
        }
    })
}

fn android_qualifier_language(qualifier: &str) -> Option<String> {
    if let Some(tags) = qualifier.strip_prefix("b+") {
        return normalize_language(&tags.replace('+', "-"));
    }
    let mut parts = qualifier.split('-');
    let language = parts.next()?;
    match parts.next() {
        Some(region) if region.len() == 3 && region.starts_with('r') => {
            normalize_language(&format!("{}-{}", language, &region[1..]))
        }
        _ => normalize_language(language),
    }
}

/// Accepts `xx`, `xxx`, `xx_YY`, `xx-Script-YY`, ... with a two or three letter
/// language subtag.
fn normalize_language(candidate: &str) -> Option<String> {
    let canonical = candidate.replace('_', "-");
    let primary = canonical.split('-').next()?;
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    LanguageIdentifier::from_str(&canonical).ok()?;
    Some(canonical)
}
