// Note: CSV tables only carry simple values; plurals are skipped when writing.
use std::io::{BufRead, Write};

use crate::{
    error::Error,
    traits::Parser,
    types::{Catalog, Localization, StringValue},
};

/// A multi-language table: a `key` column followed by one column per language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Format {
    pub languages: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: String,
    /// One cell per language column; empty means no localization.
    pub cells: Vec<String>,
}

impl Parser for Format {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Ok(Format::default());
        }
        let languages: Vec<String> = headers
            .iter()
            .skip(1)
            .map(|language| language.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let Some(key) = record.get(0) else {
                continue;
            };
            let cells = (1..=languages.len())
                .map(|index| record.get(index).unwrap_or_default().to_string())
                .collect();
            rows.push(Row {
                key: key.to_string(),
                cells,
            });
        }
        Ok(Format { languages, rows })
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);
        let mut header = vec!["key"];
        header.extend(self.languages.iter().map(String::as_str));
        wtr.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![row.key.as_str()];
            record.extend(row.cells.iter().map(String::as_str));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Format {
    /// Builds the catalog. Every row keeps its key, even when all of its cells
    /// are empty.
    pub fn into_catalog(self, source_language: &str) -> Catalog {
        let mut catalog = Catalog::new(source_language);
        for row in self.rows {
            let entry = catalog.entries.entry(row.key).or_default();
            for (language, cell) in self.languages.iter().zip(row.cells) {
                if !cell.is_empty() {
                    entry
                        .localizations
                        .insert(
                            language.clone(),
                            Localization::inferred(StringValue::Simple(cell)),
                        );
                }
            }
        }
        catalog
    }
}

impl From<&Catalog> for Format {
    fn from(catalog: &Catalog) -> Self {
        let languages: Vec<String> = catalog.languages().into_iter().collect();
        let rows = catalog
            .entries
            .iter()
            .map(|(key, entry)| Row {
                key: key.clone(),
                cells: languages
                    .iter()
                    .map(|language| match entry.get(language).map(|l| &l.value) {
                        Some(StringValue::Simple(text)) => text.clone(),
                        _ => String::new(),
                    })
                    .collect(),
            })
            .collect();
        Format { languages, rows }
    }
}
