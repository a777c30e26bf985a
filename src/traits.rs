//! The [`Parser`] trait implemented by every on-disk format.

use std::{
    fs::File,
    io::{BufRead, BufWriter, Cursor, Read, Write},
    path::Path,
};

use crate::error::Error;

/// A trait for parsing and writing one localization file.
///
/// # Example
///
/// ```rust,no_run
/// use locmerge::traits::Parser;
/// let format = locmerge::formats::strings::Format::read_from("en.lproj/Localizable.strings")?;
/// format.write_to("Localizable_copy.strings")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from any reader yielding UTF-8.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Parse from a string.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }

    /// Parse from raw bytes. A UTF-8 or UTF-16 byte order mark selects the
    /// decoding; bytes without one are read as UTF-8.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let decoded = decode_bytes(bytes)?;
        Self::from_str(&decoded)
    }

    /// Parse from file path, BOM-aware.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded)?;
        Self::from_str(&decoded)
    }

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize into an owned string.
    fn to_text(&self) -> Result<String, Error> {
        let mut out = Vec::new();
        self.to_writer(&mut out)?;
        String::from_utf8(out).map_err(|e| Error::malformed(e.to_string()))
    }
}

/// Decodes raw file bytes to text, honoring a UTF-8/UTF-16 byte order mark.
pub fn decode_bytes(bytes: &[u8]) -> Result<String, Error> {
    match encoding_rs::Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => {
            let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            if had_errors {
                return Err(Error::malformed(format!(
                    "invalid {} byte sequence",
                    encoding.name()
                )));
            }
            Ok(text.into_owned())
        }
        None => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::malformed(format!("input is not valid UTF-8: {}", e))),
    }
}
