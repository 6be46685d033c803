//! Identifier source loading.
//!
//! Identifiers come from the first column of a spreadsheet or a delimited text
//! file. Values are trimmed and stringified. Blank cells and `nan`-like
//! placeholders are skipped, and duplicates are kept unless asked otherwise.
//!
//! # Examples
//!
//! ```
//! use pdf_idmark::identifiers::{load_identifiers, LoaderOptions};
//!
//! let ids = load_identifiers(b"A100\n B200 \nnan\n\nA100\n", &LoaderOptions::default()).unwrap();
//! assert_eq!(ids, vec!["A100", "B200", "A100"]);
//! ```

use crate::error::{Error, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// ZIP local file header (xlsx, xlsb, ods).
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// OLE compound document header (legacy xls).
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Delimiters tried when sniffing delimited text, in priority order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// How to interpret the identifier source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Decide from the leading bytes.
    #[default]
    Auto,
    /// Delimited text.
    Csv,
    /// Any spreadsheet format calamine reads.
    Spreadsheet,
}

impl SourceFormat {
    /// Guess the format from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> SourceFormat {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            SourceFormat::Spreadsheet
        } else {
            SourceFormat::Csv
        }
    }
}

/// Identifier loading options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Drop the first row.
    pub has_header: bool,
    /// Worksheet to read instead of the first one.
    pub sheet: Option<String>,
    /// Drop repeated identifiers, keeping the first occurrence.
    pub dedupe: bool,
    /// Source format.
    pub format: SourceFormat,
}

impl LoaderOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat the first row as a header.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Read the named worksheet.
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Drop repeated identifiers.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    /// Force a source format.
    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.format = format;
        self
    }
}

/// Load identifiers from the first column of a tabular source.
pub fn load_identifiers(bytes: &[u8], options: &LoaderOptions) -> Result<Vec<String>> {
    let format = match options.format {
        SourceFormat::Auto => SourceFormat::sniff(bytes),
        other => other,
    };

    let column = match format {
        SourceFormat::Spreadsheet => first_column_spreadsheet(bytes, options.sheet.as_deref())?,
        _ => first_column_delimited(bytes)?,
    };

    let skip = usize::from(options.has_header);
    let values = column
        .into_iter()
        .skip(skip)
        .flatten()
        .map(|v| v.trim().to_string())
        .filter(|v| !is_missing(v));

    let identifiers: Vec<String> = if options.dedupe {
        values.collect::<IndexSet<_>>().into_iter().collect()
    } else {
        values.collect()
    };

    log::info!("Loaded {} identifiers ({:?} source)", identifiers.len(), format);
    Ok(identifiers)
}

/// Read and load an identifier file.
pub fn load_identifiers_from_path(path: impl AsRef<Path>, options: &LoaderOptions) -> Result<Vec<String>> {
    let bytes = std::fs::read(path.as_ref())?;
    log::debug!("Read identifier source {} ({} bytes)", path.as_ref().display(), bytes.len());
    load_identifiers(&bytes, options)
}

/// Cell texts read as "no value" by common spreadsheet and dataframe tools.
///
/// Matching is case-sensitive: `NA` is missing, `Na` is an identifier.
pub const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Blank and NA-marker values never become identifiers.
fn is_missing(value: &str) -> bool {
    value.is_empty() || NA_VALUES.contains(&value)
}

/// First cell of every row. `None` marks a cell that holds no usable value.
fn first_column_delimited(bytes: &[u8]) -> Result<Vec<Option<String>>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let delimiter = sniff_delimiter(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut column = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        column.push(record.get(0).map(|cell| String::from_utf8_lossy(cell).into_owned()));
    }

    if column.is_empty() {
        return Err(Error::MalformedInput("identifier source has no columns".to_string()));
    }
    log::debug!("Read {} rows with delimiter {:?}", column.len(), delimiter as char);
    Ok(column)
}

/// Pick the delimiter that occurs most often on the first non-empty line.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes
        .split(|&b| b == b'\n')
        .find(|line| line.iter().any(|b| !b.is_ascii_whitespace()))
        .unwrap_or(&[]);
    DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, first_line.iter().filter(|&&b| b == d).count()))
        .filter(|&(_, count)| count > 0)
        .fold(None, |best: Option<(u8, usize)>, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn first_column_spreadsheet(bytes: &[u8], sheet: Option<&str>) -> Result<Vec<Option<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::Spreadsheet(format!("cannot open workbook: {}", e)))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| Error::Spreadsheet(format!("cannot read sheet '{}': {}", name, e)))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::MalformedInput("workbook has no worksheets".to_string()))?
            .map_err(|e| Error::Spreadsheet(format!("cannot read first sheet: {}", e)))?,
    };

    if range.is_empty() || range.width() == 0 {
        return Err(Error::MalformedInput("identifier source has no columns".to_string()));
    }

    Ok(range.rows().map(|row| row.first().and_then(cell_to_string)).collect())
}

/// Render a cell the way a spreadsheet user reads it.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => Some(other.to_string()),
    }
}

/// `123.0` reads as `123`; other floats keep their shortest form.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
