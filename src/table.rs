//! Reading prefix tables and writing result tables

use crate::prefix::RawPrefix;
use crate::report::OutputRecord;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Name of the required input column
pub const PREFIX_COLUMN: &str = "Prefix";

/// Output path used when none is given
pub const DEFAULT_OUTPUT_PATH: &str = "asn_results.csv";

/// Error type for table input and output
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Reading or writing the file failed
    #[error("cannot access {path}")]
    Io {
        /// File involved
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The CSV data could not be parsed or written
    #[error("CSV error")]
    Csv(#[from] csv::Error),

    /// JSON output could not be written
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// The input has no prefix column
    #[error("'Prefix' column not found")]
    MissingColumn,
}

/// Output table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Comma separated values with a header row
    #[default]
    Csv,
    /// A JSON array of row objects
    Json,
}

impl OutputFormat {
    /// Pick a format from the file extension; anything but `.json` is CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Csv,
        }
    }
}

/// Read the prefix column from CSV data with a header row.
///
/// Rows too short to have a prefix cell yield `None`. Cells that are not
/// valid UTF-8 are decoded lossily so they fail as single rows later.
pub fn read_prefixes_from<R: Read>(reader: R) -> Result<Vec<Option<RawPrefix>>, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let column = csv_reader
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == PREFIX_COLUMN)
        .ok_or(TableError::MissingColumn)?;

    let mut prefixes = Vec::new();
    for row in csv_reader.byte_records() {
        let row = row?;
        prefixes.push(
            row.get(column)
                .map(|cell| RawPrefix::from_cell(&String::from_utf8_lossy(cell))),
        );
    }
    Ok(prefixes)
}

/// Read the prefix column from a CSV file
pub fn read_prefixes(path: &Path) -> Result<Vec<Option<RawPrefix>>, TableError> {
    let file = File::open(path).map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_prefixes_from(file)
}

/// Write rows to any writer in the given format
pub fn write_records_to<W: Write>(
    writer: W,
    records: &[OutputRecord],
    format: OutputFormat,
) -> Result<(), TableError> {
    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            if records.is_empty() {
                csv_writer.write_record(["Prefix", "ASN", "Provider"])?;
            }
            for record in records {
                csv_writer.serialize(record)?;
            }
            csv_writer.flush().map_err(csv::Error::from)?;
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer).map_err(serde_json::Error::io)?;
        }
    }
    Ok(())
}

/// Write rows to a file, choosing the format from its extension.
///
/// Rows go to a temporary file next to `path` that only replaces it once
/// fully written, so a failed run never leaves a partial table behind.
pub fn write_records(path: &Path, records: &[OutputRecord]) -> Result<(), TableError> {
    let format = OutputFormat::from_path(path);
    write_atomically(path, |writer| write_records_to(writer, records, format))
}

fn write_atomically<F>(path: &Path, write: F) -> Result<(), TableError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), TableError>,
{
    let io_err = |source| TableError::Io {
        path: path.display().to_string(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        write(&mut writer)?;
        writer.flush().map_err(io_err)?;
    }
    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
