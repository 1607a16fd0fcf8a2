//! Read, filter, format, write.

use crate::error::{ConvertError, Result};
use crate::format::{OutputFormat, split_tracks};
use crate::record::LocationDocument;
use crate::window::{TimeWindow, Zone};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_VARIABLE: &str = "locationJsonData";

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub input: PathBuf,
    /// Defaults to the input path with the format name as extension.
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    /// Global variable assigned by the `js` format.
    pub variable: String,
    /// `yyyy/mm/dd`; both dates are needed to restrict the range.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub zone: Zone,
}

impl ConvertOptions {
    pub fn new(input: impl Into<PathBuf>, format: OutputFormat) -> Self {
        ConvertOptions {
            input: input.into(),
            output: None,
            format,
            variable: DEFAULT_VARIABLE.to_string(),
            start_date: None,
            end_date: None,
            zone: Zone::Local,
        }
    }

    /// Output path after applying the default and rejecting the input file.
    pub fn output_path(&self) -> Result<PathBuf> {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input, self.format));

        if same_file(&self.input, &output) {
            return Err(ConvertError::SameInputOutput(output));
        }
        Ok(output)
    }

    fn validate(&self) -> Result<()> {
        if self.format == OutputFormat::Js && !is_js_identifier(&self.variable) {
            return Err(ConvertError::Config(format!(
                "{:?} is not a valid JavaScript variable name",
                self.variable
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub output: PathBuf,
    pub records_read: usize,
    pub records_written: usize,
    /// Number of `trk` elements, for the `gpxtracks` format only.
    pub tracks: Option<usize>,
}

pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    input.with_extension(format.name())
}

fn same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Runs one conversion.
///
/// Every failure that can be detected up front (bad options, unreadable or
/// invalid input, bad dates, missing data) is reported before the output file
/// is created. A write failure while formatting may leave a truncated file.
pub fn convert(options: &ConvertOptions) -> Result<ConvertSummary> {
    options.validate()?;
    let output = options.output_path()?;

    let input = fs::read_to_string(&options.input).map_err(|source| ConvertError::Input {
        path: options.input.clone(),
        source,
    })?;
    debug!(path = %options.input.display(), bytes = input.len(), "Read input");

    let document = LocationDocument::from_json(&input)?;
    let window = TimeWindow::from_dates(
        options.start_date.as_deref(),
        options.end_date.as_deref(),
        options.zone,
    )?;
    let history = document.into_history()?;
    debug!(
        records = history.len(),
        start_ms = window.start_ms,
        end_ms = window.end_ms,
        "Parsed location history"
    );

    let records: Vec<_> = window.filter(&history.records).cloned().collect();
    let tracks = (options.format == OutputFormat::Gpxtracks).then(|| split_tracks(&records).len());

    let file = File::create(&output).map_err(|source| ConvertError::Output {
        path: output.clone(),
        source,
    })?;
    let mut sink = BufWriter::new(file);
    options
        .format
        .formatter(&options.variable, options.zone)
        .write_document(&records, &mut sink)?;
    sink.flush()?;

    Ok(ConvertSummary {
        output,
        records_read: history.len(),
        records_written: records.len(),
        tracks,
    })
}
