//! Output formatters, one per `--format` value.

mod csv;
mod gpx;
mod json;
mod kml;

pub use self::csv::CsvFormatter;
pub use self::gpx::{GpxTracksFormatter, GpxWaypointsFormatter, split_tracks};
pub use self::json::JsonFormatter;
pub use self::kml::KmlFormatter;

use crate::error::Result;
use crate::record::LocationRecord;
use crate::window::Zone;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::fmt;
use std::io::Write;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// `2013-07-04T10:15:00Z`, used for KML `when` and GPX `time`.
const UTC_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// `2013-07-04 10:15:00`, used for CSV rows and GPX descriptions.
const HUMAN_TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Kml,
    Json,
    Csv,
    Js,
    Gpx,
    Gpxtracks,
}

impl OutputFormat {
    /// Format identifier, also used as the default output file extension.
    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Kml => "kml",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Js => "js",
            OutputFormat::Gpx => "gpx",
            OutputFormat::Gpxtracks => "gpxtracks",
        }
    }

    /// Selects the formatter for this format.
    ///
    /// `variable` only matters for [`OutputFormat::Js`], `zone` only for
    /// [`OutputFormat::Csv`].
    pub fn formatter(&self, variable: &str, zone: Zone) -> Box<dyn Formatter> {
        match self {
            OutputFormat::Kml => Box::new(KmlFormatter),
            OutputFormat::Json => Box::new(JsonFormatter::plain()),
            OutputFormat::Js => Box::new(JsonFormatter::assigned_to(variable)),
            OutputFormat::Csv => Box::new(CsvFormatter::new(zone)),
            OutputFormat::Gpx => Box::new(GpxWaypointsFormatter),
            OutputFormat::Gpxtracks => Box::new(GpxTracksFormatter),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Writes a complete document for already-filtered records.
pub trait Formatter {
    fn write_document(&self, records: &[LocationRecord], out: &mut dyn Write) -> Result<()>;
}

pub(crate) fn utc_timestamp(time: OffsetDateTime) -> Result<String> {
    Ok(time.format(UTC_TIMESTAMP).map_err(std::io::Error::other)?)
}

pub(crate) fn human_timestamp(time: OffsetDateTime) -> Result<String> {
    Ok(time.format(HUMAN_TIMESTAMP).map_err(std::io::Error::other)?)
}

/// Decimal degrees as text. Whole values keep their `.0`, as in the JSON output.
pub(crate) fn degrees_text(degrees: f64) -> String {
    if degrees.fract() == 0.0 {
        format!("{degrees:.1}")
    } else {
        degrees.to_string()
    }
}

/// XML writer indenting nested elements by two spaces.
pub(crate) fn xml_writer(out: &mut dyn Write) -> Writer<&mut dyn Write> {
    Writer::new_with_indent(out, b' ', 2)
}

/// Writes `<name>text</name>` on one line.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
