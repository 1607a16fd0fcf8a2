use super::{Formatter, degrees_text, human_timestamp};
use crate::error::Result;
use crate::record::LocationRecord;
use crate::window::Zone;
use std::io::Write;

/// `Time,Location` rows; times are rendered in the configured zone, not UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormatter {
    zone: Zone,
}

impl CsvFormatter {
    pub fn new(zone: Zone) -> Self {
        CsvFormatter { zone }
    }
}

impl Formatter for CsvFormatter {
    fn write_document(&self, records: &[LocationRecord], out: &mut dyn Write) -> Result<()> {
        let mut writer = ::csv::Writer::from_writer(out);
        writer.write_record(["Time", "Location"])?;

        for record in records {
            let time = human_timestamp(self.zone.to_zone(record.time))?;
            let location = format!(
                "{} {}",
                degrees_text(record.latitude()),
                degrees_text(record.longitude())
            );
            writer.write_record([time.as_str(), location.as_str()])?;
        }

        writer.flush()?;
        Ok(())
    }
}
