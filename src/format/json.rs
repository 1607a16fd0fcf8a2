use super::Formatter;
use crate::error::Result;
use crate::record::LocationRecord;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Document {
    data: Data,
}

#[derive(Serialize)]
struct Data {
    items: Vec<Item>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    timestamp_ms: i64,
    latitude: f64,
    longitude: f64,
}

impl From<&LocationRecord> for Item {
    fn from(record: &LocationRecord) -> Self {
        Item {
            timestamp_ms: record.timestamp_ms,
            latitude: record.latitude(),
            longitude: record.longitude(),
        }
    }
}

/// `{"data": {"items": [...]}}`, optionally assigned to a `window` global for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFormatter {
    variable: Option<String>,
}

impl JsonFormatter {
    pub fn plain() -> Self {
        JsonFormatter { variable: None }
    }

    pub fn assigned_to(variable: &str) -> Self {
        JsonFormatter {
            variable: Some(variable.to_string()),
        }
    }
}

impl Formatter for JsonFormatter {
    fn write_document(&self, records: &[LocationRecord], out: &mut dyn Write) -> Result<()> {
        let document = Document {
            data: Data {
                items: records.iter().map(Item::from).collect(),
            },
        };

        if let Some(variable) = &self.variable {
            write!(out, "window.{variable} = ")?;
        }
        serde_json::to_writer_pretty(&mut *out, &document).map_err(std::io::Error::from)?;
        if self.variable.is_some() {
            out.write_all(b";")?;
        }
        Ok(())
    }
}
