//! Location history input: the `locations` array of a JSON export.

use crate::error::{ConvertError, Result};
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

/// Scale of the `latitudeE7` / `longitudeE7` integers.
pub const E7: f64 = 10_000_000.0;

/// Converts an E7-scaled coordinate to decimal degrees.
pub fn degrees(e7: i64) -> f64 {
    e7 as f64 / E7
}

/// One sample of the location history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct LocationRecord {
    pub timestamp_ms: i64,
    pub time: OffsetDateTime,
    pub latitude_e7: i64,
    pub longitude_e7: i64,
    pub accuracy: Option<i64>,
    pub speed: Option<i64>,
    pub altitude: Option<i64>,
}

#[cfg(test)]
impl LocationRecord {
    pub fn new(
        timestamp_ms: i64,
        latitude_e7: i64,
        longitude_e7: i64,
    ) -> std::result::Result<Self, String> {
        Self::try_from(RawRecord {
            timestamp_ms: Number::Int(timestamp_ms),
            latitude_e7: Number::Int(latitude_e7),
            longitude_e7: Number::Int(longitude_e7),
            accuracy: None,
            speed: None,
            altitude: None,
        })
    }

    pub fn with_accuracy(mut self, accuracy: i64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_speed(mut self, speed: i64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_altitude(mut self, altitude: i64) -> Self {
        self.altitude = Some(altitude);
        self
    }
}

impl LocationRecord {
    pub fn latitude(&self) -> f64 {
        degrees(self.latitude_e7)
    }

    pub fn longitude(&self) -> f64 {
        degrees(self.longitude_e7)
    }

    pub fn has_extended_data(&self) -> bool {
        self.accuracy.is_some() || self.speed.is_some() || self.altitude.is_some()
    }
}

/// Integer field as found in exports: a JSON integer, a float, or a decimal string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Number {
    fn to_i64(&self, field: &str) -> std::result::Result<i64, String> {
        match self {
            Number::Int(n) => Ok(*n),
            Number::Float(f) if f.is_finite() => Ok(f.trunc() as i64),
            Number::Float(f) => Err(format!("{field} is not a finite number: {f}")),
            Number::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| format!("{field} is not an integer ({s:?}): {e}")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    timestamp_ms: Number,
    #[serde(rename = "latitudeE7")]
    latitude_e7: Number,
    #[serde(rename = "longitudeE7")]
    longitude_e7: Number,
    accuracy: Option<Number>,
    speed: Option<Number>,
    altitude: Option<Number>,
}

impl TryFrom<RawRecord> for LocationRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, Self::Error> {
        let timestamp_ms = raw.timestamp_ms.to_i64("timestampMs")?;
        let time = OffsetDateTime::from_unix_timestamp_nanos(i128::from(timestamp_ms) * 1_000_000)
            .map_err(|e| format!("timestampMs {timestamp_ms} out of range: {e}"))?;
        let optional = |value: Option<Number>, field: &str| value.map(|v| v.to_i64(field)).transpose();

        Ok(LocationRecord {
            timestamp_ms,
            time,
            latitude_e7: raw.latitude_e7.to_i64("latitudeE7")?,
            longitude_e7: raw.longitude_e7.to_i64("longitudeE7")?,
            accuracy: optional(raw.accuracy, "accuracy")?,
            speed: optional(raw.speed, "speed")?,
            altitude: optional(raw.altitude, "altitude")?,
        })
    }
}

fn shape_error(message: &str) -> ConvertError {
    ConvertError::Parse(serde::de::Error::custom(message))
}

/// A parsed export whose `locations` entries are not decoded yet.
#[derive(Debug, Clone, Default)]
pub struct LocationDocument {
    locations: Option<Value>,
}

impl LocationDocument {
    /// Parses the export text; anything but a JSON object is a [`ConvertError::Parse`].
    pub fn from_json(input: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(input).map_err(ConvertError::Parse)? {
            Value::Object(mut map) => Ok(LocationDocument {
                locations: map.remove("locations"),
            }),
            _ => Err(shape_error("expected a JSON object with a `locations` array")),
        }
    }

    /// Decodes the `locations` entries.
    ///
    /// A missing, null or empty `locations` array is [`ConvertError::NoData`],
    /// and an entry missing one of `timestampMs`, `latitudeE7`, `longitudeE7`
    /// is a [`ConvertError::Record`].
    pub fn into_history(self) -> Result<LocationHistory> {
        let locations = match self.locations {
            Some(Value::Array(locations)) if !locations.is_empty() => locations,
            None | Some(Value::Null) | Some(Value::Array(_)) => return Err(ConvertError::NoData),
            Some(_) => return Err(shape_error("`locations` is not an array")),
        };

        let records = locations
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value(value).map_err(|source| ConvertError::Record { index, source })
            })
            .collect::<Result<Vec<LocationRecord>>>()?;

        Ok(LocationHistory { records })
    }
}

/// Ordered records of an export, in input order.
#[derive(Debug, Clone, Default)]
pub struct LocationHistory {
    pub records: Vec<LocationRecord>,
}

impl LocationHistory {
    /// Parses an export document and decodes all of its records.
    pub fn from_json(input: &str) -> Result<Self> {
        LocationDocument::from_json(input)?.into_history()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
