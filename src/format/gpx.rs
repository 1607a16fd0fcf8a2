use super::{Formatter, degrees_text, human_timestamp, utc_timestamp, write_text_element, xml_writer};
use crate::error::Result;
use crate::haversine_distance_km;
use crate::record::LocationRecord;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Write;
use std::iter;
use time::Duration;
use tracing::{debug, warn};

/// Longest gap between consecutive points of one track.
pub const MAX_TRACK_GAP: Duration = Duration::minutes(10);
/// Longest jump between consecutive points of one track, in kilometers.
pub const MAX_TRACK_JUMP_KM: f64 = 40.0;

const GPX_ATTRIBUTES: [(&str, &str); 5] = [
    ("xmlns", "http://www.topografix.com/GPX/1/1"),
    ("version", "1.1"),
    ("creator", "Google Latitude JSON Converter"),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    (
        "xsi:schemaLocation",
        "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd",
    ),
];

/// GPX 1.1 with one `wpt` per record.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpxWaypointsFormatter;

/// GPX 1.1 with records grouped into `trk` elements by [`split_tracks`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GpxTracksFormatter;

impl Formatter for GpxWaypointsFormatter {
    fn write_document(&self, records: &[LocationRecord], out: &mut dyn Write) -> Result<()> {
        let mut writer = xml_writer(out);
        write_header(&mut writer)?;

        for record in records {
            writer.write_event(Event::Start(point_start("wpt", record)))?;
            write_elevation(&mut writer, record)?;
            write_text_element(&mut writer, "time", &utc_timestamp(record.time)?)?;
            write_text_element(&mut writer, "desc", &waypoint_description(record)?)?;
            writer.write_event(Event::End(BytesEnd::new("wpt")))?;
        }

        write_footer(&mut writer)
    }
}

impl Formatter for GpxTracksFormatter {
    fn write_document(&self, records: &[LocationRecord], out: &mut dyn Write) -> Result<()> {
        let mut writer = xml_writer(out);
        write_header(&mut writer)?;

        let tracks = split_tracks(records);
        debug!(tracks = tracks.len(), points = records.len(), "Split track points");

        for track in tracks {
            writer.write_event(Event::Start(BytesStart::new("trk")))?;
            writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
            for record in track {
                writer.write_event(Event::Start(point_start("trkpt", record)))?;
                write_elevation(&mut writer, record)?;
                write_text_element(&mut writer, "time", &utc_timestamp(record.time)?)?;
                if let Some(description) = trackpoint_description(record) {
                    write_text_element(&mut writer, "desc", &description)?;
                }
                writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
            }
            writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
            writer.write_event(Event::End(BytesEnd::new("trk")))?;
        }

        write_footer(&mut writer)
    }
}

/// Splits newest-first records into tracks.
///
/// A new track starts whenever a record is more than [`MAX_TRACK_GAP`] older
/// than the record before it, or more than [`MAX_TRACK_JUMP_KM`] away from it.
/// The result always holds at least one (possibly empty) track.
pub fn split_tracks(records: &[LocationRecord]) -> Vec<&[LocationRecord]> {
    let (starts, _, ascending) = records.iter().enumerate().fold(
        (vec![0], None::<&LocationRecord>, false),
        |(mut starts, previous, mut ascending), (index, record)| {
            if let Some(previous) = previous {
                let gap = Duration::milliseconds(previous.timestamp_ms - record.timestamp_ms);
                ascending |= gap.is_negative();
                if starts_new_track(previous, record, gap) {
                    starts.push(index);
                }
            }
            (starts, Some(record), ascending)
        },
    );

    if ascending {
        warn!("Location history is not in newest-first order, tracks are only split by distance there");
    }

    starts
        .iter()
        .zip(starts.iter().skip(1).chain(iter::once(&records.len())))
        .map(|(&start, &end)| &records[start..end])
        .collect()
}

fn starts_new_track(previous: &LocationRecord, record: &LocationRecord, gap: Duration) -> bool {
    let distance = haversine_distance_km(
        record.latitude(),
        record.longitude(),
        previous.latitude(),
        previous.longitude(),
    );
    gap > MAX_TRACK_GAP || distance > MAX_TRACK_JUMP_KM
}

/// `Accuracy: N` and `Speed: N`, for whichever of the two is present.
fn details(record: &LocationRecord) -> Vec<String> {
    [
        record.accuracy.map(|accuracy| format!("Accuracy: {accuracy}")),
        record.speed.map(|speed| format!("Speed: {speed}")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn waypoint_description(record: &LocationRecord) -> Result<String> {
    let mut description = human_timestamp(record.time)?;
    let details = details(record);
    if !details.is_empty() {
        description.push_str(&format!(" ({})", details.join(", ")));
    }
    Ok(description)
}

fn trackpoint_description(record: &LocationRecord) -> Option<String> {
    let lines = details(record);
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn point_start<'a>(name: &'a str, record: &LocationRecord) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("lat", degrees_text(record.latitude()).as_str()));
    start.push_attribute(("lon", degrees_text(record.longitude()).as_str()));
    start
}

fn write_elevation<W: Write>(writer: &mut Writer<W>, record: &LocationRecord) -> Result<()> {
    if let Some(altitude) = record.altitude {
        write_text_element(writer, "ele", &altitude.to_string())?;
    }
    Ok(())
}

fn write_header<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("gpx").with_attributes(GPX_ATTRIBUTES),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    write_text_element(writer, "name", "Location History")?;
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;
    Ok(())
}

fn write_footer<W: Write>(writer: &mut Writer<W>) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}
