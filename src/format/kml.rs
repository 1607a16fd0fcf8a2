use super::{Formatter, degrees_text, utc_timestamp, write_text_element, xml_writer};
use crate::error::Result;
use crate::record::LocationRecord;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Write;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// One `Placemark` per record inside a single KML `Document`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KmlFormatter;

impl Formatter for KmlFormatter {
    fn write_document(&self, records: &[LocationRecord], out: &mut dyn Write) -> Result<()> {
        let mut writer = xml_writer(out);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("Document")))?;
        write_text_element(&mut writer, "name", "Location History")?;

        for record in records {
            write_placemark(&mut writer, record)?;
        }

        writer.write_event(Event::End(BytesEnd::new("Document")))?;
        writer.write_event(Event::End(BytesEnd::new("kml")))?;
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

// KML validity requires TimeStamp, ExtendedData, Point in this order.
fn write_placemark<W: Write>(writer: &mut Writer<W>, record: &LocationRecord) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Placemark")))?;

    writer.write_event(Event::Start(BytesStart::new("TimeStamp")))?;
    write_text_element(writer, "when", &utc_timestamp(record.time)?)?;
    writer.write_event(Event::End(BytesEnd::new("TimeStamp")))?;

    if record.has_extended_data() {
        writer.write_event(Event::Start(BytesStart::new("ExtendedData")))?;
        let fields = [
            ("accuracy", record.accuracy),
            ("speed", record.speed),
            ("altitude", record.altitude),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                writer.write_event(Event::Start(
                    BytesStart::new("Data").with_attributes([("name", name)]),
                ))?;
                write_text_element(writer, "value", &value.to_string())?;
                writer.write_event(Event::End(BytesEnd::new("Data")))?;
            }
        }
        writer.write_event(Event::End(BytesEnd::new("ExtendedData")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("Point")))?;
    let coordinates = format!(
        "{},{}",
        degrees_text(record.longitude()),
        degrees_text(record.latitude())
    );
    write_text_element(writer, "coordinates", &coordinates)?;
    writer.write_event(Event::End(BytesEnd::new("Point")))?;

    writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    Ok(())
}
