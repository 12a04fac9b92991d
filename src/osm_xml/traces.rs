use std::io::BufRead;

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::trace::{LatLng, Trace};
use crate::errors::{Error, Result};

/// Attributes and children of one `<gpx_file>` element while it is read.
#[derive(Default)]
struct GpxFile {
    /// Lower-cased local names with their values.
    attributes: Vec<(String, String)>,
    description: Option<String>,
    tags: Vec<String>,
}

impl GpxFile {
    fn from_element(el: &BytesStart) -> Result<Self> {
        let mut attributes = Vec::new();
        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).to_ascii_lowercase();
            attributes.push((name, attribute.unescape_value()?.into_owned()));
        }
        Ok(GpxFile {
            attributes,
            ..Default::default()
        })
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn required(&self, name: &str) -> Result<String> {
        self.attribute(name).map(str::to_string).ok_or_else(|| {
            Error::parse(format!(
                "gpx_file {} has no {} attribute",
                self.attribute("id").unwrap_or("?"),
                name
            ))
        })
    }

    fn coordinate(&self, name: &str) -> Result<f64> {
        match self.attribute(name) {
            Some(value) => Ok(value.trim().parse()?),
            None => Ok(0.0),
        }
    }

    fn into_trace(self) -> Result<Trace> {
        let id = self.required("id")?;
        let description = match &self.description {
            Some(description) => description.clone(),
            None => return Err(Error::parse(format!("gpx_file {} has no description", id))),
        };
        Ok(Trace {
            lat_lng: LatLng {
                lat: self.coordinate("lat")?,
                lng: self.coordinate("lon")?,
            },
            description,
            visibility: self.required("visibility")?,
            name: self.required("name")?,
            user_name: self.required("user")?,
            date: parse_timestamp(&self.required("timestamp")?)?,
            tags: self.tags,
            id,
        })
    }
}

#[derive(PartialEq)]
enum Capture {
    Description,
    Tag,
}

fn local_name_lowercase(el: &BytesStart) -> String {
    String::from_utf8_lossy(el.local_name().as_ref()).to_ascii_lowercase()
}

/// Parses a `user/gpx_files` listing. Element and attribute names are matched
/// on their local name, ignoring case. Description and tag text is kept
/// exactly as sent, since a listed trace may be written back.
pub fn parse_traces<R: BufRead>(source: R) -> Result<Vec<Trace>> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut traces = Vec::new();
    let mut current: Option<GpxFile> = None;
    // Element depth below the current gpx_file.
    let mut depth = 0usize;
    let mut capture: Option<Capture> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = local_name_lowercase(&e);
                match current.as_mut() {
                    None if name == "gpx_file" => {
                        current = Some(GpxFile::from_element(&e)?);
                        depth = 0;
                    }
                    None => (),
                    Some(_) => {
                        depth += 1;
                        if depth == 1 {
                            text.clear();
                            capture = match name.as_str() {
                                "description" => Some(Capture::Description),
                                "tag" => Some(Capture::Tag),
                                _ => None,
                            };
                        }
                    }
                }
            }
            Event::Empty(e) => {
                let name = local_name_lowercase(&e);
                match current.as_mut() {
                    None if name == "gpx_file" => traces.push(GpxFile::from_element(&e)?.into_trace()?),
                    Some(file) if depth == 0 && name == "description" && file.description.is_none() => {
                        file.description = Some(String::new());
                    }
                    Some(file) if depth == 0 && name == "tag" => file.tags.push(String::new()),
                    _ => (),
                }
            }
            Event::Text(e) => {
                if capture.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if capture.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(mut file) = current.take() {
                    if depth == 0 {
                        traces.push(file.into_trace()?);
                    } else {
                        if depth == 1 {
                            match capture.take() {
                                Some(Capture::Description) if file.description.is_none() => {
                                    file.description = Some(std::mem::take(&mut text));
                                }
                                Some(Capture::Tag) => file.tags.push(std::mem::take(&mut text)),
                                _ => (),
                            }
                        }
                        depth -= 1;
                        current = Some(file);
                    }
                }
            }
            _ => (),
        }
        buf.clear();
    }

    Ok(traces)
}

/// OSM timestamps are RFC 3339; a missing offset is read as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")?;
    Ok(naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn parses_minimal_gpx_file() {
        let xml = r#"<osm><gpx_file id="1" lat="31.5" lon="34.8" visibility="private" name="t1" user="u1" timestamp="2020-01-01T00:00:00"><description>d</description></gpx_file></osm>"#;

        let traces = parse_traces(xml.as_bytes()).unwrap();
        assert_eq!(traces.len(), 1);
        let trace = &traces[0];
        assert_eq!(trace.lat_lng, LatLng { lat: 31.5, lng: 34.8 });
        assert_eq!(trace.visibility, "private");
        assert_eq!(trace.name, "t1");
        assert_eq!(trace.description, "d");
        assert_eq!(trace.user_name, "u1");
        assert_eq!(trace.date, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert!(trace.tags.is_empty());
    }

    #[test]
    fn names_are_matched_case_insensitively_and_without_namespace() {
        let xml = r#"<osm xmlns:o="http://openstreetmap.org/osm/0.6">
  <o:GPX_FILE ID="7" Name="Carmel ridge" User="hiker" Visibility="public" Pending="false" TIMESTAMP="2016-11-02T08:10:33Z">
    <o:Description>Along the ridge</o:Description>
    <TAG>carmel</TAG>
    <tag>ridge</tag>
  </o:GPX_FILE>
  <gpx_file id="8" name="second" user="hiker" visibility="trackable" lat="32.1" lon="34.9" timestamp="2016-11-03T08:10:33Z">
    <description/>
  </gpx_file>
</osm>"#;

        let traces = parse_traces(xml.as_bytes()).unwrap();
        assert_eq!(traces.len(), 2);

        assert_eq!(traces[0].id, "7");
        assert_eq!(traces[0].lat_lng, LatLng { lat: 0.0, lng: 0.0 });
        assert_eq!(traces[0].description, "Along the ridge");
        assert_eq!(traces[0].tags, vec!["carmel".to_string(), "ridge".to_string()]);
        assert_eq!(traces[0].date, Utc.with_ymd_and_hms(2016, 11, 2, 8, 10, 33).unwrap());

        assert_eq!(traces[1].description, "");
        assert_eq!(traces[1].visibility, "trackable");
        assert_eq!(traces[1].lat_lng, LatLng { lat: 32.1, lng: 34.9 });
    }

    #[test]
    fn description_whitespace_and_empty_tags_are_kept() {
        let xml = r#"<osm>
  <gpx_file id="4" visibility="private" name="t" user="u" timestamp="2020-01-01T00:00:00Z">
    <description>  two  spaces  </description>
    <tag/>
    <tag> padded </tag>
  </gpx_file>
</osm>"#;

        let traces = parse_traces(xml.as_bytes()).unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].description, "  two  spaces  ");
        assert_eq!(traces[0].tags, vec![String::new(), " padded ".to_string()]);
    }

    #[test]
    fn missing_required_attribute_is_a_parse_error() {
        let xml = r#"<osm><gpx_file id="3" visibility="private" user="u" timestamp="2020-01-01T00:00:00Z"><description>d</description></gpx_file></osm>"#;

        let err = parse_traces(xml.as_bytes()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.message.contains("gpx_file 3 has no name attribute"));
    }

    #[test]
    fn empty_listing() {
        assert!(parse_traces(r#"<osm version="0.6"></osm>"#.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn timestamps_with_and_without_offset() {
        assert_eq!(
            parse_timestamp("2020-05-01T12:30:00+03:00").unwrap(),
            Utc.with_ymd_and_hms(2020, 5, 1, 9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2020-05-01T12:30:00.5").unwrap().timestamp(),
            Utc.with_ymd_and_hms(2020, 5, 1, 12, 30, 0).unwrap().timestamp()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
