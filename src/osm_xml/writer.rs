use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::data::osm::{Changeset, Meta, Node, Tags, Way};
use crate::data::trace::Trace;
use crate::errors::Result;

// The gpx_file element deliberately has no :tags placeholder. The server
// rejects tag children on trace updates
// (https://github.com/openstreetmap/openstreetmap-website/issues/1600), so
// tags are left untouched by sending none.
const GPX_FILE_TEMPLATE: &str = "<osm version='0.6' generator='OpenStreetMap server' \
copyright='OpenStreetMap and contributors' attribution='http://www.openstreetmap.org/copyright' \
license='http://opendatacommons.org/licenses/odbl/1-0/'>
    <gpx_file id=':id' name=':name' lat=':lat' lon=':lon' visibility=':visibility'>
        <description>:description</description>
    </gpx_file>
</osm>";

type OsmWriter = Writer<Vec<u8>>;

fn start_osm(writer: &mut OsmWriter) -> Result<()> {
    let mut osm = BytesStart::new("osm");
    osm.push_attribute(("version", "0.6"));
    writer.write_event(Event::Start(osm))?;
    Ok(())
}

fn finish_osm(mut writer: OsmWriter) -> Result<String> {
    writer.write_event(Event::End(BytesEnd::new("osm")))?;
    let bytes = writer.into_inner();
    Ok(String::from_utf8(bytes).map_err(|e| e.utf8_error())?)
}

fn write_tags(writer: &mut OsmWriter, tags: &Tags) -> Result<()> {
    for tag in tags.iter() {
        let mut element = BytesStart::new("tag");
        element.push_attribute(("k", tag.key.as_str()));
        element.push_attribute(("v", tag.value.as_str()));
        writer.write_event(Event::Empty(element))?;
    }
    Ok(())
}

fn push_meta_attributes(element: &mut BytesStart, meta: &Meta) {
    if let Some(changeset) = meta.changeset {
        element.push_attribute(("changeset", changeset.to_string().as_str()));
    }
    if let Some(version) = meta.version {
        element.push_attribute(("version", version.to_string().as_str()));
    }
}

/// `<osm><changeset>` document for `changeset/create`.
pub fn changeset_document(changeset: &Changeset) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    start_osm(&mut writer)?;

    let mut element = BytesStart::new("changeset");
    if let Some(id) = changeset.id {
        element.push_attribute(("id", id.to_string().as_str()));
    }
    if changeset.tags.is_empty() {
        writer.write_event(Event::Empty(element))?;
    } else {
        writer.write_event(Event::Start(element))?;
        write_tags(&mut writer, &changeset.tags)?;
        writer.write_event(Event::End(BytesEnd::new("changeset")))?;
    }

    finish_osm(writer)
}

pub fn node_document(node: &Node) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    start_osm(&mut writer)?;

    let mut element = BytesStart::new("node");
    if let Some(id) = node.id {
        element.push_attribute(("id", id.to_string().as_str()));
    }
    push_meta_attributes(&mut element, &node.meta);
    element.push_attribute(("lat", node.lat.to_string().as_str()));
    element.push_attribute(("lon", node.lon.to_string().as_str()));

    if node.meta.tags.is_empty() {
        writer.write_event(Event::Empty(element))?;
    } else {
        writer.write_event(Event::Start(element))?;
        write_tags(&mut writer, &node.meta.tags)?;
        writer.write_event(Event::End(BytesEnd::new("node")))?;
    }

    finish_osm(writer)
}

pub fn way_document(way: &Way) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    start_osm(&mut writer)?;

    let mut element = BytesStart::new("way");
    if let Some(id) = way.id {
        element.push_attribute(("id", id.to_string().as_str()));
    }
    push_meta_attributes(&mut element, &way.meta);
    writer.write_event(Event::Start(element))?;
    for node_ref in &way.nodes {
        let mut nd = BytesStart::new("nd");
        nd.push_attribute(("ref", node_ref.to_string().as_str()));
        writer.write_event(Event::Empty(nd))?;
    }
    write_tags(&mut writer, &way.meta.tags)?;
    writer.write_event(Event::End(BytesEnd::new("way")))?;

    finish_osm(writer)
}

/// Trace metadata document for `gpx/{id}`, built from a fixed template.
pub fn trace_update_document(trace: &Trace) -> String {
    let lat = trace.lat_lng.lat.to_string();
    let lon = trace.lat_lng.lng.to_string();
    fill_template(
        GPX_FILE_TEMPLATE,
        &[
            (":id", trace.id.as_str()),
            (":name", trace.name.as_str()),
            (":lat", lat.as_str()),
            (":lon", lon.as_str()),
            (":visibility", trace.visibility.as_str()),
            (":description", trace.description.as_str()),
        ],
    )
}

/// Single pass placeholder substitution; substituted values are escaped and
/// never scanned for placeholders themselves.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(position) = rest.find(':') {
        output.push_str(&rest[..position]);
        rest = &rest[position..];
        let matched = values
            .iter()
            .filter(|(placeholder, _)| rest.starts_with(placeholder))
            .max_by_key(|(placeholder, _)| placeholder.len());
        match matched {
            Some((placeholder, value)) => {
                output.push_str(&escape(value));
                rest = &rest[placeholder.len()..];
            }
            None => {
                output.push(':');
                rest = &rest[1..];
            }
        }
    }
    output.push_str(rest);
    output
}
