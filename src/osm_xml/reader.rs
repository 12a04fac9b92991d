use std::io::BufRead;
use std::str;

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::osm::{
    ChangesetId, Meta, Node, OsmId, OsmPrimitive, Relation, RelationMember, UserDetails, Way,
};
use crate::errors::{Error, Result};

/// Streams the nodes, ways and relations of an OSM XML document in document
/// order. Tags, node references and members are attached to their parent
/// before it is yielded. Anything else in the document is skipped.
pub struct OsmXmlReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    current: Option<OsmPrimitive>,
    finished: bool,
}

impl<R: BufRead> OsmXmlReader<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        OsmXmlReader {
            reader,
            buf: Vec::new(),
            current: None,
            finished: false,
        }
    }

    fn next_primitive(&mut self) -> Result<Option<OsmPrimitive>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => {
                    if self.current.take().is_some() {
                        warn!("Document ended inside an element, dropping it");
                    }
                    return Ok(None);
                }
                Event::Start(e) => {
                    if let Some(primitive) = start_element(&e, &mut self.current, false)? {
                        return Ok(Some(primitive));
                    }
                }
                Event::Empty(e) => {
                    if let Some(primitive) = start_element(&e, &mut self.current, true)? {
                        return Ok(Some(primitive));
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"node" | b"way" | b"relation" => {
                        if let Some(primitive) = self.current.take() {
                            return Ok(Some(primitive));
                        }
                    }
                    _ => (),
                },
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmXmlReader<R> {
    type Item = Result<OsmPrimitive>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_primitive() {
            Ok(Some(primitive)) => Some(Ok(primitive)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

fn start_element(
    e: &BytesStart,
    current: &mut Option<OsmPrimitive>,
    empty: bool,
) -> Result<Option<OsmPrimitive>> {
    let primitive = match e.local_name().as_ref() {
        b"node" => OsmPrimitive::Node(parse_node(e)?),
        b"way" => OsmPrimitive::Way(parse_way(e)?),
        b"relation" => OsmPrimitive::Relation(parse_relation(e)?),
        b"tag" => {
            if let Some(parent) = current.as_mut() {
                let (key, value) = parse_tag(e)?;
                meta_mut(parent).tags.insert(key, value);
            }
            return Ok(None);
        }
        b"nd" => {
            if let Some(OsmPrimitive::Way(way)) = current.as_mut() {
                way.nodes.push(parse_node_ref(e)?);
            }
            return Ok(None);
        }
        b"member" => {
            if let Some(OsmPrimitive::Relation(relation)) = current.as_mut() {
                relation.members.push(parse_member(e)?);
            }
            return Ok(None);
        }
        _ => return Ok(None),
    };

    if empty {
        Ok(Some(primitive))
    } else {
        *current = Some(primitive);
        Ok(None)
    }
}

fn meta_mut(primitive: &mut OsmPrimitive) -> &mut Meta {
    match primitive {
        OsmPrimitive::Node(node) => &mut node.meta,
        OsmPrimitive::Way(way) => &mut way.meta,
        OsmPrimitive::Relation(relation) => &mut relation.meta,
    }
}

/// Handles the attributes every element type shares. Returns false when the
/// attribute is not one of them.
fn parse_common_attribute(key: &[u8], value: &str, id: &mut Option<OsmId>, meta: &mut Meta) -> Result<bool> {
    match key {
        b"id" => *id = Some(value.parse()?),
        b"version" => meta.version = Some(value.parse()?),
        b"changeset" => meta.changeset = Some(value.parse::<ChangesetId>()?),
        b"user" => meta.user = Some(value.to_string()),
        b"uid" => meta.uid = Some(value.parse()?),
        b"timestamp" => meta.timestamp = Some(value.to_string()),
        b"visible" => meta.visible = Some(value == "true"),
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_node(el: &BytesStart) -> Result<Node> {
    let mut node = Node::default();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let value = attribute.unescape_value()?;
        match attribute.key.local_name().as_ref() {
            b"lat" => node.lat = value.parse()?,
            b"lon" => node.lon = value.parse()?,
            key => {
                parse_common_attribute(key, &value, &mut node.id, &mut node.meta)?;
            }
        }
    }
    if node.id.is_none() {
        return Err(Error::parse("Node element without id"));
    }
    Ok(node)
}

fn parse_way(el: &BytesStart) -> Result<Way> {
    let mut way = Way::default();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let value = attribute.unescape_value()?;
        parse_common_attribute(attribute.key.local_name().as_ref(), &value, &mut way.id, &mut way.meta)?;
    }
    if way.id.is_none() {
        return Err(Error::parse("Way element without id"));
    }
    Ok(way)
}

fn parse_relation(el: &BytesStart) -> Result<Relation> {
    let mut relation = Relation::default();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let value = attribute.unescape_value()?;
        parse_common_attribute(
            attribute.key.local_name().as_ref(),
            &value,
            &mut relation.id,
            &mut relation.meta,
        )?;
    }
    if relation.id.is_none() {
        return Err(Error::parse("Relation element without id"));
    }
    Ok(relation)
}

fn parse_tag(el: &BytesStart) -> Result<(String, String)> {
    let mut key = None;
    let mut value = None;
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.local_name().as_ref() {
            b"k" => key = Some(attribute.unescape_value()?.into_owned()),
            b"v" => value = Some(attribute.unescape_value()?.into_owned()),
            _ => (),
        }
    }
    match key {
        Some(key) => Ok((key, value.unwrap_or_default())),
        None => Err(Error::parse("Tag element without key")),
    }
}

fn parse_node_ref(el: &BytesStart) -> Result<OsmId> {
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.local_name().as_ref() == b"ref" {
            return Ok(str::from_utf8(&attribute.value)?.parse()?);
        }
    }
    Err(Error::parse("nd element without ref"))
}

fn parse_member(el: &BytesStart) -> Result<RelationMember> {
    let mut member_type = None;
    let mut reference = None;
    let mut role = String::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        let value = attribute.unescape_value()?;
        match attribute.key.local_name().as_ref() {
            b"type" => member_type = Some(value.parse()?),
            b"ref" => reference = Some(value.parse()?),
            b"role" => role = value.into_owned(),
            _ => (),
        }
    }
    match (member_type, reference) {
        (Some(member_type), Some(reference)) => Ok(RelationMember {
            member_type,
            reference,
            role,
        }),
        _ => Err(Error::parse("member element without type or ref")),
    }
}

/// Reads the `<user>` element of a `user/details` response.
pub fn parse_user_details<R: BufRead>(source: R) -> Result<Option<UserDetails>> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => return Ok(None),
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"user" => {
                let mut id = None;
                let mut display_name = String::new();
                for attribute_res in e.attributes() {
                    let attribute = attribute_res?;
                    match attribute.key.local_name().as_ref() {
                        b"id" => id = Some(attribute.unescape_value()?.parse::<u64>()?),
                        b"display_name" => display_name = attribute.unescape_value()?.into_owned(),
                        _ => (),
                    }
                }
                return match id {
                    Some(id) => Ok(Some(UserDetails { id, display_name })),
                    None => Err(Error::parse("User element without id")),
                };
            }
            _ => (),
        }
        buf.clear();
    }
}
