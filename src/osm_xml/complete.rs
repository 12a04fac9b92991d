use log::warn;

use crate::data::osm::{CompleteWay, OsmPrimitive};
use crate::data::OsmMapData;
use crate::errors::Result;

/// Assembles complete ways from a flat primitive stream.
///
/// A way may reference nodes that appear before or after it, so the whole
/// stream is buffered before any reference is resolved. Ways come out in the
/// order they appeared; a way with a reference to a node missing from the
/// stream is skipped.
pub fn complete_ways<I>(primitives: I) -> Result<Vec<CompleteWay>>
where
    I: IntoIterator<Item = Result<OsmPrimitive>>,
{
    let mut data = OsmMapData::default();
    for primitive in primitives {
        data.insert(primitive?);
    }

    let mut complete = Vec::with_capacity(data.way_order.len());
    for way_id in &data.way_order {
        let Some(way) = data.ways.get(way_id) else { continue };
        let nodes: Option<Vec<_>> = way
            .nodes
            .iter()
            .map(|node_id| data.nodes.get(node_id).cloned())
            .collect();
        match nodes {
            Some(nodes) => complete.push(CompleteWay {
                id: *way_id,
                nodes,
                meta: way.meta.clone(),
            }),
            None => warn!(way_id = *way_id; "Way references a node missing from the document, skipping it"),
        }
    }
    Ok(complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm_xml::reader::OsmXmlReader;

    #[test]
    fn resolves_nodes_that_follow_the_way() {
        let xml = r#"<osm>
            <way id="10"><nd ref="1"/><nd ref="2"/><tag k="highway" v="path"/></way>
            <node id="2" lat="31.2" lon="34.2"/>
            <node id="1" lat="31.1" lon="34.1"/>
        </osm>"#;

        let ways = complete_ways(OsmXmlReader::new(xml.as_bytes())).unwrap();
        assert_eq!(ways.len(), 1);
        let way = &ways[0];
        assert_eq!(way.id, 10);
        assert_eq!(way.meta.tags.get("highway"), Some("path"));
        let ids: Vec<_> = way.nodes.iter().map(|node| node.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
        assert_eq!(way.nodes[1].lat, 31.2);
    }

    #[test]
    fn closed_way_repeats_its_first_node() {
        let xml = r#"<osm>
            <node id="1" lat="1" lon="1"/><node id="2" lat="2" lon="2"/><node id="3" lat="3" lon="1"/>
            <way id="5"><nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="1"/></way>
        </osm>"#;

        let ways = complete_ways(OsmXmlReader::new(xml.as_bytes())).unwrap();
        assert_eq!(ways[0].nodes.len(), 4);
        assert_eq!(ways[0].nodes[0], ways[0].nodes[3]);
    }

    #[test]
    fn way_with_missing_node_is_skipped() {
        let xml = r#"<osm>
            <way id="10"><nd ref="1"/><nd ref="2"/></way>
            <node id="1" lat="31.1" lon="34.1"/>
        </osm>"#;

        assert!(complete_ways(OsmXmlReader::new(xml.as_bytes())).unwrap().is_empty());
    }

    #[test]
    fn stream_errors_are_returned() {
        let xml = r#"<osm><way id="10"><nd ref="oops"/></way></osm>"#;
        assert!(complete_ways(OsmXmlReader::new(xml.as_bytes())).is_err());
    }
}
