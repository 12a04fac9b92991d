use std::collections::HashMap;

use self::osm::{Node, OsmId, OsmPrimitive, Relation, Way};

pub mod osm;
pub mod trace;

/// Elements of one OSM document, indexed by id. Elements without an id are
/// dropped since nothing can reference them.
#[derive(Debug, Default, Clone)]
pub struct OsmMapData {
    pub nodes: HashMap<OsmId, Node>,
    pub ways: HashMap<OsmId, Way>,
    pub relations: HashMap<OsmId, Relation>,
    /// Way ids in the order they appeared in the document.
    pub way_order: Vec<OsmId>,
}

impl OsmMapData {
    pub fn insert(&mut self, primitive: OsmPrimitive) {
        match primitive {
            OsmPrimitive::Node(node) => {
                if let Some(id) = node.id {
                    self.nodes.insert(id, node);
                }
            }
            OsmPrimitive::Way(way) => {
                if let Some(id) = way.id {
                    if self.ways.insert(id, way).is_none() {
                        self.way_order.push(id);
                    }
                }
            }
            OsmPrimitive::Relation(relation) => {
                if let Some(id) = relation.id {
                    self.relations.insert(id, relation);
                }
            }
        }
    }
}
