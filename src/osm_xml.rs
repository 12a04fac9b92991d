//! OSM XML: the object model documents the API accepts and returns, plus the
//! `gpx_file` listing dialect used for traces.

pub mod complete;
pub mod reader;
pub mod traces;
pub mod writer;

pub use complete::complete_ways;
pub use reader::{parse_user_details, OsmXmlReader};
pub use traces::parse_traces;
pub use writer::{changeset_document, node_document, trace_update_document, way_document};
