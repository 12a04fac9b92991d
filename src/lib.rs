//! Gateway to the OpenStreetMap API 0.6.
//!
//! [`OsmApiClient`] signs requests with OAuth 1.0 (HMAC-SHA1), reads the
//! user's identity, manages changesets, creates and updates nodes and ways,
//! reads complete ways and manages the user's GPS traces.

pub mod config;
pub mod data;
pub mod endpoints;
pub mod errors;
pub mod gateway;
pub mod multipart;
pub mod oauth;
pub mod osm_xml;
pub mod transport;

pub use config::{Credentials, OsmConfiguration, TokenAndSecret};
pub use errors::{Error, ErrorKind, Result};
pub use gateway::OsmApiClient;
