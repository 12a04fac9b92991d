use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::errors::{Error, Result};

/// Element id as used by the OSM API. Elements that do not exist on the
/// server yet may carry negative placeholder ids.
pub type OsmId = i64;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangesetId(pub u64);

impl FromStr for ChangesetId {
    type Err = Error;

    /// The API answers `changeset/create` with the bare id as text, possibly
    /// followed by a newline.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .map(ChangesetId)
            .map_err(|_| Error::parse(format!("Invalid changeset id: {:?}", trimmed)))
    }
}

impl fmt::Display for ChangesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Tags in insertion order. Keys are unique; inserting an existing key
/// replaces its value in place.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new() -> Self {
        Tags(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|tag| tag.key == key) {
            Some(tag) => tag.value = value,
            None => self.0.push(Tag { key, value }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

/// Attributes shared by nodes, ways and relations. Only `tags`, `version` and
/// `changeset` are ever sent to the server; the rest is read-only.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub tags: Tags,
    pub version: Option<u32>,
    pub changeset: Option<ChangesetId>,
    pub user: Option<String>,
    pub uid: Option<u64>,
    pub timestamp: Option<String>,
    pub visible: Option<bool>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub id: Option<OsmId>,
    pub lat: f64,
    pub lon: f64,
    pub meta: Meta,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Way {
    pub id: Option<OsmId>,
    /// Node references, in path order.
    pub nodes: Vec<OsmId>,
    pub meta: Meta,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

impl FromStr for MemberType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "node" => Ok(MemberType::Node),
            "way" => Ok(MemberType::Way),
            "relation" => Ok(MemberType::Relation),
            other => Err(Error::parse(format!("Unknown relation member type {:?}", other))),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RelationMember {
    pub member_type: MemberType,
    pub reference: OsmId,
    pub role: String,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Relation {
    pub id: Option<OsmId>,
    pub members: Vec<RelationMember>,
    pub meta: Meta,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub id: Option<ChangesetId>,
    pub tags: Tags,
}

/// A flat element as it appears in an OSM XML document.
#[derive(Debug, Clone, PartialEq)]
pub enum OsmPrimitive {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

/// A way with every node reference replaced by the node itself.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CompleteWay {
    pub id: OsmId,
    pub nodes: Vec<Node>,
    pub meta: Meta,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub id: u64,
    pub display_name: String,
}
