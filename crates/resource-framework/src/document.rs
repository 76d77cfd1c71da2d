//! # Document Wire Types
//!
//! The serialized shape produced by the serializer:
//!
//! ```text
//! { data: ResourceObject | ResourceObject[] | null, included?: ResourceObject[] }
//! ResourceObject = { id, type, attributes, relationships?, meta? }
//! ```
//!
//! `included` is either absent or non-empty, never an empty array.

use crate::value::ValueMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// `(type, id)` pair identifying one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_name: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}

/// Resource linkage of one relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Linkage {
    One(Option<ResourceIdentifier>),
    Many(Vec<ResourceIdentifier>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub data: Linkage,
}

/// The `relationships` member. Serializes in insertion order, which is the
/// order the include paths named them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relationships(Vec<(String, Relationship)>);

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member, or replaces one of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, relationship: Relationship) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = relationship,
            None => self.0.push((name, relationship)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Relationship> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, relationship)| relationship)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Relationship)> for Relationships {
    fn from_iter<I: IntoIterator<Item = (String, Relationship)>>(iter: I) -> Self {
        let mut relationships = Self::new();
        for (name, relationship) in iter {
            relationships.insert(name, relationship);
        }
        relationships
    }
}

impl Serialize for Relationships {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, relationship) in &self.0 {
            map.serialize_entry(name, relationship)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub attributes: ValueMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Relationships>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ValueMap>,
}

impl ResourceObject {
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(&self.type_name, &self.id)
    }
}

/// The `data` member: absent root, one root, or a list of roots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Null,
    One(Box<ResourceObject>),
    Many(Vec<ResourceObject>),
}

impl PrimaryData {
    pub fn is_empty(&self) -> bool {
        match self {
            PrimaryData::Null => true,
            PrimaryData::One(_) => false,
            PrimaryData::Many(objects) => objects.is_empty(),
        }
    }

    pub fn objects(&self) -> Vec<&ResourceObject> {
        match self {
            PrimaryData::Null => Vec::new(),
            PrimaryData::One(object) => vec![object.as_ref()],
            PrimaryData::Many(objects) => objects.iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub data: PrimaryData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,
}

impl Document {
    /// The included resources, empty when the member is absent.
    pub fn included(&self) -> &[ResourceObject] {
        self.included.as_deref().unwrap_or(&[])
    }

    pub fn included_identifiers(&self) -> Vec<ResourceIdentifier> {
        self.included().iter().map(ResourceObject::identifier).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
