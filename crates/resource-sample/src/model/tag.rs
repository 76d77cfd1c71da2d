use super::TagId;
use resource_framework::Resource;
use serde::Deserialize;
use serde_json::{json, Value};

/// A label attached to posts and comments alike.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreate {
    pub name: String,
}

impl Resource for Tag {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(json!(self.name)),
            _ => None,
        }
    }
}
