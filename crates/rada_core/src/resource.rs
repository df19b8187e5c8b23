//! Resource definitions
//!
//! A resource definition tells the admin how to present records of one
//! resource. Inputs backed by a reference lookup use the record
//! representation as their default option text.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::record::{get_path, value_key};

/// Function turning a record into a display string
pub type RecordToString = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// How records of a resource are represented as text
#[derive(Clone, Default)]
pub enum RecordRepresentation {
    /// `#<id>`
    #[default]
    Id,
    /// Value at a (possibly dotted) path
    Field(String),
    /// Custom function
    Func(RecordToString),
}

impl std::fmt::Debug for RecordRepresentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id => write!(f, "Id"),
            Self::Field(path) => f.debug_tuple("Field").field(path).finish(),
            Self::Func(_) => write!(f, "Func(..)"),
        }
    }
}

impl RecordRepresentation {
    /// Render a record
    pub fn represent(&self, record: &Value) -> String {
        match self {
            Self::Id => format!("#{}", get_path(record, "id").map(value_key).unwrap_or_default()),
            Self::Field(path) => get_path(record, path).map(value_key).unwrap_or_default(),
            Self::Func(f) => f(record),
        }
    }

    /// Shareable rendering function
    pub fn into_fn(self) -> RecordToString {
        match self {
            Self::Func(f) => f,
            other => Arc::new(move |record: &Value| other.represent(record)),
        }
    }
}

/// Definition of one resource
#[derive(Clone, Debug)]
pub struct ResourceDefinition {
    pub name: String,
    pub record_representation: RecordRepresentation,
    pub has_create: bool,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_representation: RecordRepresentation::Id,
            has_create: false,
        }
    }

    pub fn record_representation(mut self, representation: RecordRepresentation) -> Self {
        self.record_representation = representation;
        self
    }

    pub fn has_create(mut self, has_create: bool) -> Self {
        self.has_create = has_create;
        self
    }
}

/// Registered resources, in declaration order
#[derive(Clone, Debug, Default)]
pub struct ResourceRegistry {
    definitions: IndexMap<String, ResourceDefinition>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ResourceDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    pub fn get(&self, resource: &str) -> Option<&ResourceDefinition> {
        self.definitions.get(resource)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Representation function for a resource, `#<id>` when unregistered
    pub fn get_record_representation(&self, resource: &str) -> RecordToString {
        self.get(resource)
            .map(|d| d.record_representation.clone())
            .unwrap_or_default()
            .into_fn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_representation_variants() {
        let mut registry = ResourceRegistry::new();
        registry.register(
            ResourceDefinition::new("authors")
                .record_representation(RecordRepresentation::Field("profile.name".into())),
        );
        registry.register(ResourceDefinition::new("tags").record_representation(
            RecordRepresentation::Func(Arc::new(|r: &Value| format!("<{}>", r["name"].as_str().unwrap_or("")))),
        ));

        let author = json!({ "id": 7, "profile": { "name": "Ann" } });
        assert_eq!(registry.get_record_representation("authors")(&author), "Ann");
        assert_eq!(registry.get_record_representation("tags")(&json!({ "name": "x" })), "<x>");
        assert_eq!(registry.get_record_representation("posts")(&author), "#7");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["authors", "tags"]);
    }
}
