//! Documents and document paths.

use boxoffice_document::Fields;
use std::fmt;

/// A document returned from a query: its id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// The document body.
    pub fields: Fields,
}

impl Document {
    /// Creates a document.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Path to a single document: `collection/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    /// Creates a path from collection and document id.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Parses a `collection/id` string. Returns `None` when either
    /// component is empty or the separator is missing.
    pub fn parse(path: &str) -> Option<Self> {
        let (collection, id) = path.split_once('/')?;
        if collection.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(collection, id))
    }

    /// The collection component.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The document id component.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        let path = DocumentPath::parse("events/evt-1").unwrap();
        assert_eq!(path.collection(), "events");
        assert_eq!(path.id(), "evt-1");
        assert_eq!(path.to_string(), "events/evt-1");
    }

    #[test]
    fn parse_keeps_nested_id() {
        // Everything after the first separator belongs to the id.
        let path = DocumentPath::parse("profiles/user-1/settings").unwrap();
        assert_eq!(path.collection(), "profiles");
        assert_eq!(path.id(), "user-1/settings");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(DocumentPath::parse("no-separator").is_none());
        assert!(DocumentPath::parse("/missing-collection").is_none());
        assert!(DocumentPath::parse("missing-id/").is_none());
    }
}
