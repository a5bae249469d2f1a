//! Core data model.
//!
//! A [`RawRequest`] is what a producer drops into the queue bucket. A
//! [`WidgetRecord`] is the flattened, canonical form that lands in a sink.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The request kind that triggers transform-and-persist. Everything else is skipped.
pub const CREATE_KIND: &str = "create";

// ---------------------------------------------------------------------------
// Raw request
// ---------------------------------------------------------------------------

/// A pending widget operation as read off the queue.
///
/// Only `type` is typed at read time. Every other field is kept as raw JSON
/// so a non-creation request is skipped whatever shape the rest has; the
/// creation schema is enforced by [`crate::transform::transform`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequest {
    /// Operation tag, e.g. "create" or "delete".
    #[serde(rename = "type")]
    pub kind: String,

    /// `widgetId`, `requestId`, `owner`, `otherAttributes` and anything else.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl RawRequest {
    /// Build a creation request. Mostly useful for producers and tests.
    pub fn create(widget_id: impl Into<String>, owner: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("widgetId".to_string(), Value::String(widget_id.into()));
        body.insert("owner".to_string(), Value::String(owner.into()));
        body.insert("otherAttributes".to_string(), Value::Array(Vec::new()));
        Self {
            kind: CREATE_KIND.to_string(),
            body,
        }
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.body
            .insert("requestId".to_string(), Value::String(request_id.into()));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let attr = serde_json::json!({"name": name.into(), "value": value.into()});
        match self.body.get_mut("otherAttributes") {
            Some(Value::Array(attrs)) => attrs.push(attr),
            _ => {
                self.body
                    .insert("otherAttributes".to_string(), Value::Array(vec![attr]));
            }
        }
        self
    }

    pub fn is_create(&self) -> bool {
        self.kind == CREATE_KIND
    }

    /// A raw field other than `type`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// `widgetId` for logging. Non-string values are rendered as JSON.
    pub fn widget_id(&self) -> Option<String> {
        self.field("widgetId").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// The typed shape of a creation request, checked only on the create path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateRequest {
    pub widget_id: String,
    pub owner: String,
    pub other_attributes: Vec<Attribute>,
}

/// One `{name, value}` pair from `otherAttributes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Widget record
// ---------------------------------------------------------------------------

/// Canonical widget, ready for durable storage.
///
/// Serializes as `{"id": .., "owner": .., <attributes>}` with the attributes
/// flattened to the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRecord {
    pub id: String,
    pub owner: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl WidgetRecord {
    /// Look up a top-level field, reserved or flattened.
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "id" => Some(&self.id),
            "owner" => Some(&self.owner),
            other => self.attributes.get(other).map(String::as_str),
        }
    }

    /// All top-level fields as one map, the shape a key-value table stores.
    pub fn to_item(&self) -> BTreeMap<String, String> {
        let mut item = self.attributes.clone();
        item.insert("id".to_string(), self.id.clone());
        item.insert("owner".to_string(), self.owner.clone());
        item
    }
}

/// Field names the transformer owns. Attributes may not shadow them.
pub const RESERVED_FIELDS: [&str; 2] = ["id", "owner"];
