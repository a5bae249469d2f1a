//! Request-to-record transformation.

use crate::error::{Error, Result};
use crate::model::{CreateRequest, RESERVED_FIELDS, RawRequest, WidgetRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Flatten a creation request into a [`WidgetRecord`].
///
/// Attributes become top-level fields in list order, so a repeated name keeps
/// its last value. Attributes named `id` or `owner` are dropped with a
/// warning; those fields always come from `widgetId` and `owner`.
///
/// # Errors
///
/// Returns [`Error::Transform`] when `widgetId`, `owner` or `otherAttributes`
/// is missing or not of the expected type, or when `widgetId` is empty.
pub fn transform(raw: RawRequest) -> Result<WidgetRecord> {
    let create: CreateRequest = serde_json::from_value(Value::Object(raw.body))
        .map_err(|e| Error::Transform(e.to_string()))?;
    if create.widget_id.is_empty() {
        return Err(Error::Transform("widgetId is empty".to_string()));
    }

    let id = create.widget_id;
    let mut attributes = BTreeMap::new();
    for attr in create.other_attributes {
        if RESERVED_FIELDS.contains(&attr.name.as_str()) {
            warn!(
                widget_id = %id,
                attribute = %attr.name,
                "dropping attribute that shadows a reserved field"
            );
            continue;
        }
        attributes.insert(attr.name, attr.value);
    }

    Ok(WidgetRecord {
        id,
        owner: create.owner,
        attributes,
    })
}
