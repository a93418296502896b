//! Live-edit markers.
//!
//! Every JSON object of an entry gets a `$` map from field name to
//! `{"data-cslp": "<content_type>.<entry_uid>.<locale>.<field path>"}`, which
//! the CMS editing overlay reads from the rendered HTML. Array elements are
//! additionally tagged as `<field>__<index>`. Expanded references restart the
//! path at their own content type and uid.

use crate::json_path::join;
use serde_json::{Map, Value};

pub const MARKER_KEY: &str = "$";
pub const CSLP_ATTR: &str = "data-cslp";

/// Annotate an entry in place. Entries without a `uid` are left untouched.
pub fn add_editable_tags(entry: &mut Value, content_type_uid: &str, locale: &str) {
    let Some(uid) = entry.get("uid").and_then(Value::as_str).map(str::to_string) else {
        return;
    };
    let prefix = format!("{}.{}.{}", content_type_uid, uid, locale);
    tag_object(entry, &prefix, "", locale);
}

fn tag_object(value: &mut Value, prefix: &str, path: &str, locale: &str) {
    let Value::Object(map) = value else {
        return;
    };

    let mut markers = Map::new();
    for (key, child) in map.iter_mut() {
        if key == MARKER_KEY || key.starts_with('_') {
            continue;
        }
        let field_path = join(path, key);
        markers.insert(key.clone(), cslp(prefix, &field_path));

        match child {
            Value::Object(_) => tag_nested(child, prefix, &field_path, locale),
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    let item_path = format!("{}.{}", field_path, index);
                    markers.insert(format!("{}__{}", key, index), cslp(prefix, &item_path));
                    if item.is_object() {
                        tag_nested(item, prefix, &item_path, locale);
                    }
                }
            }
            _ => {}
        }
    }

    map.insert(MARKER_KEY.to_string(), Value::Object(markers));
}

fn tag_nested(value: &mut Value, prefix: &str, path: &str, locale: &str) {
    let content_type = value.get("_content_type_uid").and_then(Value::as_str);
    let uid = value.get("uid").and_then(Value::as_str);

    if let (Some(content_type), Some(uid)) = (content_type, uid) {
        let own_locale = value
            .get("locale")
            .and_then(Value::as_str)
            .unwrap_or(locale)
            .to_string();
        let own_prefix = format!("{}.{}.{}", content_type, uid, own_locale);
        tag_object(value, &own_prefix, "", &own_locale);
    } else {
        tag_object(value, prefix, path, locale);
    }
}

fn cslp(prefix: &str, path: &str) -> Value {
    let mut marker = Map::new();
    marker.insert(
        CSLP_ATTR.to_string(),
        Value::String(format!("{}.{}", prefix, path)),
    );
    Value::Object(marker)
}
