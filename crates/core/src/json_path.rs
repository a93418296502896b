//! Dot-notation paths over entry JSON.
//!
//! A path such as `page_components.from_blog.featured_blogs.body` names a
//! field through nested objects. Arrays met along the way are fanned out,
//! so one path can address many values. The value at the final segment is
//! handed over as-is, even when it is itself an array.

use serde_json::Value;

/// Call `f` on every value reachable at `path`.
pub fn for_each_mut<F>(root: &mut Value, path: &str, mut f: F)
where
    F: FnMut(&mut Value),
{
    let segments: Vec<&str> = split(path).collect();
    if segments.is_empty() {
        return;
    }
    visit_mut(root, &segments, &mut f);
}

/// Collect every value reachable at `path`.
pub fn values_at<'a>(root: &'a Value, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = split(path).collect();
    let mut found = Vec::new();
    if !segments.is_empty() {
        visit(root, &segments, &mut found);
    }
    found
}

/// Join a parent path and a child key (`""` + `a` is `a`).
pub fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Drop `null` object members recursively so that typed decoding falls back
/// to field defaults instead of failing.
pub fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for child in map.values_mut() {
                prune_nulls(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                prune_nulls(item);
            }
        }
        _ => {}
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').map(str::trim).filter(|s| !s.is_empty())
}

fn visit_mut<F>(value: &mut Value, segments: &[&str], f: &mut F)
where
    F: FnMut(&mut Value),
{
    let Some((head, rest)) = segments.split_first() else {
        f(value);
        return;
    };

    match value {
        Value::Array(items) => {
            for item in items {
                visit_mut(item, segments, f);
            }
        }
        Value::Object(map) => {
            if let Some(child) = map.get_mut(*head) {
                visit_mut(child, rest, f);
            }
        }
        _ => {}
    }
}

fn visit<'a>(value: &'a Value, segments: &[&str], found: &mut Vec<&'a Value>) {
    let Some((head, rest)) = segments.split_first() else {
        found.push(value);
        return;
    };

    match value {
        Value::Array(items) => {
            for item in items {
                visit(item, segments, found);
            }
        }
        Value::Object(map) => {
            if let Some(child) = map.get(*head) {
                visit(child, rest, found);
            }
        }
        _ => {}
    }
}
