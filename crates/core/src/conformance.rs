//! Detection of content-shape mismatches in resolved entries.
//!
//! A rich-text document left unconverted, or a reference left as a bare
//! `{uid, _content_type_uid}` stub, means the resolver's declared path lists
//! are out of date with the content model. Paths are reported without array
//! indices so they can be copied straight into a path list.

use crate::edit_tags::MARKER_KEY;
use crate::json_path::join;
use crate::rich_text::is_document;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingKind {
    UnconvertedRichText,
    UnexpandedReference,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Finding {
    pub kind: FindingKind,
    pub path: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FindingKind::UnconvertedRichText => {
                write!(f, "rich-text field '{}' was not converted to HTML", self.path)
            }
            FindingKind::UnexpandedReference => {
                write!(f, "reference field '{}' was not expanded", self.path)
            }
        }
    }
}

/// Scan a resolved entry for shape mismatches.
pub fn scan(entry: &Value) -> Vec<Finding> {
    let mut findings = Vec::new();
    walk(entry, "", &mut findings);
    findings.sort();
    findings.dedup();
    findings
}

/// Whether `value` is a reference that was never expanded.
pub fn is_bare_reference(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    map.contains_key("uid")
        && map.contains_key("_content_type_uid")
        && map
            .keys()
            .all(|k| k == "uid" || k == "_content_type_uid" || k == MARKER_KEY)
}

fn walk(value: &Value, path: &str, findings: &mut Vec<Finding>) {
    if is_document(value) {
        findings.push(Finding {
            kind: FindingKind::UnconvertedRichText,
            path: path.to_string(),
        });
        return;
    }
    if is_bare_reference(value) {
        findings.push(Finding {
            kind: FindingKind::UnexpandedReference,
            path: path.to_string(),
        });
        return;
    }

    match value {
        Value::Array(items) => {
            for item in items {
                walk(item, path, findings);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                if key == MARKER_KEY {
                    continue;
                }
                walk(child, &join(path, key), findings);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn clean_entry_has_no_findings() {
        let entry = json!({
            "uid": "blt1",
            "body": "<p>ok</p>",
            "author": [{"uid": "a1", "_content_type_uid": "author", "title": "Ada"}]
        });
        assert!(scan(&entry).is_empty());
    }

    #[test]
    fn reports_unconverted_rich_text_without_indices() {
        let entry = json!({
            "uid": "blt1",
            "page_components": [
                {"section_with_html_code": {"description": {"type": "doc", "children": []}}},
                {"section_with_html_code": {"description": {"type": "doc", "children": []}}}
            ]
        });
        assert_eq!(
            scan(&entry),
            vec![Finding {
                kind: FindingKind::UnconvertedRichText,
                path: "page_components.section_with_html_code.description".to_string(),
            }]
        );
    }

    #[test]
    fn reports_bare_references() {
        let entry = json!({
            "uid": "blt1",
            "related_post": [{"uid": "p2", "_content_type_uid": "blog_post"}]
        });
        let findings = scan(&entry);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::UnexpandedReference);
        assert_eq!(findings[0].path, "related_post");
        assert!(findings[0].to_string().contains("not expanded"));
    }

    #[test]
    fn edit_markers_are_ignored() {
        let entry = json!({
            "uid": "blt1",
            "$": {"title": {"data-cslp": "page.blt1.en-us.title"}},
            "author": [{"uid": "a1", "_content_type_uid": "author", "$": {}}]
        });
        let findings = scan(&entry);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "author");
    }
}
