//! Content-model validation.
//!
//! Resolves every content type the site renders and checks the result
//! against what the renderer expects: rich text converted to HTML,
//! references expanded, routable entries carrying unique URLs.

use stacksite_core::conformance::{self, FindingKind};
use stacksite_core::Entry;
use stacksite_delivery::resolver::{ALL_SPECS, ContentTypeSpec};
use stacksite_delivery::{Resolver, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn check_entry(&mut self, label: &str, spec: &ContentTypeSpec, entry: &Entry) {
        for finding in conformance::scan(&entry.to_value()) {
            let message = format!("{} entry '{}' ({}): {}", spec.uid, entry.uid, label, finding);
            match finding.kind {
                FindingKind::UnconvertedRichText => self.errors.push(message),
                FindingKind::UnexpandedReference => self.warnings.push(message),
            }
        }
    }

    fn check_urls(&mut self, spec: &ContentTypeSpec, entries: &[Entry]) {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for entry in entries {
            match entry.url().filter(|url| !url.is_empty()) {
                None => self.warnings.push(format!(
                    "{} entry '{}' has no url and cannot be routed",
                    spec.uid, entry.uid
                )),
                Some(url) => {
                    if let Some(first) = seen.insert(url, &entry.uid) {
                        self.warnings.push(format!(
                            "{} entries '{}' and '{}' share url '{}'; only the first is reachable",
                            spec.uid, first, entry.uid, url
                        ));
                    }
                }
            }
        }
    }
}

/// Resolve every content type with each resolver's paths and report
/// mismatches.
///
/// URL-addressed resolvers are checked against every entry of their
/// content type, so one run covers every page and post.
pub async fn validate_stack(resolver: &Resolver) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    for (label, spec) in ALL_SPECS.iter() {
        let entries = resolver.resolve_all(spec).await?;
        tracing::debug!(resolver = label, count = entries.len(), "Validating entries");

        if entries.is_empty() {
            report
                .warnings
                .push(format!("{}: no {} entries published", label, spec.uid));
            continue;
        }

        for entry in &entries {
            report.check_entry(label, spec, entry);
        }
        if matches!(*label, "page" | "blog_post") {
            report.check_urls(spec, &entries);
        }
        report
            .info
            .push(format!("{}: {} entries checked", label, entries.len()));
    }

    Ok(report)
}
