//! Navigation builder.
//!
//! Merges the header's configured menu with the site's pages: every page
//! whose title is not already a menu label gets a synthesized link appended
//! after the configured items.
//!
//! ```
//! use stacksite_core::{Header, NavMenuItem, Page};
//! use stacksite_generator::navigation::build;
//!
//! let header = Header {
//!     navigation_menu: vec![NavMenuItem { label: "Home".into(), ..Default::default() }],
//!     ..Default::default()
//! };
//! let pages = vec![
//!     Page { title: "Home".into(), url: "/".into(), ..Default::default() },
//!     Page { title: "About".into(), url: "/about".into(), ..Default::default() },
//! ];
//!
//! let merged = build(&header, &pages);
//! assert_eq!(merged.navigation_menu.len(), 2);
//! assert_eq!(merged.navigation_menu[1].href(), "/about");
//! ```

use stacksite_core::{Header, NavMenuItem, Page, PageRef};
use std::collections::HashSet;

/// Header with the merged menu. Titles are the de-duplication key, so two
/// pages sharing a title collapse to the first one.
#[must_use]
pub fn build(header: &Header, all_pages: &[Page]) -> Header {
    let mut labels: HashSet<String> = header
        .navigation_menu
        .iter()
        .map(|item| item.label.clone())
        .collect();

    let mut merged = header.clone();
    for page in all_pages {
        if page.title.is_empty() || !labels.insert(page.title.clone()) {
            continue;
        }
        merged.navigation_menu.push(NavMenuItem {
            label: page.title.clone(),
            page_reference: vec![PageRef {
                uid: page.uid.clone(),
                title: page.title.clone(),
                url: page.url.clone(),
                ..Default::default()
            }],
            ..Default::default()
        });
    }
    merged
}
