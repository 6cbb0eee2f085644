use super::page::Anchor;
use crate::geometry::Rect;
use std::collections::HashSet;
use url::Url;

const EXCLUDED_SCHEMES: [&str; 2] = ["javascript", "mailto"];

/// Deduplicated absolute URLs, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    links: Vec<String>,
    seen: HashSet<String>,
}

impl PartialEq for LinkSet {
    fn eq(&self, other: &Self) -> bool {
        self.links == other.links
    }
}

impl Eq for LinkSet {}

impl LinkSet {
    pub fn insert(&mut self, link: String) -> bool {
        if !self.seen.insert(link.clone()) {
            return false;
        }
        self.links.push(link);
        true
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.links
    }

    pub fn into_vec(self) -> Vec<String> {
        self.links
    }
}

/// Anchors whose bounding-box center falls inside `area`, resolved against
/// `base`. `javascript:` and `mailto:` links never qualify; with
/// `same_domain_only` the link host must equal the page host. Unresolvable
/// hrefs are skipped.
pub fn collect_links<'a, I>(anchors: I, base: &Url, area: Rect, same_domain_only: bool) -> LinkSet
where
    I: IntoIterator<Item = &'a Anchor>,
{
    let mut set = LinkSet::default();
    for anchor in anchors {
        if !area.contains(anchor.bounds.center()) {
            continue;
        }
        let Ok(url) = base.join(anchor.href.trim()) else {
            continue;
        };
        if EXCLUDED_SCHEMES.contains(&url.scheme()) {
            continue;
        }
        if same_domain_only && url.host_str() != base.host_str() {
            continue;
        }
        set.insert(url.into());
    }
    set
}
