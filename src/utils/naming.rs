//! Naming helpers for generated artifact paths and identifiers.

use std::collections::{HashMap, HashSet};

/// Turn a display name into a lowercase, filesystem and DNS friendly slug.
///
/// Runs of characters outside `[a-z0-9]` collapse into a single `-`, and
/// leading/trailing dashes are dropped. An empty result falls back to `fallback`.
///
/// # Examples
/// ```
/// use range42::utils::naming::slugify;
///
/// assert_eq!(slugify("Web Server #1", "host"), "web-server-1");
/// assert_eq!(slugify("***", "host"), "host");
/// ```
pub fn slugify(name: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Unique slugs for a set of nodes, keyed by node id.
///
/// Nodes are named in the order they are added; a slug already taken gets a
/// numeric suffix (`web`, `web-2`, `web-3`).
#[derive(Debug, Default, Clone)]
pub struct UniqueNames {
    by_id: HashMap<String, String>,
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a slug to `id` derived from `name`. Re-adding an id keeps its slug.
    pub fn add(&mut self, id: &str, name: &str) -> &str {
        if !self.by_id.contains_key(id) {
            let base = slugify(name, &slugify(id, "node"));
            let mut candidate = base.clone();
            let mut suffix = 2;
            while self.taken.contains(&candidate) {
                candidate = format!("{}-{}", base, suffix);
                suffix += 1;
            }
            self.taken.insert(candidate.clone());
            self.by_id.insert(id.to_string(), candidate);
        }
        &self.by_id[id]
    }

    /// Mark `slug` as taken without assigning it to any node
    pub fn reserve(&mut self, slug: &str) {
        self.taken.insert(slug.to_string());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// Slug for `id`, or a slug of the id itself when it was never added
    pub fn get_or_slug(&self, id: &str) -> String {
        self.get(id)
            .map(str::to_string)
            .unwrap_or_else(|| slugify(id, "node"))
    }
}
