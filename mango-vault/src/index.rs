//! In-process index of known site keys.
//!
//! A character trie mirroring the keys present in the backend. It only ever
//! answers "definitely absent" authoritatively: a key that is not marked is
//! skipped without a backend round trip, a key that is marked is still
//! probed. Deletes unmark the terminal node and leave the path in place.

use std::collections::HashMap;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, Node>,
    terminal: bool,
}

#[derive(Debug, Default)]
pub struct SiteIndex {
    root: Node,
    len: usize,
}

impl SiteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index holding every key in `sites`.
    pub fn from_sites<I, S>(sites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new();
        for site in sites {
            index.insert(site.as_ref());
        }
        index
    }

    /// Marks `site` as present. Returns `false` if it already was.
    pub fn insert(&mut self, site: &str) -> bool {
        let mut node = &mut self.root;
        for c in site.chars() {
            node = node.children.entry(c).or_default();
        }
        if node.terminal {
            return false;
        }
        node.terminal = true;
        self.len += 1;
        true
    }

    pub fn contains(&self, site: &str) -> bool {
        self.find(site).is_some_and(|node| node.terminal)
    }

    /// Marks `site` as absent. Returns `false` if it was not present.
    pub fn unmark(&mut self, site: &str) -> bool {
        let mut node = &mut self.root;
        for c in site.chars() {
            match node.children.get_mut(&c) {
                Some(child) => node = child,
                None => return false,
            }
        }
        if !node.terminal {
            return false;
        }
        node.terminal = false;
        self.len -= 1;
        true
    }

    /// Number of marked sites.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find(&self, site: &str) -> Option<&Node> {
        let mut node = &self.root;
        for c in site.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }
}
