//! Output fragments keyed by node identity.
//!
//! The tree itself is immutable; each rewrite rule deposits its node's
//! final Lua text here, and parent rules read their children's entries.

use lunify_parser::NodeIndex;

pub struct FragmentMap {
    fragments: Vec<Option<String>>,
}

impl FragmentMap {
    pub fn new(node_count: usize) -> FragmentMap {
        FragmentMap {
            fragments: vec![None; node_count],
        }
    }

    pub fn set(&mut self, index: NodeIndex, text: String) {
        self.fragments[index.index()] = Some(text);
    }

    pub fn get(&self, index: NodeIndex) -> Option<&str> {
        self.fragments[index.index()].as_deref()
    }
}
