// Query Classifier - Maps raw media params to group keys

use crate::utils::case::kebab_case;
use std::collections::HashMap;

/// Decides which group, if any, a media block belongs to
#[derive(Debug, Clone, Copy)]
pub struct QueryClassifier<'a> {
    overrides: &'a HashMap<String, String>,
    extract_all: bool,
}

impl<'a> QueryClassifier<'a> {
    pub fn new(overrides: &'a HashMap<String, String>, extract_all: bool) -> Self {
        Self {
            overrides,
            extract_all,
        }
    }

    /// Key for `params`, or `None` when the block should stay in the tree
    ///
    /// Overrides match only when their key is byte-for-byte equal to
    /// `params`. Without a match, a kebab-case key is derived if
    /// `extract_all` is set. Empty keys count as no match.
    pub fn classify(&self, params: &str) -> Option<String> {
        if let Some(key) = self.overrides.get(params).filter(|key| !key.is_empty()) {
            return Some(key.clone());
        }
        if !self.extract_all {
            return None;
        }
        Some(kebab_case(params)).filter(|key| !key.is_empty())
    }
}
