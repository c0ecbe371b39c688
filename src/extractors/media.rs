// Extraction Engine - Pulls classified @media blocks out of a stylesheet
//
// One document-order walk through at-rule and rule set blocks. Matched blocks
// are absorbed whole (including any blocks nested inside them), so a block
// ends up either in the tree or in exactly one group, never both.

use super::classifier::QueryClassifier;
use crate::stylesheet::{AtRule, Node, Stylesheet};
use std::collections::HashMap;
use tracing::debug;

/// Media blocks sharing one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGroup {
    pub key: String,
    /// Raw params of the first block that produced `key`
    pub query: String,
    /// One merged wrapper when combining, one wrapper per block otherwise
    pub fragments: Vec<AtRule>,
}

impl QueryGroup {
    fn new(key: String, first: AtRule) -> Self {
        Self {
            key,
            query: first.params.clone(),
            fragments: vec![first.detached()],
        }
    }

    fn absorb(&mut self, rule: AtRule, combine: bool) {
        match self.fragments.first_mut() {
            Some(merged) if combine => merged.nodes.extend(rule.nodes),
            _ => self.fragments.push(rule.detached()),
        }
    }

    /// Serialized group content, fragments joined by newlines
    pub fn to_css(&self) -> String {
        self.fragments
            .iter()
            .map(AtRule::to_css)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Groups in order of their key's first appearance in the document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaGroups {
    groups: Vec<QueryGroup>,
    index: HashMap<String, usize>,
}

impl MediaGroups {
    fn add(&mut self, key: String, rule: AtRule, combine: bool) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].absorb(rule, combine),
            None => {
                debug!("New media group `{}` for `{}`", key, rule.params);
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(QueryGroup::new(key, rule));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.key.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryGroup> {
        self.groups.iter()
    }

    pub fn as_slice(&self) -> &[QueryGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a MediaGroups {
    type Item = &'a QueryGroup;
    type IntoIter = std::slice::Iter<'a, QueryGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// How an extraction walk treats matched blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Matched blocks are removed from the tree and owned by their group
    Remove,
    /// Matched blocks are copied into groups; the tree is left untouched
    Preview,
}

pub struct MediaExtractor<'a> {
    classifier: QueryClassifier<'a>,
    combine: bool,
    mode: ExtractMode,
}

impl<'a> MediaExtractor<'a> {
    pub fn new(classifier: QueryClassifier<'a>, combine: bool, mode: ExtractMode) -> Self {
        Self {
            classifier,
            combine,
            mode,
        }
    }

    pub fn extract(&self, sheet: &mut Stylesheet) -> MediaGroups {
        let mut groups = MediaGroups::default();
        self.visit(&mut sheet.nodes, &mut groups);
        debug!("Extracted {} media group(s)", groups.len());
        groups
    }

    fn visit(&self, nodes: &mut Vec<Node>, groups: &mut MediaGroups) {
        let mut i = 0;
        while i < nodes.len() {
            let key = match &nodes[i] {
                Node::AtRule(rule) if rule.is_media() => self.classifier.classify(&rule.params),
                _ => None,
            };

            match key {
                Some(key) => match self.mode {
                    ExtractMode::Remove => {
                        if let Node::AtRule(rule) = nodes.remove(i) {
                            groups.add(key, rule, self.combine);
                        }
                        // the next sibling has shifted into slot `i`
                        continue;
                    }
                    ExtractMode::Preview => {
                        if let Node::AtRule(rule) = &nodes[i] {
                            groups.add(key, rule.clone(), self.combine);
                        }
                    }
                },
                None => match &mut nodes[i] {
                    Node::AtRule(rule) => self.visit(&mut rule.nodes, groups),
                    Node::Rule(rule) => self.visit(&mut rule.nodes, groups),
                    Node::Raw(_) => {}
                },
            }
            i += 1;
        }
    }
}
