// Stylesheet Tree - Lossless container tree over a parsed stylesheet
//
// At-rules and rule sets that own a `{}` block are modelled structurally.
// Everything else (declarations, comments, block-less statements, parse-error
// regions) is carried as verbatim text so that serializing an untouched tree
// reproduces its input byte for byte.

mod parser;

pub use parser::parse;

use std::fmt;

/// A parsed stylesheet document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
    /// Trailing text after the last node
    pub after: String,
}

/// A direct child of a stylesheet or of a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    AtRule(AtRule),
    Rule(Rule),
    Raw(RawNode),
}

/// Verbatim chunk of source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNode {
    /// Whitespace (and stray text) preceding the node inside its parent
    pub before: String,
    pub text: String,
}

/// Whitespace and punctuation around the structural parts of an at-rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRuleRaws {
    pub before: String,
    /// Between the `@name` keyword and the params
    pub after_name: String,
    /// Between the params and the opening brace
    pub between: String,
    /// Between the last child and the closing brace
    pub after: String,
    /// False when the source ended before the block was closed
    pub closed: bool,
    /// Params as written, when they differ from the cleaned `params`
    pub params: Option<RawValue>,
}

impl Default for AtRuleRaws {
    fn default() -> Self {
        Self {
            before: String::new(),
            after_name: " ".to_string(),
            between: " ".to_string(),
            after: "\n".to_string(),
            closed: true,
            params: None,
        }
    }
}

/// Source text kept next to a cleaned value
///
/// `raw` is emitted only while the node still holds `value`, so edits to the
/// cleaned value win over the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    pub value: String,
    pub raw: String,
}

/// Whitespace and punctuation around a rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRaws {
    pub before: String,
    /// Between the selector and the opening brace
    pub between: String,
    /// Between the last child and the closing brace
    pub after: String,
    pub closed: bool,
}

impl Default for RuleRaws {
    fn default() -> Self {
        Self {
            before: String::new(),
            between: " ".to_string(),
            after: "\n".to_string(),
            closed: true,
        }
    }
}

/// A rule set, e.g. `.a { color: red; }`, possibly holding nested rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub raws: RuleRaws,
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            nodes: Vec::new(),
            raws: RuleRaws::default(),
        }
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        self.write_css(&mut out);
        out
    }

    fn write_css(&self, out: &mut String) {
        out.push_str(&self.raws.before);
        out.push_str(&self.selector);
        out.push_str(&self.raws.between);
        write_block(&self.nodes, &self.raws.after, self.raws.closed, out);
    }
}

fn write_block(nodes: &[Node], after: &str, closed: bool, out: &mut String) {
    out.push('{');
    for node in nodes {
        node.write_css(out);
    }
    out.push_str(after);
    if closed {
        out.push('}');
    }
}

/// An at-rule with a block, e.g. `@media screen { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// Name without the leading `@`
    pub name: String,
    /// Parameter string as written in the source, minus comments
    pub params: String,
    pub nodes: Vec<Node>,
    pub raws: AtRuleRaws,
}

impl AtRule {
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            nodes: Vec::new(),
            raws: AtRuleRaws::default(),
        }
    }

    pub fn is_media(&self) -> bool {
        self.name == "media"
    }

    /// Take the rule out of its parent context so it can stand on its own
    /// at the top of a new document.
    pub fn detached(mut self) -> Self {
        self.raws.before.clear();
        self
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        self.write_css(&mut out);
        out
    }

    fn write_css(&self, out: &mut String) {
        out.push_str(&self.raws.before);
        out.push('@');
        out.push_str(&self.name);
        out.push_str(&self.raws.after_name);
        match &self.raws.params {
            Some(raw) if raw.value == self.params => out.push_str(&raw.raw),
            _ => out.push_str(&self.params),
        }
        out.push_str(&self.raws.between);
        write_block(&self.nodes, &self.raws.after, self.raws.closed, out);
    }
}

impl Node {
    fn write_css(&self, out: &mut String) {
        match self {
            Node::AtRule(rule) => rule.write_css(out),
            Node::Rule(rule) => rule.write_css(out),
            Node::Raw(raw) => {
                out.push_str(&raw.before);
                out.push_str(&raw.text);
            }
        }
    }
}

impl Stylesheet {
    pub fn parse(css: &str) -> crate::Result<Self> {
        parse(css)
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_css(&mut out);
        }
        out.push_str(&self.after);
        out
    }

    /// Visit every at-rule named `name` in document order, descending into
    /// at-rule and rule set blocks
    pub fn walk_at_rules<'a>(&'a self, name: &str, mut f: impl FnMut(&'a AtRule)) {
        fn visit<'a>(nodes: &'a [Node], name: &str, f: &mut impl FnMut(&'a AtRule)) {
            for node in nodes {
                match node {
                    Node::AtRule(rule) => {
                        if rule.name == name {
                            f(rule);
                        }
                        visit(&rule.nodes, name, f);
                    }
                    Node::Rule(rule) => visit(&rule.nodes, name, f),
                    Node::Raw(_) => {}
                }
            }
        }
        visit(&self.nodes, name, &mut f);
    }

    pub fn media_count(&self) -> usize {
        let mut count = 0;
        self.walk_at_rules("media", |_| count += 1);
        count
    }
}

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl fmt::Display for AtRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}
