// Stylesheet Parser - Builds the lossless tree from a tree-sitter CSS parse
//
// Byte offsets from tree-sitter drive everything: the text between two
// sibling nodes becomes the `before` raw of the second one, so no byte of the
// source is dropped even when the grammar reports errors.

use super::{AtRule, AtRuleRaws, Node, RawNode, RawValue, Rule, RuleRaws, Stylesheet};
use crate::{Error, Result};
use tracing::debug;
use tree_sitter::{Node as TsNode, Parser};

/// At-rule statement kinds that may carry a `{}` block of nested statements
const AT_RULE_KINDS: &[&str] = &["media_statement", "supports_statement", "at_rule"];

const RULE_SET_KIND: &str = "rule_set";

const COMMENT_KINDS: &[&str] = &["comment", "js_comment"];

/// Parse stylesheet text into a [`Stylesheet`]
pub fn parse(css: &str) -> Result<Stylesheet> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_css::LANGUAGE.into();
    parser.set_language(&language)?;

    let tree = parser.parse(css, None).ok_or(Error::Parse)?;
    let root = tree.root_node();
    if root.has_error() {
        debug!("Stylesheet contains syntax errors; affected regions are kept verbatim");
    }

    let builder = TreeBuilder { source: css };
    let mut cursor = root.walk();
    let children: Vec<TsNode> = root.children(&mut cursor).collect();
    let (nodes, end) = builder.collect(&children, 0);

    Ok(Stylesheet {
        nodes,
        after: builder.slice(end, css.len()).to_string(),
    })
}

fn is_comment(node: &TsNode) -> bool {
    COMMENT_KINDS.contains(&node.kind())
}

/// Byte ranges of every comment at or below `node`
fn comment_ranges(node: TsNode, out: &mut Vec<(usize, usize)>) {
    if is_comment(&node) {
        out.push((node.start_byte(), node.end_byte()));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        comment_ranges(child, out);
    }
}

/// Contents of a `{}` block
struct Block {
    nodes: Vec<Node>,
    /// Text between the last child and the closing brace
    after: String,
    closed: bool,
}

/// Source spans of a statement's prelude (selector or params)
struct Prelude<'s> {
    /// Between the leading keyword and the prelude (at-rules only)
    leading: &'s str,
    text: &'s str,
    /// Between the prelude and the opening brace
    trailing: &'s str,
    /// Prelude byte range, used to locate comments inside it
    range: (usize, usize),
}

struct TreeBuilder<'s> {
    source: &'s str,
}

impl<'s> TreeBuilder<'s> {
    /// Text between two byte offsets (empty if they are out of range)
    fn slice(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or("")
    }

    /// Build sibling nodes starting at byte `pos`; returns the nodes and the
    /// offset just past the last one
    fn collect(&self, children: &[TsNode], mut pos: usize) -> (Vec<Node>, usize) {
        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let start = child.start_byte().max(pos);
            let before = self.slice(pos, start).to_string();
            nodes.push(self.build(*child, before));
            pos = child.end_byte().max(start);
        }
        (nodes, pos)
    }

    fn build(&self, node: TsNode, before: String) -> Node {
        if !node.is_error() {
            let structured = match node.kind() {
                kind if AT_RULE_KINDS.contains(&kind) => {
                    self.at_rule(node, &before).map(Node::AtRule)
                }
                RULE_SET_KIND => self.rule(node, &before).map(Node::Rule),
                _ => None,
            };
            if let Some(structured) = structured {
                return structured;
            }
        }
        Node::Raw(RawNode {
            before,
            text: self.slice(node.start_byte(), node.end_byte()).to_string(),
        })
    }

    /// Split `children` into the prelude and a trailing well-formed block;
    /// `None` when the statement does not end with a block
    fn split_block<'t>(
        &self,
        children: &[TsNode<'t>],
        prelude_start: usize,
        leading_end: usize,
    ) -> Option<(Prelude<'s>, TsNode<'t>)> {
        let block_idx = children.iter().rposition(|c| c.kind() == "block")?;
        if block_idx != children.len() - 1 || block_idx < prelude_start {
            return None;
        }
        let block = children[block_idx];

        let prelude: Vec<&TsNode> = children[prelude_start..block_idx]
            .iter()
            .filter(|c| !is_comment(c))
            .collect();
        let prelude = match (prelude.first(), prelude.last()) {
            (Some(first), Some(last)) => Prelude {
                leading: self.slice(leading_end, first.start_byte()),
                text: self.slice(first.start_byte(), last.end_byte()),
                trailing: self.slice(last.end_byte(), block.start_byte()),
                range: (first.start_byte(), last.end_byte()),
            },
            _ => Prelude {
                leading: "",
                text: "",
                trailing: self.slice(leading_end, block.start_byte()),
                range: (leading_end, leading_end),
            },
        };
        Some((prelude, block))
    }

    fn block(&self, block: TsNode) -> Option<Block> {
        let mut cursor = block.walk();
        let items: Vec<TsNode> = block.children(&mut cursor).collect();
        let open = items
            .first()
            .filter(|n| n.kind() == "{" && !n.is_missing())?;
        let closed = items.len() > 1
            && items
                .last()
                .is_some_and(|n| n.kind() == "}" && !n.is_missing());
        let inner = if closed {
            &items[1..items.len() - 1]
        } else {
            &items[1..]
        };

        let (nodes, pos) = self.collect(inner, open.end_byte());
        let inner_end = if closed {
            items[items.len() - 1].start_byte()
        } else {
            block.end_byte()
        };

        Some(Block {
            nodes,
            after: self.slice(pos, inner_end.max(pos)).to_string(),
            closed,
        })
    }

    /// Prelude text with every comment inside it cut out
    fn without_comments(&self, children: &[TsNode], prelude: &Prelude<'s>) -> String {
        let (start, end) = prelude.range;
        let mut comments = Vec::new();
        for child in children {
            comment_ranges(*child, &mut comments);
        }
        comments.retain(|&(from, to)| from >= start && to <= end);
        comments.sort_unstable();

        let mut cleaned = String::with_capacity(end - start);
        let mut pos = start;
        for (from, to) in comments {
            if from >= pos {
                cleaned.push_str(self.slice(pos, from));
                pos = to;
            }
        }
        cleaned.push_str(self.slice(pos, end));
        cleaned
    }

    /// Structure an at-rule statement; `None` means it has no well-formed
    /// block and must be kept verbatim
    fn at_rule(&self, node: TsNode, before: &str) -> Option<AtRule> {
        let mut cursor = node.walk();
        let children: Vec<TsNode> = node.children(&mut cursor).collect();

        let keyword = children.first()?;
        let name = self
            .slice(keyword.start_byte(), keyword.end_byte())
            .strip_prefix('@')?;
        let (prelude, block) = self.split_block(&children, 1, keyword.end_byte())?;
        let Block {
            nodes,
            after,
            closed,
        } = self.block(block)?;

        let params = self.without_comments(&children[1..children.len() - 1], &prelude);
        let raw_params = (params != prelude.text).then(|| RawValue {
            value: params.clone(),
            raw: prelude.text.to_string(),
        });

        Some(AtRule {
            name: name.to_string(),
            params,
            nodes,
            raws: AtRuleRaws {
                before: before.to_string(),
                after_name: prelude.leading.to_string(),
                between: prelude.trailing.to_string(),
                after,
                closed,
                params: raw_params,
            },
        })
    }

    /// Structure a rule set so statements nested in its block are reachable
    fn rule(&self, node: TsNode, before: &str) -> Option<Rule> {
        let mut cursor = node.walk();
        let children: Vec<TsNode> = node.children(&mut cursor).collect();

        let (prelude, block) = self.split_block(&children, 0, node.start_byte())?;
        if prelude.text.is_empty() {
            return None;
        }
        let Block {
            nodes,
            after,
            closed,
        } = self.block(block)?;

        Some(Rule {
            selector: format!("{}{}", prelude.leading, prelude.text),
            nodes,
            raws: RuleRaws {
                before: before.to_string(),
                between: prelude.trailing.to_string(),
                after,
                closed,
            },
        })
    }
}
