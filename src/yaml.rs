//! Minimal YAML writer with explicit per-node styles.
//!
//! Relabel configs are expected in a particular shape (`['__name__']` as a
//! flow sequence, regexes single-quoted), so each node carries its own style
//! instead of leaving the choice to a general-purpose serializer.

/// How a scalar is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
}

/// How a sequence is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStyle {
    Block,
    Flow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(String, ScalarStyle),
    Sequence(Vec<Node>, SequenceStyle),
    /// Entries are written in insertion order.
    Mapping(Vec<(String, Node)>),
}

impl Node {
    pub fn plain(value: impl Into<String>) -> Self {
        Node::Scalar(value.into(), ScalarStyle::Plain)
    }

    pub fn single_quoted(value: impl Into<String>) -> Self {
        Node::Scalar(value.into(), ScalarStyle::SingleQuoted)
    }

    pub fn flow_seq(items: Vec<Node>) -> Self {
        Node::Sequence(items, SequenceStyle::Flow)
    }

    pub fn block_seq(items: Vec<Node>) -> Self {
        Node::Sequence(items, SequenceStyle::Block)
    }

    /// Whether the node fits on the line of its key or dash.
    fn is_inline(&self) -> bool {
        match self {
            Node::Scalar(..) => true,
            Node::Sequence(items, style) => *style == SequenceStyle::Flow || items.is_empty(),
            Node::Mapping(entries) => entries.is_empty(),
        }
    }
}

/// Render `node` as a YAML document body (no `---` marker).
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    write_block(&mut out, node, 0, false);
    out
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn write_scalar(out: &mut String, value: &str, style: ScalarStyle) {
    match style {
        ScalarStyle::Plain => out.push_str(value),
        ScalarStyle::SingleQuoted => {
            out.push('\'');
            out.push_str(&value.replace('\'', "''"));
            out.push('\'');
        }
    }
}

fn write_inline(out: &mut String, node: &Node) {
    match node {
        Node::Scalar(value, style) => write_scalar(out, value, *style),
        Node::Sequence(items, _) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_inline(out, item);
            }
            out.push(']');
        }
        Node::Mapping(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_inline(out, value);
            }
            out.push('}');
        }
    }
}

/// Write `node` in block context at `indent`. When `after_dash` is set the
/// first line continues a `- ` already written by the parent sequence.
fn write_block(out: &mut String, node: &Node, indent: usize, after_dash: bool) {
    if node.is_inline() {
        if !after_dash {
            pad(out, indent);
        }
        write_inline(out, node);
        out.push('\n');
        return;
    }

    match node {
        Node::Sequence(items, _) => {
            for (i, item) in items.iter().enumerate() {
                if !(after_dash && i == 0) {
                    pad(out, indent);
                }
                out.push_str("- ");
                if item.is_inline() {
                    write_inline(out, item);
                    out.push('\n');
                } else {
                    write_block(out, item, indent + 2, true);
                }
            }
        }
        Node::Mapping(entries) => {
            for (i, (key, value)) in entries.iter().enumerate() {
                if !(after_dash && i == 0) {
                    pad(out, indent);
                }
                out.push_str(key);
                out.push(':');
                if value.is_inline() {
                    out.push(' ');
                    write_inline(out, value);
                    out.push('\n');
                } else {
                    out.push('\n');
                    write_block(out, value, indent + 2, false);
                }
            }
        }
        // inline, written above
        Node::Scalar(..) => {}
    }
}
