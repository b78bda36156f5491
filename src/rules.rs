//! Relabel rule generation from packed chunks.

use crate::chunker::{self, PrefixChunks, OTHER_PREFIX};
use crate::yaml::Node;
use std::num::NonZeroUsize;

/// Label every drop rule matches against.
pub const NAME_LABEL: &str = "__name__";

/// Action applied by every generated rule.
pub const DROP_ACTION: &str = "drop";

/// A single `metric_relabel_configs` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelabelRule {
    pub source_labels: Vec<String>,
    pub regex: String,
    pub action: String,
}

impl RelabelRule {
    /// YAML form: flow-style `source_labels`, single-quoted `regex`.
    pub fn to_yaml(&self) -> Node {
        Node::Mapping(vec![
            (
                "source_labels".to_string(),
                Node::flow_seq(
                    self.source_labels
                        .iter()
                        .map(|label| Node::single_quoted(label.as_str()))
                        .collect(),
                ),
            ),
            ("regex".to_string(), Node::single_quoted(self.regex.as_str())),
            ("action".to_string(), Node::plain(self.action.as_str())),
        ])
    }
}

/// Display metadata for the chunk behind one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub prefix: String,
    pub pattern: String,
    pub part: String,
    pub count: usize,
}

fn pattern_label(prefix: &str) -> String {
    if prefix == OTHER_PREFIX {
        "(no prefix)".to_string()
    } else {
        format!("{prefix}_*")
    }
}

/// Turn prefix-grouped chunks into rules plus index-aligned group info.
pub fn emit(groups: &[PrefixChunks]) -> (Vec<RelabelRule>, Vec<GroupInfo>) {
    let mut rules = Vec::new();
    let mut infos = Vec::new();

    for group in groups {
        let pattern = pattern_label(&group.prefix);
        let total = group.chunks.len();
        for (i, chunk) in group.chunks.iter().enumerate() {
            rules.push(RelabelRule {
                source_labels: vec![NAME_LABEL.to_string()],
                regex: chunk.regex(),
                action: DROP_ACTION.to_string(),
            });
            infos.push(GroupInfo {
                prefix: group.prefix.clone(),
                pattern: pattern.clone(),
                part: format!("{}/{}", i + 1, total),
                count: chunk.len(),
            });
        }
    }

    (rules, infos)
}

/// Chunk `metrics` and emit one drop rule per chunk.
pub fn generate_relabel_rules<S: AsRef<str>>(
    metrics: &[S],
    max_regex_length: NonZeroUsize,
) -> (Vec<RelabelRule>, Vec<GroupInfo>) {
    emit(&chunker::chunk_metrics(metrics, max_regex_length))
}
