//! Prefix grouping and length-bounded packing of metric names.
//!
//! Metrics are grouped by the token before their first underscore, then each
//! group is packed left to right into chunks whose `|`-joined regex stays
//! within the configured maximum length.

use regex::Regex;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::LazyLock;

/// Group key for metrics without a usable prefix.
pub const OTHER_PREFIX: &str = "other";

static PREFIX_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^_]+)_").unwrap());

/// Metrics sharing a prefix, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGroup {
    pub prefix: String,
    pub metrics: Vec<String>,
}

/// A run of metrics destined for a single relabel rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    pub metrics: Vec<String>,
}

impl Chunk {
    /// Length budget consumed: each metric plus one separator.
    #[cfg(test)]
    pub fn serialized_len(&self) -> usize {
        self.metrics.iter().map(|m| token_len(m)).sum()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// The alternation pattern for this chunk.
    pub fn regex(&self) -> String {
        self.metrics.join("|")
    }
}

/// All chunks produced for one prefix, in packing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixChunks {
    pub prefix: String,
    pub chunks: Vec<Chunk>,
}

fn token_len(metric: &str) -> usize {
    metric.len() + 1
}

/// Prefix of a metric name: the text before the first underscore, or
/// [`OTHER_PREFIX`] when there is none.
pub fn prefix_of(metric: &str) -> &str {
    PREFIX_PATTERN
        .captures(metric)
        .and_then(|caps| caps.get(1))
        .map_or(OTHER_PREFIX, |m| m.as_str())
}

/// Group metrics by prefix. Groups come back in prefix order, each sorted.
pub fn group_by_prefix<S: AsRef<str>>(metrics: &[S]) -> Vec<PrefixGroup> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for metric in metrics {
        let metric = metric.as_ref();
        groups
            .entry(prefix_of(metric).to_string())
            .or_default()
            .push(metric.to_string());
    }

    groups
        .into_iter()
        .map(|(prefix, mut metrics)| {
            metrics.sort();
            PrefixGroup { prefix, metrics }
        })
        .collect()
}

/// Greedily pack sorted metrics into chunks of at most `max_length`.
///
/// A metric that alone exceeds `max_length` becomes a singleton chunk.
pub fn pack_chunks<S: AsRef<str>>(metrics: &[S], max_length: NonZeroUsize) -> Vec<Chunk> {
    let max_length = max_length.get();
    let mut chunks = Vec::new();
    let mut current = Chunk::default();
    let mut current_len = 0;

    for metric in metrics {
        let metric = metric.as_ref();
        let len = token_len(metric);
        if current_len + len > max_length && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.metrics.push(metric.to_string());
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Group `metrics` by prefix and pack every group.
pub fn chunk_metrics<S: AsRef<str>>(metrics: &[S], max_length: NonZeroUsize) -> Vec<PrefixChunks> {
    group_by_prefix(metrics)
        .into_iter()
        .map(|group| {
            let chunks = pack_chunks(&group.metrics, max_length);
            tracing::trace!(
                prefix = %group.prefix,
                metrics = group.metrics.len(),
                chunks = chunks.len(),
                "packed prefix group"
            );
            PrefixChunks {
                prefix: group.prefix,
                chunks,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn chunk_lists(chunks: &[Chunk]) -> Vec<Vec<&str>> {
        chunks
            .iter()
            .map(|c| c.metrics.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_prefix_before_first_underscore() {
        assert_eq!(prefix_of("http_requests_total"), "http");
        assert_eq!(prefix_of("go_gc_duration_seconds"), "go");
    }

    #[test]
    fn test_prefix_other_without_underscore() {
        assert_eq!(prefix_of("uptime"), OTHER_PREFIX);
    }

    #[test]
    fn test_prefix_other_for_leading_underscore() {
        assert_eq!(prefix_of("_private_metric"), OTHER_PREFIX);
    }

    #[test]
    fn test_groups_sorted_with_other_in_lexicographic_place() {
        let groups = group_by_prefix(&["zookeeper_up", "uptime", "apache_up", "node_load1"]);
        let prefixes: Vec<_> = groups.iter().map(|g| g.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["apache", "node", OTHER_PREFIX, "zookeeper"]);
    }

    #[test]
    fn test_metrics_sorted_within_group() {
        let groups = group_by_prefix(&["http_z", "http_a", "http_m"]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].metrics, vec!["http_a", "http_m", "http_z"]);
    }

    #[test]
    fn test_small_limit_gives_singleton_chunks() {
        let chunks = pack_chunks(&["a_1", "a_2", "a_3"], limit(6));
        assert_eq!(
            chunk_lists(&chunks),
            vec![vec!["a_1"], vec!["a_2"], vec!["a_3"]]
        );
    }

    #[test]
    fn test_large_limit_gives_single_chunk() {
        let chunks = pack_chunks(&["a_1", "a_2", "a_3"], limit(100));
        assert_eq!(chunk_lists(&chunks), vec![vec!["a_1", "a_2", "a_3"]]);
        assert_eq!(chunks[0].regex(), "a_1|a_2|a_3");
    }

    #[test]
    fn test_exact_fit_stays_in_chunk() {
        // 4 + 4 = 8, not strictly above 8
        let chunks = pack_chunks(&["a_1", "a_2", "a_3"], limit(8));
        assert_eq!(chunk_lists(&chunks), vec![vec!["a_1", "a_2"], vec!["a_3"]]);
    }

    #[test]
    fn test_oversized_metric_is_its_own_chunk() {
        let long = "x_".repeat(20);
        let metrics = ["a_1".to_string(), long.clone(), "x_1".to_string()];
        let chunks = pack_chunks(&metrics, limit(10));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].metrics, vec![long]);
        assert!(chunks[1].serialized_len() > 10);
    }

    #[test]
    fn test_empty_input_has_no_chunks() {
        let none: [&str; 0] = [];
        assert!(pack_chunks(&none, limit(10)).is_empty());
        assert!(chunk_metrics(&none, limit(10)).is_empty());
    }

    #[test]
    fn test_chunk_metrics_packs_each_group_separately() {
        let result = chunk_metrics(&["b_1", "a_1", "a_2", "uptime"], limit(100));
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].prefix, "a");
        assert_eq!(chunk_lists(&result[0].chunks), vec![vec!["a_1", "a_2"]]);
        assert_eq!(result[1].prefix, "b");
        assert_eq!(result[2].prefix, OTHER_PREFIX);
        assert_eq!(chunk_lists(&result[2].chunks), vec![vec!["uptime"]]);
    }

    fn metric_names() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-d]{1,3}(_[a-z0-9]{1,8}){0,3}", 0..40)
    }

    proptest! {
        #[test]
        fn prop_every_metric_in_exactly_one_chunk(metrics in metric_names(), max in 1usize..80) {
            let input: Vec<String> = metrics.iter().cloned().collect();
            let result = chunk_metrics(&input, limit(max));
            let mut seen: Vec<String> = result
                .iter()
                .flat_map(|g| g.chunks.iter())
                .flat_map(|c| c.metrics.iter().cloned())
                .collect();
            prop_assert_eq!(seen.len(), input.len());
            seen.sort();
            prop_assert_eq!(seen, input);
        }

        #[test]
        fn prop_multi_metric_chunks_respect_limit(metrics in metric_names(), max in 1usize..80) {
            let input: Vec<String> = metrics.into_iter().collect();
            for group in chunk_metrics(&input, limit(max)) {
                for chunk in &group.chunks {
                    prop_assert!(!chunk.is_empty());
                    if chunk.len() > 1 {
                        prop_assert!(chunk.serialized_len() <= max);
                    }
                    for metric in &chunk.metrics {
                        prop_assert_eq!(prefix_of(metric), group.prefix.as_str());
                    }
                }
            }
        }

        #[test]
        fn prop_rechunking_flattened_output_is_stable(metrics in metric_names(), max in 1usize..80) {
            let input: Vec<String> = metrics.into_iter().collect();
            for group in chunk_metrics(&input, limit(max)) {
                let flattened: Vec<String> = group
                    .chunks
                    .iter()
                    .flat_map(|c| c.metrics.iter().cloned())
                    .collect();
                prop_assert_eq!(pack_chunks(&flattened, limit(max)), group.chunks);
            }
        }

        #[test]
        fn prop_input_order_irrelevant(metrics in metric_names(), max in 1usize..80) {
            let forward: Vec<String> = metrics.iter().cloned().collect();
            let reversed: Vec<String> = metrics.iter().rev().cloned().collect();
            prop_assert_eq!(
                chunk_metrics(&forward, limit(max)),
                chunk_metrics(&reversed, limit(max))
            );
        }
    }
}
