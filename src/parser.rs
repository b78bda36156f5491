//! Report parsing: read the unused-metrics JSON report and index metrics by job.

use crate::error::PromdropError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Top-level structure of the input report.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetricReport {
    pub additional_metric_counts: Vec<RawMetricCount>,
}

/// One metric entry and the jobs that still scrape it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawMetricCount {
    pub metric: String,
    pub job_counts: Vec<RawJobCount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawJobCount {
    pub job: String,
}

/// Number of unique unused metrics for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub job_name: String,
    pub metric_count: usize,
}

/// Unique metric names per job.
///
/// Jobs iterate in name order and each job's metrics come back sorted, so
/// everything derived from the index is independent of input ordering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobMetricIndex {
    jobs: BTreeMap<String, BTreeSet<String>>,
}

impl JobMetricIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `job` references `metric`. Empty names are ignored.
    /// Returns true if the pair was not already present.
    pub fn insert(&mut self, job: &str, metric: &str) -> bool {
        if job.is_empty() || metric.is_empty() {
            return false;
        }
        self.jobs
            .entry(job.to_string())
            .or_default()
            .insert(metric.to_string())
    }

    /// Build the index from a parsed report.
    pub fn from_report(report: &MetricReport) -> Self {
        let mut index = Self::new();
        for entry in &report.additional_metric_counts {
            if entry.metric.is_empty() {
                continue;
            }
            for job_count in &entry.job_counts {
                index.insert(&job_count.job, &entry.metric);
            }
        }
        index
    }

    /// Sorted metrics for `job`, or None if the job is unknown.
    #[cfg(test)]
    pub fn metrics(&self, job: &str) -> Option<Vec<&str>> {
        self.jobs
            .get(job)
            .map(|set| set.iter().map(String::as_str).collect())
    }

    /// Iterate `(job, sorted metrics)` in job-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.jobs
            .iter()
            .map(|(job, set)| (job.as_str(), set.iter().map(String::as_str).collect()))
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// One summary per job, sorted by job name.
    pub fn summaries(&self) -> Vec<JobSummary> {
        self.jobs
            .iter()
            .map(|(job, set)| JobSummary {
                job_name: job.clone(),
                metric_count: set.len(),
            })
            .collect()
    }
}

/// Read the report at `path` and extract unused metrics per job.
pub fn parse_report(path: &Path) -> Result<(JobMetricIndex, Vec<JobSummary>), PromdropError> {
    let contents = std::fs::read_to_string(path).map_err(|e| PromdropError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let parsed = parse_report_str(&contents).map_err(|e| PromdropError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(
        path = %path.display(),
        jobs = parsed.0.job_count(),
        "parsed metrics report"
    );
    Ok(parsed)
}

/// Same as [`parse_report`] over an in-memory document.
pub fn parse_report_str(
    contents: &str,
) -> Result<(JobMetricIndex, Vec<JobSummary>), serde_json::Error> {
    let report: MetricReport = serde_json::from_str(contents)?;
    let index = JobMetricIndex::from_report(&report);
    let summaries = index.summaries();
    Ok((index, summaries))
}
