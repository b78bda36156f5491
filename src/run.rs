//! End-to-end pipeline: parse the report, write per-job artifacts, confirm,
//! then generate relabel rules for every job.

use crate::config::Settings;
use crate::error::PromdropError;
use crate::parser::{self, JobMetricIndex};
use crate::prompt;
use crate::report;
use crate::rules;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Behaviour switches that do not come from the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip the confirmation prompt.
    pub assume_yes: bool,
    /// Print summaries and group tables but write no files.
    pub dry_run: bool,
}

/// What a run produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub jobs: usize,
    pub metrics: usize,
    pub rules: usize,
    /// Files successfully written, in write order.
    pub written: Vec<PathBuf>,
    /// Non-fatal write failures.
    pub failed_writes: usize,
    /// Whether relabel rules were generated (false if declined or no jobs).
    pub generated: bool,
}

fn console(result: io::Result<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to write console output");
    }
}

/// Run the whole pipeline. Answers are read from `input`; tables, prompts and
/// `[Info]` lines go to `out`.
pub fn run<R: BufRead, W: Write>(
    settings: &Settings,
    options: RunOptions,
    input: &mut R,
    out: &mut W,
) -> Result<RunSummary, PromdropError> {
    let (index, summaries) = parser::parse_report(&settings.input_file)?;
    let mut summary = RunSummary {
        jobs: index.job_count(),
        metrics: summaries.iter().map(|s| s.metric_count).sum(),
        ..Default::default()
    };

    console(report::write_summary_report(out, &summaries));

    if index.is_empty() {
        tracing::info!(
            file = %settings.input_file.display(),
            "no unused metrics found, nothing to generate"
        );
        return Ok(summary);
    }

    if !options.dry_run {
        std::fs::create_dir_all(&settings.txt_output_dir).map_err(|e| PromdropError::Write {
            path: settings.txt_output_dir.clone(),
            source: e,
        })?;
        write_metric_lists(settings, &index, out, &mut summary);

        match report::write_summary_file(&settings.txt_output_dir, &summaries, &settings.input_file)
        {
            Ok(path) => {
                console(writeln!(out, "[Info] Summary file created -> {}", path.display()));
                summary.written.push(path);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to write summary file");
                summary.failed_writes += 1;
            }
        }

        if !options.assume_yes
            && !prompt::confirm(input, out, "Proceed with YAML generation?")
        {
            console(writeln!(out, "YAML generation cancelled."));
            return Ok(summary);
        }
    }

    let mut documents = Vec::with_capacity(index.job_count());
    for (job, metrics) in index.iter() {
        let (job_rules, infos) = rules::generate_relabel_rules(&metrics, settings.max_regex_length);
        tracing::debug!(
            job,
            metrics = metrics.len(),
            rules = job_rules.len(),
            "generated relabel rules"
        );

        console(writeln!(
            out,
            "\n[Job] {job} ({} metrics, {} rules)",
            metrics.len(),
            job_rules.len()
        ));
        console(report::write_group_summary(out, &infos));

        let document = report::render_job_rules(job, &job_rules);
        if settings.split_yaml && !options.dry_run {
            let path = report::split_yaml_path(&settings.txt_output_dir, job);
            record_write(
                report::write_text_file(&path, &document).map(|()| path),
                job,
                out,
                &mut summary,
            );
        }

        summary.rules += job_rules.len();
        documents.push(document);
    }
    summary.generated = true;

    if options.dry_run {
        console(writeln!(
            out,
            "\n[Info] Dry run: {} rules for {} jobs, no files written.",
            summary.rules, summary.jobs
        ));
        return Ok(summary);
    }

    ensure_parent_dir(&settings.output_file)?;
    report::write_text_file(&settings.output_file, &report::render_combined(&documents))?;
    console(writeln!(
        out,
        "\n[Info] Relabel configs written -> {}",
        settings.output_file.display()
    ));
    summary.written.push(settings.output_file.clone());

    Ok(summary)
}

fn write_metric_lists<W: Write>(
    settings: &Settings,
    index: &JobMetricIndex,
    out: &mut W,
    summary: &mut RunSummary,
) {
    for (job, metrics) in index.iter() {
        let result = report::write_metric_list_file(&settings.txt_output_dir, job, &metrics);
        record_write(result, job, out, summary);
    }
}

fn record_write<W: Write>(
    result: Result<PathBuf, PromdropError>,
    job: &str,
    out: &mut W,
    summary: &mut RunSummary,
) {
    match result {
        Ok(path) => {
            console(writeln!(
                out,
                "[Info] Created file for job '{job}' -> {}",
                path.display()
            ));
            summary.written.push(path);
        }
        Err(e) => {
            tracing::warn!(job, error = %e, "failed to write job file, continuing");
            summary.failed_writes += 1;
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), PromdropError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| PromdropError::Write {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}
