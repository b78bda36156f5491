//! Human-readable output: summary tables, per-job metric lists, rule documents.
//!
//! Table writers take an explicit destination so the same code serves the
//! console and the persisted `summary.txt`.

use crate::error::PromdropError;
use crate::filename::sanitize_filename;
use crate::parser::JobSummary;
use crate::rules::{GroupInfo, RelabelRule};
use crate::yaml::{self, Node};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the persisted job summary inside the text output directory.
pub const SUMMARY_FILE_NAME: &str = "summary.txt";

/// Column gap between table cells.
const CELL_PADDING: usize = 2;

/// Write rows as left-aligned columns, each padded to its widest cell.
fn write_table<W: Write>(w: &mut W, indent: &str, rows: &[Vec<String>]) -> io::Result<()> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    for row in rows {
        let mut line = String::from(indent);
        for (i, cell) in row.iter().enumerate() {
            if i + 1 == row.len() {
                line.push_str(cell);
            } else {
                let width = widths[i] + CELL_PADDING;
                line.push_str(&format!("{cell:<width$}"));
            }
        }
        writeln!(w, "{}", line.trim_end())?;
    }
    Ok(())
}

/// Job summary table with a TOTAL row. When `source_file` is given a
/// leading SOURCE FILE column is added, as in the persisted summary.
pub fn write_job_summary_table<W: Write>(
    w: &mut W,
    summaries: &[JobSummary],
    source_file: Option<&str>,
) -> io::Result<()> {
    let mut sorted: Vec<&JobSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| a.job_name.cmp(&b.job_name));

    let total_metrics: usize = sorted.iter().map(|s| s.metric_count).sum();
    let total_jobs = sorted.len();
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(sorted.len() + 3);

    match source_file {
        Some(source) => {
            rows.push(vec![
                "SOURCE FILE".to_string(),
                "JOB NAME".to_string(),
                "METRIC COUNT".to_string(),
            ]);
            for s in &sorted {
                rows.push(vec![
                    source.to_string(),
                    s.job_name.clone(),
                    s.metric_count.to_string(),
                ]);
            }
            rows.push(vec![
                "--------".to_string(),
                "--------".to_string(),
                "---------".to_string(),
            ]);
            rows.push(vec![
                "TOTAL".to_string(),
                format!("{total_jobs} jobs"),
                total_metrics.to_string(),
            ]);
        }
        None => {
            rows.push(vec!["JOB NAME".to_string(), "METRIC COUNT".to_string()]);
            for s in &sorted {
                rows.push(vec![s.job_name.clone(), s.metric_count.to_string()]);
            }
            rows.push(vec!["--------".to_string(), "---------".to_string()]);
            rows.push(vec![
                format!("TOTAL ({total_jobs} jobs)"),
                total_metrics.to_string(),
            ]);
        }
    }

    write_table(w, "", &rows)?;
    w.flush()
}

/// Console banner, job summary table, and job count line.
pub fn write_summary_report<W: Write>(w: &mut W, summaries: &[JobSummary]) -> io::Result<()> {
    writeln!(w, "[Summary of Metric Files to Process]")?;
    write_job_summary_table(w, summaries, None)?;
    writeln!(w, "Processing a total of {} jobs.", summaries.len())
}

/// Per-chunk group table for one job. Writes nothing for an empty list.
pub fn write_group_summary<W: Write>(w: &mut W, infos: &[GroupInfo]) -> io::Result<()> {
    if infos.is_empty() {
        return Ok(());
    }

    writeln!(w, "  [Metric Group Summary]")?;
    let mut rows = vec![vec![
        "PREFIX".to_string(),
        "PATTERN".to_string(),
        "PART".to_string(),
        "METRIC COUNT".to_string(),
    ]];
    for info in infos {
        rows.push(vec![
            info.prefix.clone(),
            info.pattern.clone(),
            info.part.clone(),
            info.count.to_string(),
        ]);
    }
    write_table(w, "  ", &rows)?;

    let total: usize = infos.iter().map(|i| i.count).sum();
    writeln!(w, "  Total metrics included in YAML rules: {total}")
}

/// Path of the metric list file for `job` inside `dir`.
pub fn metric_list_path(dir: &Path, job: &str) -> PathBuf {
    dir.join(format!("unused_metrics_{}.txt", sanitize_filename(job)))
}

/// Path of the split relabel-config file for `job` inside `dir`.
pub fn split_yaml_path(dir: &Path, job: &str) -> PathBuf {
    dir.join(format!("relabel_configs_{}.yaml", sanitize_filename(job)))
}

fn create_file(path: &Path) -> Result<BufWriter<File>, PromdropError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| PromdropError::Write {
            path: path.to_path_buf(),
            source: e,
        })
}

fn write_err(path: &Path) -> impl FnOnce(io::Error) -> PromdropError + '_ {
    move |e| PromdropError::Write {
        path: path.to_path_buf(),
        source: e,
    }
}

/// Write `job`'s metrics, one per line, to `unused_metrics_<job>.txt`.
pub fn write_metric_list_file<S: AsRef<str>>(
    dir: &Path,
    job: &str,
    metrics: &[S],
) -> Result<PathBuf, PromdropError> {
    let path = metric_list_path(dir, job);
    let mut w = create_file(&path)?;
    for metric in metrics {
        writeln!(w, "{}", metric.as_ref()).map_err(write_err(&path))?;
    }
    w.flush().map_err(write_err(&path))?;
    Ok(path)
}

/// Write `summary.txt` with the source file's base name in every row.
pub fn write_summary_file(
    dir: &Path,
    summaries: &[JobSummary],
    source_path: &Path,
) -> Result<PathBuf, PromdropError> {
    let path = dir.join(SUMMARY_FILE_NAME);
    let source = source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_path.display().to_string());

    let mut w = create_file(&path)?;
    write_job_summary_table(&mut w, summaries, Some(&source)).map_err(write_err(&path))?;
    Ok(path)
}

/// Write `contents` to `path`, creating or truncating it.
pub fn write_text_file(path: &Path, contents: &str) -> Result<(), PromdropError> {
    let mut w = create_file(path)?;
    w.write_all(contents.as_bytes()).map_err(write_err(path))?;
    w.flush().map_err(write_err(path))
}

/// Escape line breaks so `text` stays inside a single YAML comment line.
fn comment_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{85}' | '\u{2028}' | '\u{2029}' => out.extend(c.escape_unicode()),
            _ => out.push(c),
        }
    }
    out
}

/// One YAML document holding `job`'s drop rules, headed by a job comment.
pub fn render_job_rules(job: &str, rules: &[RelabelRule]) -> String {
    let doc = Node::block_seq(rules.iter().map(RelabelRule::to_yaml).collect());
    format!("# job: {}\n{}", comment_line(job), yaml::render(&doc))
}

/// Join per-job documents into one multi-document stream.
pub fn render_combined(documents: &[String]) -> String {
    documents.join("---\n")
}
