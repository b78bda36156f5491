mod chunker;
mod config;
mod error;
mod filename;
mod parser;
mod prompt;
mod report;
mod rules;
mod run;
mod yaml;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Turn a Prometheus unused-metrics report into per-job drop rules:
/// list each job's unused metrics, then pack them into length-bounded
/// regexes for `metric_relabel_configs`.
#[derive(Parser, Debug)]
#[command(name = "promdrop", version, about)]
pub struct Cli {
    /// Unused-metrics JSON report (overrides config)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Combined relabel config output file (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for per-job metric lists and summary.txt (overrides config)
    #[arg(long)]
    txt_output_dir: Option<PathBuf>,

    /// Maximum length of each generated regex (overrides config)
    #[arg(long)]
    max_regex_length: Option<usize>,

    /// Also write one relabel config file per job
    #[arg(long)]
    split_yaml: bool,

    /// Config file path
    #[arg(short, long, default_value = "promdrop.toml")]
    config: PathBuf,

    /// Generate rules without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Print summaries and rule groups, write nothing
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (per-job rule counts, config resolution)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_filter(&self) -> EnvFilter {
        let default = if self.verbose {
            "promdrop=debug"
        } else if self.quiet {
            "promdrop=warn"
        } else {
            "promdrop=info"
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }

    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            file: self.file.clone(),
            output: self.output.clone(),
            txt_output_dir: self.txt_output_dir.clone(),
            max_regex_length: self.max_regex_length,
            split_yaml: self.split_yaml,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let settings = match config::PromdropConfig::load(&cli.config)
        .and_then(|cfg| cfg.resolve(cli.overrides()))
    {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?settings, "resolved settings");

    let options = run::RunOptions {
        assume_yes: cli.yes,
        dry_run: cli.dry_run,
    };
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    match run::run(&settings, options, &mut stdin.lock(), &mut stdout.lock()) {
        Ok(summary) => {
            tracing::info!(
                jobs = summary.jobs,
                metrics = summary.metrics,
                rules = summary.rules,
                files = summary.written.len(),
                failed_writes = summary.failed_writes,
                generated = summary.generated,
                "promdrop finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "promdrop failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_overrides_mapped() {
        let cli = Cli::parse_from([
            "promdrop",
            "--file",
            "report.json",
            "--max-regex-length",
            "300",
            "--split-yaml",
            "-y",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.file, Some(PathBuf::from("report.json")));
        assert_eq!(overrides.max_regex_length, Some(300));
        assert!(overrides.split_yaml);
        assert!(overrides.output.is_none());
        assert!(cli.yes);
        assert_eq!(cli.config, PathBuf::from("promdrop.toml"));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["promdrop", "-v", "-q"]).is_err());
    }
}
