//! `automerge` - merge labeled, approved GitHub pull requests once checks pass

mod cli;

use anstream::eprintln;
use clap::{ArgAction, Args, Parser, Subcommand};
use cli::style::Stylize;
use pr_automerge::config::ConfigOverrides;
use pr_automerge::error::Error;
use pr_automerge::types::MergeMethod;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Exit code for errors that stop the run before candidates are processed
const EXIT_FATAL: u8 = 2;

#[derive(Parser)]
#[command(
    name = "automerge",
    version,
    about = "Merge labeled, approved GitHub pull requests once their checks pass"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the merge queue once
    Run(RunArgs),
    /// Check which GitHub account the token belongs to
    Auth {
        /// GitHub Enterprise host
        #[arg(long, env = "AUTOMERGE_GITHUB_HOST")]
        host: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: Option<String>,

    /// GitHub Enterprise host
    #[arg(long, env = "AUTOMERGE_GITHUB_HOST")]
    host: Option<String>,

    /// Only consider PRs carrying this label
    #[arg(long, env = "AUTOMERGE_LABEL")]
    label: Option<String>,

    /// Distinct approving reviewers required [default: 2]
    #[arg(long, env = "AUTOMERGE_REQUIRED_APPROVALS")]
    required_approvals: Option<usize>,

    /// Seconds between check polls [default: 20]
    #[arg(long, env = "AUTOMERGE_POLL_INTERVAL")]
    poll_interval: Option<u64>,

    /// Seconds to wait for checks before skipping a PR [default: 900]
    #[arg(long, env = "AUTOMERGE_POLL_TIMEOUT")]
    poll_timeout: Option<u64>,

    /// merge, squash or rebase [default: merge]
    #[arg(long, env = "AUTOMERGE_MERGE_METHOD", value_parser = parse_merge_method)]
    merge_method: Option<MergeMethod>,

    /// Check names to ignore, usually this workflow's own job [default: automerge]
    #[arg(long = "self-check", env = "AUTOMERGE_SELF_CHECK", value_delimiter = ',')]
    self_checks: Vec<String>,

    /// TOML file with the same settings
    #[arg(long, env = "AUTOMERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Evaluate gates and report; never update branches or merge
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    fn overrides(self) -> (ConfigOverrides, Option<PathBuf>) {
        (
            ConfigOverrides {
                repository: self.repo,
                host: self.host,
                label: self.label,
                required_approvals: self.required_approvals,
                poll_interval: self.poll_interval,
                poll_timeout: self.poll_timeout,
                merge_method: self.merge_method,
                self_checks: self.self_checks,
                dry_run: self.dry_run,
            },
            self.config,
        )
    }
}

fn parse_merge_method(value: &str) -> Result<MergeMethod, String> {
    value.parse().map_err(|e: Error| e.to_string())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "warn,pr_automerge=info",
        _ => "info,pr_automerge=debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => {
            let (overrides, config_path) = args.overrides();
            cli::run::run_queue(overrides, config_path.as_deref()).await
        }
        Commands::Auth { host } => cli::auth::run_auth(host.as_deref())
            .await
            .map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", "error:".error());
            ExitCode::from(EXIT_FATAL)
        }
    }
}
