//! Run command - process the merge queue once

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check};
use crate::cli::{CliProgress, outcome_line};
use anstream::println;
use pr_automerge::config::ConfigOverrides;
use pr_automerge::error::Result;
use pr_automerge::merge::{RunOptions, RunReport, TokioClock, run_merge_queue};
use std::path::Path;
use std::process::ExitCode;

/// Run the queue and turn the report into an exit code
pub async fn run_queue(overrides: ConfigOverrides, config_path: Option<&Path>) -> Result<ExitCode> {
    let ctx = CommandContext::new(overrides, config_path).await?;
    let options = &ctx.config.options;

    print_header(&ctx, options);

    let progress = CliProgress::detect();
    let report = run_merge_queue(ctx.platform.as_ref(), &TokioClock, options, &progress).await?;

    print_summary(&report, options.dry_run);
    Ok(ExitCode::from(report.exit_code()))
}

fn print_header(ctx: &CommandContext, options: &RunOptions) {
    let label = options
        .label
        .as_deref()
        .map_or_else(|| "any".to_string(), ToString::to_string);
    println!(
        "{} {} {}",
        if options.dry_run {
            "Checking".emphasis()
        } else {
            "Merging".emphasis()
        },
        ctx.config.platform.full_name().accent(),
        format!(
            "(label: {label}, approvals: {}, method: {}, token: {})",
            options.required_approvals, options.merge_method, ctx.auth_source
        )
        .muted()
    );
}

/// Print merged / skipped / failed candidates
fn print_summary(report: &RunReport, dry_run: bool) {
    println!();
    if report.candidates.is_empty() {
        println!("{}", "No candidate PRs found.".muted());
        return;
    }

    let merged = report.merged();
    let skipped = report.skipped().count();
    let failed = report.failed().count();

    if report.has_failures() {
        println!("{} Run finished with failures", "⚠️".warn());
    } else if dry_run {
        println!("{} Dry run complete", check());
    } else {
        println!("{} Run complete", check());
    }

    if !merged.is_empty() {
        let list: Vec<String> = merged.iter().map(|n| format!("#{n}")).collect();
        println!("   Merged: {}", list.join(", ").accent());
    }
    println!(
        "   {} merged, {} skipped, {} failed",
        merged.len(),
        skipped,
        failed
    );

    for entry in report.failed() {
        println!("   {}", outcome_line(entry));
    }
}
