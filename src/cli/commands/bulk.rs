//! Chunked bulk commands
//!
//! Input files are split into `batch_size` chunks that are sent one after
//! another. Every chunk is its own `$batch` round trip; the per-chunk reports
//! are merged for the final table.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use log::{info, warn};

use super::CommandContext;
use crate::api::{BatchReport, BulkOptions, OptionAction, OptionItem, TargetRef};
use crate::cli::app::TargetArgs;
use crate::cli::ui::{print_batch_report, prompt_confirmation};
use crate::loader::load_options;

fn load(from_file: &Path) -> Result<Vec<OptionItem>> {
    let options = load_options(from_file)?;
    println!(
        "Loaded {} options from {}",
        options.len().to_string().bold(),
        from_file.display()
    );
    Ok(options)
}

fn announce_chunk(index: usize, count: usize, size: usize) {
    println!(
        "{}",
        format!(
            "Batch {}/{} ({} options) starting at {}",
            index + 1,
            count,
            size,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )
        .dimmed()
    );
}

fn in_flight(index: usize, count: usize) -> String {
    format!("Batch {}/{} in flight …", index + 1, count)
}

fn finish_chunk(started: Instant) {
    println!(
        "{}",
        format!(
            "Batch finished (duration: {:.2} seconds)",
            started.elapsed().as_secs_f64()
        )
        .dimmed()
    );
}

/// Print what was merged so far, then hand back the error of the failed chunk
fn abort_with_partial(report: &BatchReport, index: usize, err: anyhow::Error) -> anyhow::Error {
    warn!("Stopping after failed batch {}: {:#}", index + 1, err);
    if !report.results.is_empty() {
        println!("{}", "Results of the batches that completed:".yellow());
        print_batch_report(report);
    }
    err.context(format!("Batch {} failed", index + 1))
}

fn batch_size(ctx: &CommandContext) -> usize {
    ctx.settings.batch_size.max(1)
}

pub async fn bulk_insert_command(
    ctx: &CommandContext,
    target: &TargetArgs,
    from_file: &Path,
    continue_on_error: bool,
    safe: bool,
) -> Result<()> {
    let target = target.resolve()?;
    let options = load(from_file)?;
    info!(
        "Bulk insert of {} option(s) into {} (safe: {})",
        options.len(),
        target,
        safe
    );

    let bulk = BulkOptions::insert().continue_on_error(continue_on_error);
    let (report, skipped_total) = if safe {
        run_safe_chunks(ctx, &options, &target, continue_on_error).await?
    } else {
        (run_chunks(ctx, &options, &target, bulk, OptionAction::Insert).await?, 0)
    };

    if report.total == 0 {
        println!("{}", "Nothing to insert.".green());
    } else {
        print_batch_report(&report);
    }
    if skipped_total > 0 {
        println!(
            "{}",
            format!("Skipped duplicates: {}", skipped_total).yellow()
        );
    }
    Ok(())
}

/// Duplicate-safe variant: each chunk is checked against the live option set
async fn run_safe_chunks(
    ctx: &CommandContext,
    options: &[OptionItem],
    target: &TargetRef,
    continue_on_error: bool,
) -> Result<(BatchReport, usize)> {
    let chunk_count = options.len().div_ceil(batch_size(ctx));
    let mut report = BatchReport::default();
    let mut skipped_total = 0;

    for (index, chunk) in options.chunks(batch_size(ctx)).enumerate() {
        announce_chunk(index, chunk_count, chunk.len());
        let started = Instant::now();

        let outcome = ctx
            .status
            .spin_while(
                in_flight(index, chunk_count),
                ctx.client.safe_bulk_insert(chunk, target, continue_on_error),
            )
            .await
            .context("Batch request was rejected");
        let (chunk_report, skipped) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => return Err(abort_with_partial(&report, index, e)),
        };

        if !skipped.is_empty() {
            println!(
                "{}",
                format!("⚠  Skipped {} duplicate option(s)", skipped.len()).yellow()
            );
            skipped_total += skipped.len();
        }
        if let Some(chunk_report) = chunk_report {
            report.merge(chunk_report);
        }
        finish_chunk(started);
    }

    Ok((report, skipped_total))
}

pub async fn bulk_update_command(
    ctx: &CommandContext,
    target: &TargetArgs,
    from_file: &Path,
    merge_labels: bool,
    continue_on_error: bool,
) -> Result<()> {
    let target = target.resolve()?;
    let options = load(from_file)?;
    info!("Bulk update of {} option(s) in {}", options.len(), target);

    let bulk = BulkOptions::update()
        .continue_on_error(continue_on_error)
        .merge_labels(merge_labels);
    let report = run_chunks(ctx, &options, &target, bulk, OptionAction::Update).await?;

    if report.total == 0 {
        println!("{}", "Nothing to update.".green());
    } else {
        print_batch_report(&report);
    }
    Ok(())
}

pub async fn bulk_delete_command(
    ctx: &CommandContext,
    target: &TargetArgs,
    from_file: &Path,
    yes: bool,
) -> Result<()> {
    let target = target.resolve()?;
    let options = load(from_file)?;

    if !yes {
        let prompt = format!("Delete {} options from '{}'?", options.len(), target);
        if !prompt_confirmation(&prompt, false)? {
            println!("Operation cancelled.");
            return Ok(());
        }
    }
    info!("Bulk delete of {} option(s) from {}", options.len(), target);

    let report = run_chunks(ctx, &options, &target, BulkOptions::delete(), OptionAction::Delete).await?;

    if report.total == 0 {
        println!("{}", "Nothing to delete.".green());
    } else {
        print_batch_report(&report);
    }
    Ok(())
}

async fn run_chunks(
    ctx: &CommandContext,
    options: &[OptionItem],
    target: &TargetRef,
    bulk: BulkOptions,
    action: OptionAction,
) -> Result<BatchReport> {
    let chunk_count = options.len().div_ceil(batch_size(ctx));
    let mut report = BatchReport::default();

    for (index, chunk) in options.chunks(batch_size(ctx)).enumerate() {
        announce_chunk(index, chunk_count, chunk.len());
        let started = Instant::now();

        let call = async {
            match action {
                OptionAction::Insert => ctx.client.bulk_insert_options(chunk, target, bulk).await,
                OptionAction::Update => ctx.client.bulk_update_options(chunk, target, bulk).await,
                OptionAction::Delete => ctx.client.bulk_delete_options(chunk, target, bulk).await,
            }
        };
        let outcome = ctx
            .status
            .spin_while(in_flight(index, chunk_count), call)
            .await;
        match outcome.context("Batch request was rejected") {
            Ok(chunk_report) => report.merge(chunk_report),
            Err(e) => return Err(abort_with_partial(&report, index, e)),
        }
        finish_chunk(started);
    }

    Ok(report)
}
