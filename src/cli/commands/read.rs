use anyhow::Result;
use colored::Colorize;
use log::info;

use super::CommandContext;
use crate::cli::app::TargetArgs;
use crate::cli::ui::{print_optionset_list, print_options, prompt_text};

/// List all global OptionSets
pub async fn list_global_command(ctx: &CommandContext) -> Result<()> {
    info!("Listing global option sets");

    let sets = ctx.status.spin_while(
        "Fetching global OptionSets …",
        ctx.client.list_global_optionsets(),
    )
    .await?;

    print_optionset_list("Global OptionSets", &sets, ctx.language_code);
    println!("\n{}", format!("Total: {} global OptionSets", sets.len()).dimmed());
    Ok(())
}

/// Search global OptionSets by display label
pub async fn search_command(ctx: &CommandContext, label: Option<String>) -> Result<()> {
    let text = match label {
        Some(text) => text,
        None => prompt_text("Search text (display label)")?,
    };
    info!("Searching global option sets for '{}'", text);

    let results = ctx.status.spin_while(
        format!("Searching for '{}' …", text),
        ctx.client
            .search_global_optionsets_by_label(&text, ctx.language_code),
    )
    .await?;

    if results.is_empty() {
        println!("{}", format!("No OptionSets matching '{}'", text).yellow());
        return Ok(());
    }

    print_optionset_list(
        &format!("Search Results for '{}'", text),
        &results,
        ctx.language_code,
    );
    Ok(())
}

/// Show the options of one OptionSet
pub async fn show_command(ctx: &CommandContext, target: &TargetArgs) -> Result<()> {
    let target = target.resolve()?;
    info!("Showing options of {}", target);

    let options = ctx.status.spin_while(
        format!("Fetching options for '{}' …", target),
        ctx.client.get_optionset_options(&target),
    )
    .await?;

    if options.is_empty() {
        println!(
            "{}",
            format!("OptionSet '{}' not found or has no options.", target).yellow()
        );
        return Ok(());
    }

    print_options(&options, ctx.language_code);
    println!("\n{}", format!("Total options: {}", options.len()).dimmed());
    Ok(())
}
