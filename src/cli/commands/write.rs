use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

use super::CommandContext;
use crate::api::{CreateOptionSetRequest, OptionItem};
use crate::cli::app::TargetArgs;
use crate::cli::ui::{prompt_confirmation, prompt_options, prompt_text, prompt_value};
use crate::loader::load_options;

/// Create a new global OptionSet from a file or interactively entered options
pub async fn create_global_command(
    ctx: &CommandContext,
    optionset: Option<String>,
    display_label: Option<String>,
    from_file: Option<PathBuf>,
) -> Result<()> {
    let name = match optionset {
        Some(name) => name,
        None => prompt_text("OptionSet schema name (e.g. new_phoneprefix)")?,
    };
    let display_label = match display_label {
        Some(label) => label,
        None => prompt_text("Display label")?,
    };
    info!("Creating global option set {}", name);

    let existing = ctx.status.spin_while(
        format!("Checking if '{}' exists …", name),
        ctx.client.get_global_optionset(&name),
    )
    .await?;
    if existing.is_some() {
        println!("{}", format!("OptionSet '{}' already exists!", name).red().bold());
        if !prompt_confirmation("Continue anyway? (this will fail at the API level)", false)? {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let options = match &from_file {
        Some(path) => {
            let options = load_options(path)?;
            println!("Loaded {} options from {}", options.len().to_string().bold(), path.display());
            options
        }
        None => {
            println!("{}", "Enter options one by one. Type 'done' to finish.".dimmed());
            prompt_options()?
        }
    };

    if options.is_empty() {
        println!("{}", "No options provided, aborting.".yellow());
        return Ok(());
    }

    let request = CreateOptionSetRequest::new(&name, display_label, options);
    let response = ctx.status.spin_while(
        format!("Creating global OptionSet '{}' …", name),
        ctx.client.create_global_optionset(&request),
    )
    .await
    .with_context(|| format!("Failed to create global OptionSet '{}'", name))?;

    println!(
        "{}",
        format!(
            "✓ Created global OptionSet '{}' ({} options), HTTP {}",
            name,
            request.options.len(),
            response.status_code
        )
        .green()
        .bold()
    );
    Ok(())
}

/// Insert one option
pub async fn insert_command(
    ctx: &CommandContext,
    target: &TargetArgs,
    item_label: Option<String>,
    item_value: Option<i32>,
) -> Result<()> {
    let target = target.resolve()?;
    let label = match item_label {
        Some(label) => label,
        None => prompt_text("Option label")?,
    };
    let value = match item_value {
        Some(value) => value,
        None => prompt_value("Option value")?,
    };
    let option = OptionItem::new(label, value);
    info!("Inserting {:?} into {}", option, target);

    let response = ctx.status.spin_while(
        "Inserting option …",
        ctx.client.insert_option(&option, &target),
    )
    .await
    .with_context(|| format!("Failed to insert '{}' = {}", option.label, option.value))?;

    println!(
        "{}",
        format!(
            "✓ Inserted '{}' = {}, HTTP {}",
            option.label, option.value, response.status_code
        )
        .green()
        .bold()
    );
    Ok(())
}
