pub mod bulk;
pub mod interactive;
pub mod read;
pub mod write;

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use log::info;

use super::app::{Cli, Commands};
use super::ui::{ConsoleProgress, StatusLine};
use crate::api::OptionSetClient;
use crate::config::{load_credentials, Settings};

/// Everything a command handler needs
pub struct CommandContext {
    pub client: OptionSetClient,
    pub settings: Settings,
    pub language_code: i32,
    /// Spinner line shared with the client's progress messages
    pub status: StatusLine,
}

impl CommandContext {
    /// Load settings and credentials, then authenticate once up front
    pub async fn connect(cli: &Cli) -> Result<Self> {
        let settings = Settings::load(cli.config.as_deref())?;
        let language_code = cli.language_code.unwrap_or(settings.language_code);

        let env_path = cli.env.clone().unwrap_or_else(|| PathBuf::from(".env"));
        let credentials = load_credentials(&env_path, cli.env.is_some())?;
        info!("Connecting to {}", credentials.base_url);

        let status = StatusLine::new();

        let client = OptionSetClient::new(credentials)
            .context("Failed to build HTTP client")?
            .with_authority(&settings.authority_host)
            .with_language_code(language_code)
            .with_progress(ConsoleProgress::new(status.clone()));

        status
            .spin_while("Authenticating …", client.token_cache().get_token(false))
            .await
            .context("Authentication failed")?;
        println!("{}\n", "✓ Authenticated successfully".green());

        Ok(Self {
            client,
            settings,
            language_code,
            status,
        })
    }
}

/// Run the parsed command line; no subcommand opens the interactive menu
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = CommandContext::connect(&cli).await?;

    match cli.command {
        Some(command) => dispatch(&ctx, command).await,
        None => interactive::menu_loop(&ctx).await,
    }
}

/// Hand one command to its handler
pub async fn dispatch(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::ListGlobal => read::list_global_command(ctx).await,
        Commands::Search { label } => read::search_command(ctx, label).await,
        Commands::Show { target } => read::show_command(ctx, &target).await,
        Commands::CreateGlobal {
            optionset,
            display_label,
            from_file,
        } => write::create_global_command(ctx, optionset, display_label, from_file).await,
        Commands::Insert {
            target,
            item_label,
            item_value,
        } => write::insert_command(ctx, &target, item_label, item_value).await,
        Commands::BulkInsert {
            target,
            from_file,
            continue_on_error,
            no_safe,
        } => bulk::bulk_insert_command(ctx, &target, &from_file, continue_on_error, !no_safe).await,
        Commands::BulkUpdate {
            target,
            from_file,
            merge_labels,
            continue_on_error,
        } => {
            bulk::bulk_update_command(ctx, &target, &from_file, merge_labels, continue_on_error)
                .await
        }
        Commands::BulkDelete {
            target,
            from_file,
            yes,
        } => bulk::bulk_delete_command(ctx, &target, &from_file, yes).await,
    }
}
