//! Menu-driven mode, entered when no subcommand is given

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use dialoguer::Select;
use log::{error, info};

use super::{dispatch, CommandContext};
use crate::cli::app::{Commands, TargetArgs};
use crate::cli::ui::{prompt_confirmation, prompt_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuEntry {
    ListGlobal,
    Search,
    Show,
    CreateGlobal,
    Insert,
    BulkInsert,
    BulkUpdate,
    BulkDelete,
    Quit,
}

impl MenuEntry {
    const ALL: [MenuEntry; 9] = [
        Self::ListGlobal,
        Self::Search,
        Self::Show,
        Self::CreateGlobal,
        Self::Insert,
        Self::BulkInsert,
        Self::BulkUpdate,
        Self::BulkDelete,
        Self::Quit,
    ];

    fn title(self) -> &'static str {
        match self {
            Self::ListGlobal => "List global OptionSets",
            Self::Search => "Search OptionSets by label",
            Self::Show => "Show OptionSet details",
            Self::CreateGlobal => "Create global OptionSet",
            Self::Insert => "Insert single option",
            Self::BulkInsert => "Bulk insert options (from file)",
            Self::BulkUpdate => "Bulk update options (from file)",
            Self::BulkDelete => "Bulk delete options (from file)",
            Self::Quit => "Quit",
        }
    }

    fn needs_file(self) -> bool {
        matches!(self, Self::BulkInsert | Self::BulkUpdate | Self::BulkDelete)
    }

    /// Entries that can address a local OptionSet
    fn takes_target(self) -> bool {
        matches!(
            self,
            Self::Show | Self::Insert | Self::BulkInsert | Self::BulkUpdate | Self::BulkDelete
        )
    }

    /// Command with the defaults of the matching subcommand.
    ///
    /// Everything left unset is prompted for by the handler itself.
    fn into_command(self, target: TargetArgs, from_file: Option<PathBuf>) -> Option<Commands> {
        let command = match self {
            Self::ListGlobal => Commands::ListGlobal,
            Self::Search => Commands::Search { label: None },
            Self::Show => Commands::Show { target },
            Self::CreateGlobal => Commands::CreateGlobal {
                optionset: None,
                display_label: None,
                from_file: None,
            },
            Self::Insert => Commands::Insert {
                target,
                item_label: None,
                item_value: None,
            },
            Self::BulkInsert => Commands::BulkInsert {
                target,
                from_file: from_file?,
                continue_on_error: false,
                no_safe: false,
            },
            Self::BulkUpdate => Commands::BulkUpdate {
                target,
                from_file: from_file?,
                merge_labels: false,
                continue_on_error: false,
            },
            Self::BulkDelete => Commands::BulkDelete {
                target,
                from_file: from_file?,
                yes: false,
            },
            Self::Quit => return None,
        };
        Some(command)
    }
}

/// Ask for the file path and an optional local target, then build the command
fn prompt_command(entry: MenuEntry) -> Result<Option<Commands>> {
    let from_file = if entry.needs_file() {
        Some(PathBuf::from(prompt_text("Path to CSV/JSON file")?))
    } else {
        None
    };

    let mut target = TargetArgs::default();
    if entry.takes_target() && prompt_confirmation("Is this a local (entity-scoped) OptionSet?", false)? {
        target.entity = Some(prompt_text("Entity logical name")?);
        target.attribute = Some(prompt_text("Attribute logical name")?);
    }

    Ok(entry.into_command(target, from_file))
}

/// Show the menu until the user quits; a failed command is reported and the loop goes on
pub async fn menu_loop(ctx: &CommandContext) -> Result<()> {
    let titles: Vec<&str> = MenuEntry::ALL.iter().map(|entry| entry.title()).collect();
    let quit_index = MenuEntry::ALL.len() - 1;

    loop {
        println!("\n{}", "Dataverse OptionSet Helper: Interactive Mode".cyan().bold());

        let selection = Select::new()
            .with_prompt("Select")
            .items(&titles)
            .default(quit_index)
            .interact()?;
        let entry = MenuEntry::ALL[selection];
        info!("Menu selection: {:?}", entry);

        let Some(command) = prompt_command(entry)? else {
            println!("{}", "Goodbye!".dimmed());
            return Ok(());
        };

        if let Err(e) = dispatch(ctx, command).await {
            error!("{:#}", e);
            println!("{} {:#}", "Error:".red().bold(), e);
        }
    }
}
