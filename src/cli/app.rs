use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dialoguer::Input;

use crate::api::TargetRef;

#[derive(Parser)]
#[command(name = "optionset-cli", version)]
#[command(about = "Manage global and local choices (OptionSets) in a Dataverse environment")]
pub struct Cli {
    /// Path to the .env file with credentials (default: .env, optional)
    #[arg(long, global = true)]
    pub env: Option<PathBuf>,

    /// Path to a config.toml overriding the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Language code for labels (default from config, 1033 = English)
    #[arg(long, global = true)]
    pub language_code: Option<i32>,

    /// Without a subcommand the interactive menu starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all global OptionSets
    ListGlobal,
    /// Search global OptionSets by display label
    Search {
        /// Text to look for (case-insensitive)
        #[arg(long)]
        label: Option<String>,
    },
    /// Show the options of an OptionSet
    Show {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Create a new global OptionSet
    CreateGlobal {
        /// Schema name, e.g. new_phoneprefix
        #[arg(short = 'o', long)]
        optionset: Option<String>,
        /// Display label of the OptionSet
        #[arg(long)]
        display_label: Option<String>,
        /// CSV or JSON file with the initial options
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
    /// Insert a single option
    Insert {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        item_label: Option<String>,
        #[arg(long)]
        item_value: Option<i32>,
    },
    /// Batch insert options from a file
    BulkInsert {
        #[command(flatten)]
        target: TargetArgs,
        /// CSV or JSON file
        #[arg(long)]
        from_file: PathBuf,
        #[arg(long)]
        continue_on_error: bool,
        /// Skip duplicate detection
        #[arg(long)]
        no_safe: bool,
    },
    /// Batch update option labels from a file
    BulkUpdate {
        #[command(flatten)]
        target: TargetArgs,
        /// CSV or JSON file
        #[arg(long)]
        from_file: PathBuf,
        /// Merge labels into existing translations instead of replacing them
        #[arg(long)]
        merge_labels: bool,
        #[arg(long)]
        continue_on_error: bool,
    },
    /// Batch delete options listed in a file
    BulkDelete {
        #[command(flatten)]
        target: TargetArgs,
        /// CSV or JSON file
        #[arg(long)]
        from_file: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Selects a global OptionSet, or a local one by entity and attribute
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Global OptionSet schema name
    #[arg(short = 'o', long)]
    pub optionset: Option<String>,
    /// Entity logical name of a local OptionSet
    #[arg(long, requires = "attribute")]
    pub entity: Option<String>,
    /// Attribute logical name of a local OptionSet
    #[arg(long, requires = "entity")]
    pub attribute: Option<String>,
}

impl TargetArgs {
    /// Entity and attribute win over the schema name; prompts when nothing was given
    pub fn resolve(&self) -> Result<TargetRef> {
        if let Some(target) = self.to_target() {
            return Ok(target);
        }

        let name = Input::<String>::new()
            .with_prompt("OptionSet schema name")
            .interact_text()?;
        Ok(TargetRef::global(name.trim()))
    }

    pub fn to_target(&self) -> Option<TargetRef> {
        match (&self.entity, &self.attribute, &self.optionset) {
            (Some(entity), Some(attribute), _) => Some(TargetRef::local(entity, attribute)),
            (_, _, Some(name)) => Some(TargetRef::global(name)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_target_wins() {
        let cli = Cli::try_parse_from([
            "optionset-cli",
            "bulk-insert",
            "-o",
            "new_region",
            "--entity",
            "account",
            "--attribute",
            "new_region",
            "--from-file",
            "regions.csv",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::BulkInsert { target, no_safe, .. }) => {
                assert_eq!(
                    target.to_target(),
                    Some(TargetRef::local("account", "new_region"))
                );
                assert!(!no_safe);
            }
            _ => panic!("expected bulk-insert"),
        }
    }

    #[test]
    fn test_entity_requires_attribute() {
        let result = Cli::try_parse_from(["optionset-cli", "show", "--entity", "account"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "optionset-cli",
            "list-global",
            "--language-code",
            "1031",
            "--env",
            "prod.env",
        ])
        .unwrap();
        assert_eq!(cli.language_code, Some(1031));
        assert_eq!(cli.env, Some(PathBuf::from("prod.env")));
    }

    #[test]
    fn test_no_subcommand_is_menu_mode() {
        let cli = Cli::try_parse_from(["optionset-cli", "--env", "prod.env"]).unwrap();
        assert!(cli.command.is_none());
    }
}
