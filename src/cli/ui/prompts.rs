use anyhow::Result;
use dialoguer::{Input, Select};

use crate::api::OptionItem;

/// Arrow-key Yes/No selection
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_text(prompt: &str) -> Result<String> {
    let value = Input::<String>::new().with_prompt(prompt).interact_text()?;
    Ok(value.trim().to_string())
}

pub fn prompt_value(prompt: &str) -> Result<i32> {
    Ok(Input::<i32>::new().with_prompt(prompt).interact_text()?)
}

/// Read options one by one until the user types `done`
pub fn prompt_options() -> Result<Vec<OptionItem>> {
    let mut options = Vec::new();
    loop {
        let label = prompt_text("  Label (or 'done')")?;
        if label.eq_ignore_ascii_case("done") {
            break;
        }
        let value = prompt_value("  Value")?;
        options.push(OptionItem::new(label, value));
    }
    Ok(options)
}
