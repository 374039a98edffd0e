//! Console rendering of batch reports and option tables

use colored::Colorize;

use crate::api::{BatchReport, OptionMetadata, OptionSetDef};

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn print_batch_report(report: &BatchReport) {
    println!("\n{}", "Batch Results".bold());
    println!(
        "{:<5} {:<30} {:>8} {:>6}  {}",
        "#", "Label", "Value", "Status", "Detail"
    );
    println!("{}", "-".repeat(72));

    for result in &report.results {
        let status = format!("{:>6}", result.status_code);
        let status = if result.success {
            status.green()
        } else {
            status.red().bold()
        };
        let icon = if result.success { "✓".green() } else { "✗".red() };

        println!(
            "{:<5} {:<30} {:>8} {}  {} {}",
            result.index + 1,
            truncate(&result.label, 30),
            result.value,
            status,
            icon,
            result.detail.dimmed()
        );
        if let Some(message) = &result.message {
            println!("      {}", message.red());
        }
    }

    print_summary(report);
}

pub fn print_summary(report: &BatchReport) {
    let line = format!(
        "Total: {}   Succeeded: {}   Failed: {}",
        report.total, report.succeeded, report.failed
    );
    if report.failed == 0 {
        println!("\n{}", line.green().bold());
    } else {
        println!("\n{}", line.yellow().bold());
    }

    if report.estimated {
        println!(
            "{}",
            "⚠  Per-item results could not be read from at least one response; its counts are assumed"
                .yellow()
        );
    }
}

pub fn print_optionset_list(title: &str, sets: &[OptionSetDef], language_code: i32) {
    println!("{}", title.bold());
    println!(
        "{:<40} {:<40} {:<12} {:>9}",
        "Name", "Display Label", "Type", "# Options"
    );
    println!("{}", "-".repeat(104));

    let mut sorted: Vec<&OptionSetDef> = sets.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    for set in sorted {
        println!(
            "{:<40} {:<40} {:<12} {:>9}",
            truncate(&set.name, 40),
            truncate(set.display_name.label_for(language_code).unwrap_or(""), 40),
            set.option_set_type.as_deref().unwrap_or(""),
            set.options.len()
        );
    }
}

pub fn print_options(options: &[OptionMetadata], language_code: i32) {
    println!("{:>10}  {}", "Value", "Label");
    println!("{}", "-".repeat(50));

    let mut sorted: Vec<&OptionMetadata> = options.iter().collect();
    sorted.sort_by_key(|opt| opt.value.unwrap_or(0));

    for option in sorted {
        let value = option
            .value
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{:>10}  {}",
            value,
            option.label.label_for(language_code).unwrap_or("")
        );
    }
}
