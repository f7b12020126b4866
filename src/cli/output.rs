use colored::Colorize;

use crate::error::CrmlinkError;
use crate::items::IntegrationItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Json,
}

/// One line per item: `Type  name  (id)` followed by the deep link.
pub fn format_item(item: &IntegrationItem, is_tty: bool) -> String {
    let kind = format!("{:<8}", item.item_type.as_str());
    let id = format!("({})", item.id);
    let mut line = if is_tty {
        format!("{} {} {}", kind.cyan(), item.display_name.bold(), id.dimmed())
    } else {
        format!("{kind} {} {id}", item.display_name)
    };
    if let Some(modified) = item.modified_at.or(item.created_at) {
        line.push_str(&format!("  updated {}", modified.to_rfc3339()));
    }
    if let Some(url) = &item.source_url {
        let url = if is_tty {
            url.underline().to_string()
        } else {
            url.clone()
        };
        line.push_str(&format!("\n         {url}"));
    }
    line
}

pub fn print_items(items: &[IntegrationItem], mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputMode::Pretty => {
            if items.is_empty() {
                println!("No items found");
                return;
            }
            for item in items {
                println!("{}", format_item(item, is_tty));
            }
            let summary = format!("{} item(s)", items.len());
            if is_tty {
                println!("{}", summary.dimmed());
            } else {
                println!("{summary}");
            }
        }
    }
}

pub fn print_error(err: &CrmlinkError, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&err.to_json()).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
    }
}
