use std::path::Path;

use anyhow::{Context, Result};

use aralin_lib::content::{extract_and_validate, ContentKind};

use crate::render::terminal::render_items;
use crate::OutputFormat;

pub fn run(kind: ContentKind, file: Option<&Path>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf).context("Failed to read stdin")?;
            buf
        }
    };

    let extracted = extract_and_validate(&text, kind)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&extracted.items)?),
        OutputFormat::Plain => println!("{}", render_items(&extracted.items, use_color)),
    }

    Ok(())
}
