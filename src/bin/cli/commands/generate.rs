use anyhow::{Context, Result};

use aralin_lib::content::ContentKind;

use crate::app::App;
use crate::render::terminal::render_items;
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn run(
    app: &App,
    kind: ContentKind,
    subject: &str,
    grade: u8,
    count: usize,
    content: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let service = app.generation_service()?;
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    let extracted = runtime.block_on(async {
        match kind {
            ContentKind::Quiz => service.generate_quiz_from_melcs(subject, grade, count, content).await,
            ContentKind::Flashcards => service.generate_flashcards(subject, grade, count, content).await,
        }
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&extracted.items)?),
        OutputFormat::Plain => println!("{}", render_items(&extracted.items, use_color)),
    }

    Ok(())
}
