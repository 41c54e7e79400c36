use anyhow::Result;
use chrono::Utc;

use aralin_lib::review::{schedule_next_review, Quality};

use crate::render::terminal::render_schedule;
use crate::OutputFormat;

pub fn run(quality: i64, ease_factor: f64, interval: u32, format: &OutputFormat, use_color: bool) -> Result<()> {
    let quality = Quality::new(quality)?;
    let schedule = schedule_next_review(quality, ease_factor, interval, Utc::now());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schedule)?),
        OutputFormat::Plain => println!("{}", render_schedule(&schedule, use_color)),
    }

    Ok(())
}
