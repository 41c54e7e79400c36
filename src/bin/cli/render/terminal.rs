use aralin_lib::content::GeneratedItems;
use aralin_lib::review::{algorithm::format_interval, ReviewSchedule};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const CYAN: &str = "\x1b[36m";
}

const WRAP_WIDTH: usize = 80;

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Render quiz questions or flashcards as numbered terminal text
pub fn render_items(items: &GeneratedItems, use_color: bool) -> String {
    let mut lines = Vec::new();

    match items {
        GeneratedItems::Quiz(questions) => {
            for (i, q) in questions.iter().enumerate() {
                let heading = format!("{}. {}", i + 1, q.question);
                lines.extend(wrap_lines(&paint(&heading, Color::BOLD, use_color), "", WRAP_WIDTH));
                for (j, option) in q.options.iter().enumerate() {
                    let letter = (b'A' + j as u8) as char;
                    let line = format!("{}) {}", letter, option);
                    if j == q.correct_answer {
                        lines.push(format!("   {} {}", paint(&line, Color::GREEN, use_color), "*"));
                    } else {
                        lines.push(format!("   {}", line));
                    }
                }
                lines.push(String::new());
            }
        }
        GeneratedItems::Flashcards(cards) => {
            for (i, card) in cards.iter().enumerate() {
                let heading = format!("{}. {}", i + 1, card.question);
                lines.extend(wrap_lines(&paint(&heading, Color::BOLD, use_color), "", WRAP_WIDTH));
                lines.extend(wrap_lines(&paint(&card.answer, Color::CYAN, use_color), "   ", WRAP_WIDTH));
                lines.push(String::new());
            }
        }
    }

    // Remove trailing blank line
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return paint("(no items)", Color::DIM, use_color);
    }
    lines.join("\n")
}

pub fn render_schedule(schedule: &ReviewSchedule, use_color: bool) -> String {
    [
        format!("Ease factor:  {:.2}", schedule.ease_factor),
        format!(
            "Interval:     {} ({} days)",
            format_interval(schedule.interval_days),
            schedule.interval_days
        ),
        format!(
            "Next review:  {}",
            paint(
                &schedule.next_review_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                Color::BOLD,
                use_color
            )
        ),
    ]
    .join("\n")
}

/// Simple word-wrapping for terminal output
fn wrap_lines(text: &str, prefix: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let effective_width = max_width.saturating_sub(prefix.len());

    for line in text.lines() {
        if line.len() <= effective_width {
            lines.push(format!("{}{}", prefix, line));
        } else {
            let mut current_line = String::new();
            for word in line.split_whitespace() {
                if current_line.is_empty() {
                    current_line = word.to_string();
                } else if current_line.len() + 1 + word.len() <= effective_width {
                    current_line.push(' ');
                    current_line.push_str(word);
                } else {
                    lines.push(format!("{}{}", prefix, current_line));
                    current_line = word.to_string();
                }
            }
            if !current_line.is_empty() {
                lines.push(format!("{}{}", prefix, current_line));
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use aralin_lib::content::{GeneratedFlashcard, GeneratedQuestion};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_quiz_marks_correct_option() {
        let items = GeneratedItems::Quiz(vec![GeneratedQuestion {
            question: "2 + 2?".to_string(),
            options: vec!["3", "4", "5", "6"].into_iter().map(String::from).collect(),
            correct_answer: 1,
        }]);
        let text = render_items(&items, false);
        assert_eq!(text, "1. 2 + 2?\n   A) 3\n   B) 4 *\n   C) 5\n   D) 6");
    }

    #[test]
    fn test_render_flashcards() {
        let items = GeneratedItems::Flashcards(vec![GeneratedFlashcard {
            question: "Capital?".to_string(),
            answer: "Manila".to_string(),
        }]);
        assert_eq!(render_items(&items, false), "1. Capital?\n   Manila");
        assert_eq!(render_items(&GeneratedItems::Flashcards(vec![]), false), "(no items)");
    }

    #[test]
    fn test_render_schedule() {
        let schedule = ReviewSchedule {
            ease_factor: 2.6,
            interval_days: 15,
            next_review_at: Utc.with_ymd_and_hms(2025, 3, 16, 8, 0, 0).unwrap(),
        };
        let text = render_schedule(&schedule, false);
        assert!(text.contains("Ease factor:  2.60"));
        assert!(text.contains("(15 days)"));
        assert!(text.contains("2025-03-16 08:00 UTC"));
    }

    #[test]
    fn test_wrap_lines() {
        let lines = wrap_lines("one two three four", "  ", 12);
        assert_eq!(lines, vec!["  one two", "  three four"]);
    }
}
