use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::history::{HistoryLog, HistorySummary};
use crate::stats::SessionResult;
use crate::ui::accuracy_color;

/// "3 hours ago" style age of a result
pub fn format_age(recorded_at: DateTime<Local>, now: DateTime<Local>) -> String {
    let age = (now - recorded_at).to_std().unwrap_or_default();
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}

pub fn present_row(result: &SessionResult, now: DateTime<Local>) -> Row<'static> {
    Row::new(vec![
        Cell::from(format_age(result.recorded_at, now)),
        Cell::from(result.wpm.to_string()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{}%", result.accuracy)).style(Style::default().fg(accuracy_color(result.accuracy))),
        Cell::from(format!("{}s", result.elapsed_display_secs())),
        Cell::from(result.total_chars.to_string()),
        Cell::from(format!("{} · {}s", result.difficulty, result.duration_secs)),
    ])
}

pub fn summary_line(results: &HistoryLog) -> String {
    match HistorySummary::from_results(results) {
        Some(s) => format!(
            "{} sessions   best {} wpm   avg {:.0} wpm   avg {:.0}% acc",
            s.sessions, s.best_wpm, s.avg_wpm, s.avg_accuracy
        ),
        None => "no sessions yet".to_string(),
    }
}

/// Render the recent results table, newest first
pub fn render_history(results: &HistoryLog, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // summary
            Constraint::Min(0),    // table
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(summary_line(results))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if !results.is_empty() {
        let now = Local::now();
        let rows: Vec<Row> = results.iter().rev().map(|r| present_row(r, now)).collect();

        let header = Row::new(vec!["When", "WPM", "Acc", "Time", "Chars", "Test"])
            .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

        Table::new(
            rows,
            [
                Constraint::Length(16),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Length(6),
                Constraint::Min(12),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL))
        .render(chunks[1], buf);
    }

    Paragraph::new("(esc) back")
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .render(chunks[2], buf);
}
