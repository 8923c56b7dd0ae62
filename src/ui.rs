pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Screen};
use crate::classify::celebrates;
use crate::clock::Clock;
use crate::session::{CharState, SessionState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen() {
            Screen::Typing => render_typing(self, area, buf),
            Screen::Results => render_results(self, area, buf),
            Screen::History => history::render_history(self.history(), area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn render_typing<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let session = app.session();
    let reference = session.reference();

    let dim_bold_style = bold().add_modifier(Modifier::DIM);
    let green_bold_style = bold().fg(Color::Green);
    let red_bold_style = bold().fg(Color::Red);
    let underlined_dim_bold_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_width = reference.as_str().width();
    let prompt_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        (prompt_width as f64 / max_chars_per_line as f64).ceil() as u16 + 1
    };
    let padding = area.height.saturating_sub(prompt_lines + 6) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(1), // settings
            Constraint::Length(1), // live stats
            Constraint::Length(1), // progress
            Constraint::Length(1),
            Constraint::Length(prompt_lines),
            Constraint::Length(1), // warning
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let settings = Paragraph::new(Span::styled(
        format!(
            "{} · {}s",
            session.config().difficulty(),
            session.config().duration_secs()
        ),
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    settings.render(chunks[1], buf);

    let live = app.view.live;
    let stats = Paragraph::new(Line::from(vec![
        Span::styled(format!("{}s   ", live.time_remaining), bold()),
        Span::styled(format!("{} wpm", live.wpm), bold().fg(wpm_color(live.wpm))),
        Span::raw("   "),
        Span::styled(
            format!("{}% acc", live.accuracy),
            bold().fg(accuracy_color(live.accuracy)),
        ),
    ]))
    .alignment(Alignment::Center);
    stats.render(chunks[2], buf);

    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(session.progress())
        .label("")
        .render(chunks[3], buf);

    let typed: Vec<char> = session.typed().chars().collect();
    let spans = reference
        .chars()
        .iter()
        .enumerate()
        .map(|(idx, expected)| match session.char_state(idx) {
            CharState::Correct => Span::styled(expected.to_string(), green_bold_style),
            CharState::Incorrect => Span::styled(
                match typed.get(idx) {
                    Some(' ') => "·".to_owned(),
                    Some(c) => c.to_string(),
                    None => expected.to_string(),
                },
                red_bold_style,
            ),
            CharState::Current if session.is_running() => {
                Span::styled(expected.to_string(), underlined_dim_bold_style)
            }
            CharState::Current | CharState::Pending => {
                Span::styled(expected.to_string(), dim_bold_style)
            }
        })
        .collect::<Vec<Span>>();

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[5], buf);

    if let Some(warning) = app.view.active_warning() {
        Paragraph::new(Span::styled(warning.to_string(), bold().fg(Color::Red)))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
    }

    let legend = match session.state() {
        SessionState::Running => "(esc) reset",
        SessionState::Idle | SessionState::Finished => {
            "(enter) start / (tab) new text / (d)ifficulty / (t)ime / (h)istory / (q)uit"
        }
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[8], buf);
}

fn render_results<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // headline
            Constraint::Length(1), // details
            Constraint::Length(1), // rating
            Constraint::Length(1), // banner
            Constraint::Length(1), // warning
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    if let Some(result) = app.view.last_result.as_ref() {
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} wpm", result.wpm), bold().fg(wpm_color(result.wpm))),
            Span::raw("   "),
            Span::styled(
                format!("{}% acc", result.accuracy),
                bold().fg(accuracy_color(result.accuracy)),
            ),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            format!(
                "{}s   {} chars   {} · {}s",
                result.elapsed_display_secs(),
                result.total_chars,
                result.difficulty,
                result.duration_secs
            ),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        if let Some(rating) = app.rating() {
            Paragraph::new(Span::styled(
                format!("rating: {rating}"),
                bold().fg(Color::Cyan),
            ))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
        }

        if celebrates(result) {
            Paragraph::new(Span::styled(
                "✨ great run! ✨",
                bold().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
        }
    }

    if let Some(warning) = app.view.active_warning() {
        Paragraph::new(Span::styled(warning.to_string(), bold().fg(Color::Red)))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (s)hare / (h)istory / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[7], buf);
}

fn wpm_color(wpm: u32) -> Color {
    if wpm >= 40 {
        Color::Green
    } else if wpm >= 20 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub(crate) fn accuracy_color(accuracy: u32) -> Color {
    if accuracy >= 95 {
        Color::Green
    } else if accuracy >= 85 {
        Color::Yellow
    } else {
        Color::Red
    }
}
