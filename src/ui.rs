use std::time::Duration;

use ratatui::{prelude::*, widgets::*};

use crate::alert::Alert;
use crate::app::{App, HistoryPanel, Notice, NoticeKind};
use crate::timer::Phase;

const WORK_COLOR: Color = Color::Rgb(100, 181, 246);
const BREAK_COLOR: Color = Color::Rgb(0, 255, 150);
const BORDER_COLOR: Color = Color::Rgb(0, 200, 255);
const ACCENT_COLOR: Color = Color::Rgb(255, 100, 0);

// 3x5 block font for the countdown.
const GLYPH_HEIGHT: usize = 5;
const DIGITS: [[&str; GLYPH_HEIGHT]; 10] = [
    ["###", "#.#", "#.#", "#.#", "###"],
    ["..#", "..#", "..#", "..#", "..#"],
    ["###", "..#", "###", "#..", "###"],
    ["###", "..#", "###", "..#", "###"],
    ["#.#", "#.#", "###", "..#", "..#"],
    ["###", "#..", "###", "..#", "###"],
    ["###", "#..", "###", "#.#", "###"],
    ["###", "..#", "..#", "..#", "..#"],
    ["###", "#.#", "###", "#.#", "###"],
    ["###", "#.#", "###", "..#", "###"],
];
const COLON: [&str; GLYPH_HEIGHT] = [".", "#", ".", "#", "."];

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Work => WORK_COLOR,
        Phase::Break => BREAK_COLOR,
    }
}

pub fn format_time(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Renders `text` in the block font. Each font pixel is `2 * scale` cells
/// wide and `scale` rows tall; unknown characters are skipped.
pub fn big_text(text: &str, scale: u16) -> Vec<String> {
    let scale = scale.max(1) as usize;
    let glyphs: Vec<&[&str; GLYPH_HEIGHT]> = text
        .chars()
        .filter_map(|c| match c {
            ':' => Some(&COLON),
            _ => c.to_digit(10).map(|d| &DIGITS[d as usize]),
        })
        .collect();

    let mut rows = Vec::with_capacity(GLYPH_HEIGHT * scale);
    for y in 0..GLYPH_HEIGHT {
        let mut row = String::new();
        for (i, glyph) in glyphs.iter().enumerate() {
            if i > 0 {
                row.push_str(&" ".repeat(scale));
            }
            for px in glyph[y].chars() {
                let cell = if px == '#' { "█" } else { " " };
                row.push_str(&cell.repeat(2 * scale));
            }
        }
        for _ in 0..scale {
            rows.push(row.clone());
        }
    }
    rows
}

// ============================================================================
// UI Rendering
// ============================================================================

pub fn render<A: Alert>(f: &mut Frame, app: &App<A>) {
    render_timer(f, app);

    if let Some(panel) = &app.history {
        render_history(f, panel);
    }
    if let Some(notice) = &app.notice {
        render_notice(f, notice);
    }
}

fn render_timer<A: Alert>(f: &mut Frame, app: &App<A>) {
    let state = app.timer();
    let color = phase_color(state.phase);
    let digits = big_text(&format_time(state.remaining), app.scale);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    let header = Paragraph::new(Line::from(Span::styled(
        app.message.as_str(),
        Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
    )))
    .alignment(Alignment::Center)
    .block(Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(Span::styled(" 🍅 RELÓGIO POMODORO ", Style::default()
            .fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))));
    f.render_widget(header, chunks[0]);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(digits.len() as u16), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(chunks[1]);

    f.render_widget(
        Paragraph::new(state.phase.name())
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[1]
    );

    let digit_lines: Vec<Line> = digits.into_iter().map(Line::from).collect();
    f.render_widget(
        Paragraph::new(digit_lines)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[3]
    );

    let (status, status_color) = match (state.running, state.paused) {
        (_, true) => ("⏸  PAUSED", Color::Yellow),
        (true, false) => ("● RUNNING", Color::Green),
        (false, false) => ("■ STOPPED", Color::DarkGray),
    };
    f.render_widget(
        Paragraph::new(status)
            .style(Style::default().fg(status_color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[5]
    );

    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .percent((state.progress_ratio() * 100.0) as u16),
        sections[7]
    );

    let controls = vec![
        Line::from(vec![
            span_key("S"), Span::raw(" Start  •  "),
            span_key("Space"), Span::raw(" Pause/Resume  •  "),
            span_key("R"), Span::raw(" Reset"),
        ]),
        Line::from(vec![
            span_key("+/-"), Span::raw(" Size  •  "),
            span_key("H"), Span::raw(" History  •  "),
            span_key("Q"), Span::raw(" Quit"),
        ]),
    ];
    f.render_widget(
        Paragraph::new(controls).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        chunks[2]
    );
}

fn span_key(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD))
}

fn render_history(f: &mut Frame, panel: &HistoryPanel) {
    let area = centered_rect(70, 80, f.size());

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {} cycles completed today  •  {} in total", panel.today, panel.lines.len()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled("  ↑↓/jk: Scroll  •  H/Esc: Close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
        Line::from(""),
    ];
    lines.extend(panel.lines.iter().map(|l| Line::from(format!("  {l}"))));

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .scroll((panel.scroll, 0))
            .block(Block::default()
                .title(" Study History ")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR))),
        area
    );
}

fn render_notice(f: &mut Frame, notice: &Notice) {
    let area = centered_rect(60, 30, f.size());
    let color = match notice.kind {
        NoticeKind::Warning => Color::Yellow,
        NoticeKind::Error => Color::Red,
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(notice.body.as_str(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled("Press Esc or Enter to dismiss",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
    ];

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default()
                .title(format!(" {} ", notice.title))
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color))),
        area
    );
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}
