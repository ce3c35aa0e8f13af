use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    prelude::Stylize,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::time::SystemTime;

use crate::app::{App, View};
use crate::git::{Glyph, RepoState, RepoStatus, Tracking};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    let title_text = format!("gitpulse    {}", app.config.base_dir.display());
    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(title, chunks[0]);

    match app.view {
        View::Overview => draw_overview(f, app, chunks[1]),
        View::Detail => draw_detail(f, app, chunks[1]),
    }

    let footer_text = match app.view {
        View::Overview => "q quit   r refresh   f fetch   g GitHub Desktop   j/k move   Enter detail",
        View::Detail => "q quit   r refresh   f fetch   g GitHub Desktop   Esc back",
    };
    let mut footer_lines = Vec::new();
    if let Some(msg) = &app.last_message {
        footer_lines.push(Line::from(msg.clone().fg(Color::Yellow)));
    }
    footer_lines.push(Line::from(footer_text.fg(Color::Gray)));
    let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn draw_overview(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let lines: Vec<Line> = if app.repos.is_empty() {
        vec![Line::from("No repositories to show.")]
    } else {
        app.repos
            .iter()
            .enumerate()
            .map(|(i, repo)| overview_line(repo, i == app.selected))
            .collect()
    };

    let list = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Repositories"))
        .style(Style::default().fg(Color::White));
    f.render_widget(list, area);
}

fn overview_line(repo: &RepoStatus, selected: bool) -> Line<'static> {
    let marker = if selected { "▶ " } else { "  " };
    let glyph = repo.glyph();
    let mut spans = vec![
        Span::raw(marker.to_string()),
        Span::styled(glyph.symbol(), Style::default().fg(glyph_color(glyph))),
        Span::raw(format!(" {}", repo.name)),
    ];

    match &repo.state {
        RepoState::Unavailable { reason } => {
            spans.push(Span::styled(
                format!("  {reason}"),
                Style::default().fg(Color::Red),
            ));
        }
        RepoState::Available(info) => {
            let (color, bold) = branch_color(&info.branch);
            let mut style = Style::default().fg(color);
            if bold {
                style = style.add_modifier(Modifier::BOLD);
            }
            spans.push(Span::raw(" ("));
            spans.push(Span::styled(info.branch.clone(), style));
            match &info.tracking {
                Tracking::Known { ahead, behind, .. } => {
                    if *ahead > 0 {
                        spans.push(Span::raw(format!(" ↑{ahead}")));
                    }
                    if *behind > 0 {
                        spans.push(Span::raw(format!(" ↓{behind}")));
                    }
                }
                Tracking::None => spans.push(Span::raw(" no upstream")),
                Tracking::Unknown { .. } => spans.push(Span::raw(" ↕?")),
            }
            spans.push(Span::raw(")"));
            if info.dirty > 0 {
                spans.push(Span::styled(
                    format!(" ~{}", info.dirty),
                    Style::default().fg(Color::Red),
                ));
            }
        }
    }

    let line = Line::from(spans);
    if selected { line.bold() } else { line }
}

fn draw_detail(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(repo) = app.selected_repo() else {
        let empty = Paragraph::new("No repository selected.")
            .block(Block::default().borders(Borders::ALL).title("Detail"));
        f.render_widget(empty, area);
        return;
    };

    let mut lines = vec![Line::from(format!("Repo: {}", repo.path.display()))];

    match &repo.state {
        RepoState::Unavailable { reason } => {
            lines.push(Line::from(""));
            lines.push(Line::from(
                Span::styled(reason.clone(), Style::default().fg(Color::Red))
                    .add_modifier(Modifier::BOLD),
            ));
        }
        RepoState::Available(info) => {
            lines.push(Line::from(format!("Branch: {}", info.branch)));
            let upstream = match &info.tracking {
                Tracking::None => "(none set)".to_string(),
                Tracking::Known { upstream, .. } | Tracking::Unknown { upstream, .. } => {
                    upstream.clone()
                }
            };
            lines.push(Line::from(format!("Upstream: {upstream}")));
            lines.push(Line::from(""));

            match &info.tracking {
                Tracking::Known { ahead, behind, .. } => {
                    lines.push(pending_line("Pending push", *ahead, "ahead", Color::Yellow));
                    lines.push(pending_line("Pending pull", *behind, "behind", Color::Red));
                }
                Tracking::None => {
                    lines.push(Line::from(
                        "No upstream configured; nothing to push or pull against."
                            .fg(Color::DarkGray),
                    ));
                }
                Tracking::Unknown { error, .. } => {
                    lines.push(Line::from(
                        Span::styled(
                            format!("Divergence unknown: {error}"),
                            Style::default().fg(Color::Red),
                        )
                        .add_modifier(Modifier::BOLD),
                    ));
                }
            }

            let tree_style = if info.dirty > 0 {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green)
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "Working tree: {}  ({} modified, {} untracked)",
                    if info.dirty > 0 { "DIRTY" } else { "clean" },
                    info.dirty,
                    info.untracked
                ),
                tree_style,
            )));
            lines.push(Line::from(format!("Stashes: {}", info.stashes)));

            if let Some(err) = &info.fetch_error {
                lines.push(Line::from(""));
                lines.push(Line::from(
                    format!("Fetch: {err}").fg(Color::DarkGray),
                ));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(
        format!("Last update: {}", format_time(repo.updated_at)).fg(Color::DarkGray),
    ));

    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(repo.name.clone()))
        .style(Style::default().fg(Color::White));
    f.render_widget(detail, area);
}

fn pending_line(label: &str, count: usize, word: &str, warn: Color) -> Line<'static> {
    let style = if count > 0 {
        Style::default().fg(warn).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };
    Line::from(Span::styled(
        format!(
            "{label}: {}  ({word} {count})",
            if count > 0 { "YES" } else { "no" }
        ),
        style,
    ))
}

fn format_time(t: SystemTime) -> String {
    let dt: DateTime<Local> = t.into();
    dt.format("%H:%M:%S").to_string()
}

fn glyph_color(glyph: Glyph) -> Color {
    match glyph {
        Glyph::Failed => Color::Red,
        Glyph::Modified => Color::Red,
        Glyph::NoUpstream => Color::DarkGray,
        Glyph::Diverged => Color::Magenta,
        Glyph::Behind => Color::Red,
        Glyph::Ahead => Color::Yellow,
        Glyph::Clean => Color::Green,
    }
}

/// main/master render bold green; other branches get a stable color derived
/// from a name hash so the same branch looks the same everywhere.
fn branch_color(branch_name: &str) -> (Color, bool) {
    if branch_name == "main" || branch_name == "master" {
        return (Color::Green, true);
    }

    let mut hash: u32 = 0;
    for byte in branch_name.bytes() {
        hash = hash.wrapping_mul(31).wrapping_add(byte as u32);
    }

    // Red is reserved for trouble.
    let colors = [
        Color::Cyan,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::LightCyan,
        Color::LightYellow,
        Color::LightBlue,
        Color::LightMagenta,
    ];

    (colors[(hash % colors.len() as u32) as usize], false)
}
