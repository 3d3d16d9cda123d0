use chrono::{DateTime, Utc};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::app::{App, Focus, marker_label};
use crate::keybinds::help_line;
use crate::theme::{ThemePalette, resolve_theme};

const GRID_STEP_X: u16 = 8;
const GRID_STEP_Y: u16 = 4;
const MARKER_GLYPH: &str = "◆";

pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    draw_at(frame, app, Utc::now());
}

pub fn draw_at(frame: &mut Frame<'_>, app: &mut App, now: DateTime<Utc>) {
    let theme = resolve_theme(app.theme_name());
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg_app)), area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(frame, app, sections[0], theme);
    let canvas = draw_canvas(frame, app, sections[1], theme);

    // Dialogs may cover the header and the canvas border, never the footer.
    let surface = Rect::new(
        area.x,
        area.y,
        area.width,
        sections[0].height + sections[1].height,
    );
    app.set_viewport(surface, canvas);
    draw_markers(frame, app, canvas, theme);
    app.render_dialogs(frame, theme, now);

    draw_footer(frame, app, sections[2], theme);
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect, theme: &ThemePalette) {
    let total = app.issues().iter().filter(|issue| issue.id.is_created()).count();
    let resolved = app.issues().iter().filter(|issue| issue.resolved).count();
    let open_dialogs = app.board().stack().len();
    let line = Line::from(vec![
        Span::styled(
            " pinboard ",
            Style::default()
                .fg(theme.accent_primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} issues", total),
            Style::default().fg(theme.text_primary),
        ),
        Span::styled(
            format!("  {} open", total.saturating_sub(resolved)),
            Style::default().fg(theme.marker_open),
        ),
        Span::styled(
            format!("  {} resolved", resolved),
            Style::default().fg(theme.marker_resolved),
        ),
        Span::styled(
            format!(
                "  {} dialogs{}",
                open_dialogs,
                if app.show_resolved() {
                    ""
                } else {
                    "  (resolved hidden)"
                }
            ),
            Style::default().fg(theme.text_muted),
        ),
        Span::styled(
            if app.is_saving() { "  saving…" } else { "" },
            Style::default().fg(theme.text_muted),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draws the canvas panel and returns its content area.
fn draw_canvas(frame: &mut Frame<'_>, app: &App, area: Rect, theme: &ThemePalette) -> Rect {
    let border = if app.focus() == Focus::Canvas {
        theme.border_focus
    } else {
        theme.border_panel
    };
    let block = Block::default()
        .title(Line::from(Span::styled(
            " Canvas ",
            Style::default()
                .fg(theme.accent_primary)
                .add_modifier(Modifier::BOLD),
        )))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.bg_canvas).fg(theme.text_muted));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

fn draw_markers(frame: &mut Frame<'_>, app: &App, canvas: Rect, theme: &ThemePalette) {
    let board = app.board();
    if canvas.width == 0 || canvas.height == 0 {
        return;
    }

    for row in 0..canvas.height {
        for column in 0..canvas.width {
            let Some(anchor) = board.to_canvas(canvas.x + column, canvas.y + row) else {
                continue;
            };
            if anchor.left % GRID_STEP_X == 0 && anchor.top % GRID_STEP_Y == 0 {
                frame.render_widget(
                    Paragraph::new(Span::styled("·", Style::default().fg(theme.border_panel))),
                    Rect::new(canvas.x + column, canvas.y + row, 1, 1),
                );
            }
        }
    }

    for issue in app.visible_markers() {
        let Some(at) = board.to_screen(issue.position) else {
            continue;
        };
        if at.x >= canvas.right() || at.y >= canvas.bottom() {
            continue;
        }
        let color = if issue.resolved {
            theme.marker_resolved
        } else {
            theme.marker_open
        };
        let mut style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        if app.board().stack().contains(&issue.id) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        let text = format!("{}{}", MARKER_GLYPH, marker_label(issue.id));
        let width = (text.chars().count() as u16).min(canvas.right() - at.x);
        frame.render_widget(
            Paragraph::new(Span::styled(text, style)),
            Rect::new(at.x, at.y, width, 1),
        );
    }

    if let Some(at) = board.to_screen(app.cursor())
        && at.x < canvas.right()
        && at.y < canvas.bottom()
    {
        let style = if app.focus() == Focus::Canvas {
            Style::default()
                .fg(theme.bg_canvas)
                .bg(theme.cursor)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.cursor)
        };
        let glyph = match app.issue_at(app.cursor()) {
            Some(_) => MARKER_GLYPH,
            None => "+",
        };
        frame.render_widget(
            Paragraph::new(Span::styled(glyph, style)),
            Rect::new(at.x, at.y, 1, 1),
        );
    }
}

fn draw_footer(frame: &mut Frame<'_>, app: &App, area: Rect, theme: &ThemePalette) {
    let text = if !app.status().is_empty() {
        app.status().to_string()
    } else if app.focus() == Focus::Dialogs {
        "enter send · ctrl+r resolve/reopen · esc collapse · tab cycle · ctrl+o canvas".to_string()
    } else {
        help_line()
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", text),
            Style::default().fg(theme.text_muted),
        ))),
        area,
    );
}
