use std::mem;

use chrono::{DateTime, Utc};
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tracing::{debug, info};

use crate::board::AttachmentBoard;
use crate::issue::{AnchorPosition, CommentEntry, IssueId};
use crate::theme::ThemePalette;
use crate::time_label::{absolute_label, relative_label};

pub const DIALOG_WIDTH: u16 = 44;
const CHAT_MAX_LINES: usize = 12;
const INPUT_PLACEHOLDER: &str = "Print a comment here..";
const COLLAPSE_LABEL: &str = "[x]";
const COLLAPSE_TOOLTIP: &str = "Collapse the chat";
const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];
const TAB_SPACES: &str = "    ";

/// Outbound requests of an issue dialog. Every call is fire-and-forget.
pub trait DialogCallbacks {
    fn collapse(&mut self);
    fn resolve(&mut self);
    fn reopen(&mut self);
    /// `text` is never empty.
    fn submit_comment(&mut self, text: &str);
}

/// Canvas-side state a dialog may ask the host to change. The host owns
/// marker visibility and stacking order.
pub trait BoardHost {
    fn reveal_marker(&mut self, id: IssueId);
    fn bring_to_front(&mut self, id: IssueId);
}

#[derive(Debug, Clone, Copy)]
pub struct IssueDialogProps<'a> {
    pub id: IssueId,
    pub comments: &'a [CommentEntry],
    pub position: AnchorPosition,
    pub resolved: bool,
    pub is_fetching: bool,
    /// Render instant, used for relative times and for comments without a
    /// creation date.
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterButton {
    Comment,
    Resolve,
    Reopen,
}

impl FooterButton {
    pub fn label(self) -> &'static str {
        match self {
            FooterButton::Comment => "Comment",
            FooterButton::Resolve => "Resolve",
            FooterButton::Reopen => "Reopen",
        }
    }
}

pub fn header_title(id: IssueId) -> String {
    if id.is_created() {
        return format!("Issue #{}", id);
    }
    "New Issue".to_string()
}

pub fn footer_button(draft: &str, resolved: bool) -> FooterButton {
    if !draft.is_empty() {
        return FooterButton::Comment;
    }
    if resolved {
        FooterButton::Reopen
    } else {
        FooterButton::Resolve
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    pub author: String,
    pub message: String,
    pub relative: String,
    pub absolute: String,
}

pub fn comment_lines(comments: &[CommentEntry], now: DateTime<Utc>) -> Vec<CommentLine> {
    comments
        .iter()
        .map(|comment| {
            let created = comment.created_date.unwrap_or(now);
            CommentLine {
                author: comment.author_label().to_string(),
                message: comment.message.clone(),
                relative: relative_label(created, now),
                absolute: absolute_label(created),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogTarget {
    Collapse,
    Chat,
    TimeLabel(usize),
    Input,
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DialogRegion {
    target: DialogTarget,
    area: Rect,
}

struct ChatRow<'a> {
    line: Line<'a>,
    time_label: Option<(usize, u16)>,
}

/// Floating panel showing one issue thread.
///
/// The only state owned here is the draft comment; everything else comes in
/// through [`IssueDialogProps`] on every call.
#[derive(Debug)]
pub struct IssueDialog {
    id: IssueId,
    draft: String,
    mounted: bool,
    chat_scroll: usize,
    hover: Option<DialogTarget>,
    regions: Vec<DialogRegion>,
}

impl IssueDialog {
    pub fn new(id: IssueId) -> Self {
        Self {
            id,
            draft: String::new(),
            mounted: false,
            chat_scroll: 0,
            hover: None,
            regions: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> IssueId {
        self.id
    }

    #[cfg(test)]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[cfg(test)]
    pub fn hover(&self) -> Option<DialogTarget> {
        self.hover
    }

    pub fn mount(&mut self, board: &mut AttachmentBoard, host: &mut impl BoardHost) {
        if self.mounted {
            return;
        }
        host.reveal_marker(self.id);
        board.add_enter_listener(self.id);
        self.mounted = true;
        debug!(issue = %self.id, "dialog mounted");
    }

    /// Drops the pointer-enter listener. The marker stays as the host left it.
    pub fn unmount(&mut self, board: &mut AttachmentBoard) {
        if !self.mounted {
            return;
        }
        board.remove_enter_listener(self.id);
        self.mounted = false;
        self.hover = None;
        self.regions.clear();
        debug!(issue = %self.id, "dialog unmounted");
    }

    pub fn on_pointer_enter(&self, host: &mut impl BoardHost) {
        if self.mounted {
            host.bring_to_front(self.id);
        }
    }

    /// Returns whether the key was consumed.
    pub fn on_key(
        &mut self,
        key: KeyEvent,
        props: &IssueDialogProps<'_>,
        callbacks: &mut impl DialogCallbacks,
    ) -> bool {
        match key.code {
            KeyCode::Esc => callbacks.collapse(),
            KeyCode::Enter => self.submit(callbacks),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.press_footer(props, callbacks);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.draft.clear();
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.draft.push(ch);
            }
            KeyCode::Backspace => {
                self.draft.pop();
            }
            KeyCode::Up | KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(1);
            }
            KeyCode::Down | KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(1);
            }
            _ => return false,
        }
        true
    }

    pub fn on_mouse(
        &mut self,
        event: MouseEvent,
        props: &IssueDialogProps<'_>,
        callbacks: &mut impl DialogCallbacks,
    ) {
        let target = self.target_at(event.column, event.row);
        match event.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.hover = target;
            }
            MouseEventKind::Down(MouseButton::Left) => match target {
                Some(DialogTarget::Collapse) => callbacks.collapse(),
                Some(DialogTarget::Footer) => self.press_footer(props, callbacks),
                _ => {}
            },
            MouseEventKind::ScrollUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(1);
            }
            MouseEventKind::ScrollDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(1);
            }
            _ => {}
        }
    }

    pub fn clear_hover(&mut self) {
        self.hover = None;
    }

    pub fn target_at(&self, column: u16, row: u16) -> Option<DialogTarget> {
        let position = Position { x: column, y: row };
        self.regions
            .iter()
            .rev()
            .find(|region| region.area.contains(position))
            .map(|region| region.target)
    }

    fn submit(&mut self, callbacks: &mut impl DialogCallbacks) {
        if self.draft.is_empty() {
            return;
        }
        let text = mem::take(&mut self.draft);
        info!(issue = %self.id, chars = text.chars().count(), "comment submitted");
        callbacks.submit_comment(&text);
    }

    /// Buttons ignore presses while a request is in flight.
    fn press_footer(&mut self, props: &IssueDialogProps<'_>, callbacks: &mut impl DialogCallbacks) {
        if props.is_fetching {
            return;
        }
        match footer_button(&self.draft, props.resolved) {
            FooterButton::Comment => self.submit(callbacks),
            FooterButton::Resolve => callbacks.resolve(),
            FooterButton::Reopen => callbacks.reopen(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame<'_>,
        board: &mut AttachmentBoard,
        props: &IssueDialogProps<'_>,
        theme: &ThemePalette,
        focused: bool,
    ) {
        self.regions.clear();
        let inner_width = DIALOG_WIDTH.saturating_sub(2) as usize;
        let lines = comment_lines(props.comments, props.now);
        let rows = chat_rows(&lines, inner_width, theme);

        let max_scroll = rows.len().saturating_sub(CHAT_MAX_LINES);
        self.chat_scroll = self.chat_scroll.min(max_scroll);
        let end = rows.len() - self.chat_scroll;
        let start = end.saturating_sub(CHAT_MAX_LINES);
        let chat_height = (end - start) as u16;

        let height = chat_height + 5;
        let Some(area) = board.place(props.position, DIALOG_WIDTH, height) else {
            board.record_bounds(self.id, None);
            return;
        };
        board.record_bounds(self.id, Some(area));

        let border = if focused {
            theme.border_focus
        } else {
            theme.border_panel
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(if focused {
                BorderType::Thick
            } else {
                BorderType::Rounded
            })
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(theme.bg_dialog).fg(theme.text_primary));
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height < 3 {
            return;
        }

        let header = Rect::new(inner.x, inner.y, inner.width, 1);
        let title = header_title(props.id);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                title,
                Style::default()
                    .fg(theme.accent_primary)
                    .add_modifier(Modifier::BOLD),
            ))),
            header,
        );
        let collapse_width = COLLAPSE_LABEL.chars().count() as u16;
        let collapse = Rect::new(
            header.right().saturating_sub(collapse_width),
            header.y,
            collapse_width.min(header.width),
            1,
        );
        let collapse_style = if self.hover == Some(DialogTarget::Collapse) {
            Style::default().fg(theme.marker_open).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_muted)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(COLLAPSE_LABEL, collapse_style)),
            collapse,
        );
        self.push_region(DialogTarget::Collapse, collapse);

        let chat = Rect::new(
            inner.x,
            header.bottom(),
            inner.width,
            chat_height.min(inner.height.saturating_sub(3)),
        );
        self.push_region(DialogTarget::Chat, chat);
        let mut time_labels = Vec::new();
        for (offset, row) in rows.into_iter().skip(start).take(end - start).enumerate() {
            let y = chat.y + offset as u16;
            if y >= chat.bottom() {
                break;
            }
            if let Some((index, width)) = row.time_label {
                let label = Rect::new(chat.x, y, width.min(chat.width), 1);
                self.push_region(DialogTarget::TimeLabel(index), label);
                time_labels.push((index, label));
            }
            frame.render_widget(Paragraph::new(row.line), Rect::new(chat.x, y, chat.width, 1));
        }

        let input = Rect::new(inner.x, chat.bottom(), inner.width, 1);
        let visible_width = input.width.saturating_sub(2) as usize;
        let input_line = if self.draft.is_empty() {
            Line::from(vec![
                Span::raw(" "),
                Span::styled(INPUT_PLACEHOLDER, Style::default().fg(theme.text_muted)),
            ])
        } else {
            Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    tail_fit(&self.draft, visible_width),
                    Style::default().fg(theme.text_primary),
                ),
            ])
        };
        frame.render_widget(
            Paragraph::new(input_line).style(Style::default().bg(theme.bg_input)),
            input,
        );
        self.push_region(DialogTarget::Input, input);
        if focused {
            let typed = tail_fit(&self.draft, visible_width).chars().count() as u16;
            let cursor_x = input
                .x
                .saturating_add(1 + typed)
                .min(input.right().saturating_sub(1));
            frame.set_cursor_position((cursor_x, input.y));
        }

        let footer = Rect::new(inner.x, input.bottom(), inner.width, 1);
        let button = footer_button(&self.draft, props.resolved);
        let label = if props.is_fetching {
            let frame_index =
                (props.now.timestamp_subsec_millis() / 100) as usize % SPINNER_FRAMES.len();
            format!("[ {} {} ]", SPINNER_FRAMES[frame_index], button.label())
        } else {
            format!("[ {} ]", button.label())
        };
        let label_width = (label.chars().count() as u16).min(footer.width);
        let button_area = Rect::new(
            footer.right().saturating_sub(label_width),
            footer.y,
            label_width,
            1,
        );
        let mut button_style = Style::default()
            .fg(theme.bg_dialog)
            .bg(theme.accent_primary)
            .add_modifier(Modifier::BOLD);
        if self.hover == Some(DialogTarget::Footer) && !props.is_fetching {
            button_style = button_style.bg(theme.accent_subtle);
        }
        frame.render_widget(Paragraph::new(Span::styled(label, button_style)), button_area);
        self.push_region(DialogTarget::Footer, button_area);

        match self.hover {
            Some(DialogTarget::TimeLabel(index)) => {
                if let Some((_, label)) = time_labels.iter().find(|(entry, _)| *entry == index)
                    && let Some(line) = lines.get(index)
                {
                    draw_tooltip(frame, board.surface(), *label, &line.absolute, theme);
                }
            }
            Some(DialogTarget::Collapse) => {
                draw_tooltip(frame, board.surface(), collapse, COLLAPSE_TOOLTIP, theme);
            }
            _ => {}
        }
    }

    fn push_region(&mut self, target: DialogTarget, area: Rect) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.regions.push(DialogRegion { target, area });
    }
}

fn chat_rows<'a>(lines: &[CommentLine], width: usize, theme: &ThemePalette) -> Vec<ChatRow<'a>> {
    let mut rows = Vec::new();
    for (index, comment) in lines.iter().enumerate() {
        let prefix = format!("{}:", comment.author);
        let text = format!("{} {}", prefix, comment.message);
        for (line_index, chunk) in wrap_text(&text, width).into_iter().enumerate() {
            let line = if line_index == 0 && chunk.starts_with(&prefix) {
                let rest = chunk[prefix.len()..].to_string();
                Line::from(vec![
                    Span::styled(
                        prefix.clone(),
                        Style::default()
                            .fg(theme.accent_subtle)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(rest),
                ])
            } else {
                Line::from(chunk)
            };
            rows.push(ChatRow {
                line,
                time_label: None,
            });
        }
        let relative_width = comment.relative.chars().count() as u16;
        rows.push(ChatRow {
            line: Line::from(Span::styled(
                comment.relative.clone(),
                Style::default().fg(theme.text_muted),
            )),
            time_label: Some((index, relative_width)),
        });
    }
    rows
}

fn draw_tooltip(frame: &mut Frame<'_>, surface: Rect, anchor: Rect, text: &str, theme: &ThemePalette) {
    let width = (text.chars().count() as u16).saturating_add(2).min(surface.width);
    if width == 0 || surface.height == 0 {
        return;
    }
    let y = if anchor.y > surface.y {
        anchor.y - 1
    } else {
        anchor.y.saturating_add(1)
    };
    if y >= surface.bottom() {
        return;
    }
    let x = anchor
        .x
        .min(surface.right().saturating_sub(width))
        .max(surface.x);
    let area = Rect::new(x, y, width, 1);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(format!(" {} ", text))
            .style(Style::default().bg(theme.bg_tooltip).fg(theme.text_primary)),
        area,
    );
}

/// Wraps `text` to `width` columns. Hard line breaks and runs of spaces are
/// kept; a soft break consumes the whitespace it lands on.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    for hard_line in text.lines() {
        wrap_line(&hard_line.replace('\t', TAB_SPACES), width, &mut lines);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    let first = out.len();
    let mut current = String::new();
    let mut current_width = 0usize;
    for run in whitespace_runs(line) {
        let run_width = run.chars().count();
        if current_width + run_width <= width {
            current.push_str(run);
            current_width += run_width;
            continue;
        }
        if current_width > 0 {
            out.push(mem::take(&mut current));
            current_width = 0;
        }
        if run.starts_with(char::is_whitespace) {
            continue;
        }
        let chars = run.chars().collect::<Vec<_>>();
        for chunk in chars.chunks(width) {
            if chunk.len() == width {
                out.push(chunk.iter().collect());
            } else {
                current = chunk.iter().collect();
                current_width = chunk.len();
            }
        }
    }
    if !current.is_empty() || out.len() == first {
        out.push(current);
    }
}

/// Splits `line` into maximal runs of whitespace and non-whitespace.
fn whitespace_runs(line: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut previous_blank = None;
    for (index, ch) in line.char_indices() {
        let blank = ch.is_whitespace();
        if previous_blank.is_some_and(|previous| previous != blank) {
            runs.push(&line[start..index]);
            start = index;
        }
        previous_blank = Some(blank);
    }
    if start < line.len() {
        runs.push(&line[start..]);
    }
    runs
}

fn tail_fit(value: &str, max: usize) -> String {
    let count = value.chars().count();
    if count <= max {
        return value.to_string();
    }
    value.chars().skip(count - max).collect()
}
