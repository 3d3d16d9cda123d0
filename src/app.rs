use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use tracing::{debug, info, warn};

use crate::board::AttachmentBoard;
use crate::config::Config;
use crate::dialog::{BoardHost, DialogCallbacks, IssueDialog, IssueDialogProps};
use crate::issue::{AnchorPosition, Issue, IssueId};
use crate::keybinds::Keybinds;
use crate::store::BoardFile;
use crate::theme::ThemePalette;

const PAN_STEP: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Canvas,
    Dialogs,
}

/// Work the main loop performs on behalf of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    SaveBoard { issue: IssueId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogRequest {
    Collapse,
    Resolve,
    Reopen,
    SubmitComment(String),
    RevealMarker,
    BringToFront,
}

/// Adapter handed to a dialog: turns its callbacks into requests the board
/// applies once the dialog handler has returned.
struct DialogOutbox<'a> {
    id: IssueId,
    requests: &'a mut VecDeque<(IssueId, DialogRequest)>,
}

impl<'a> DialogOutbox<'a> {
    fn new(id: IssueId, requests: &'a mut VecDeque<(IssueId, DialogRequest)>) -> Self {
        Self { id, requests }
    }
}

impl DialogCallbacks for DialogOutbox<'_> {
    fn collapse(&mut self) {
        self.requests.push_back((self.id, DialogRequest::Collapse));
    }

    fn resolve(&mut self) {
        self.requests.push_back((self.id, DialogRequest::Resolve));
    }

    fn reopen(&mut self) {
        self.requests.push_back((self.id, DialogRequest::Reopen));
    }

    fn submit_comment(&mut self, text: &str) {
        self.requests
            .push_back((self.id, DialogRequest::SubmitComment(text.to_string())));
    }
}

impl BoardHost for DialogOutbox<'_> {
    fn reveal_marker(&mut self, id: IssueId) {
        self.requests.push_back((id, DialogRequest::RevealMarker));
    }

    fn bring_to_front(&mut self, id: IssueId) {
        self.requests.push_back((id, DialogRequest::BringToFront));
    }
}

pub struct App {
    issues: Vec<Issue>,
    dialogs: HashMap<IssueId, IssueDialog>,
    board: AttachmentBoard,
    requests: VecDeque<(IssueId, DialogRequest)>,
    revealed: HashSet<IssueId>,
    /// Saves queued and not yet finished, per issue.
    saving: HashMap<IssueId, usize>,
    actions: VecDeque<AppAction>,
    keybinds: Keybinds,
    theme_name: Option<String>,
    author: String,
    show_resolved: bool,
    cursor: AnchorPosition,
    scroll: Position,
    canvas_area: Rect,
    focus: Focus,
    status: String,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, board: BoardFile) -> Self {
        Self {
            issues: board.issues,
            dialogs: HashMap::new(),
            board: AttachmentBoard::default(),
            requests: VecDeque::new(),
            revealed: HashSet::new(),
            saving: HashMap::new(),
            actions: VecDeque::new(),
            keybinds: Keybinds::from_overrides(&config.keymap),
            theme_name: config.theme.clone(),
            author: config.author_name(),
            show_resolved: config.show_resolved,
            cursor: AnchorPosition::default(),
            scroll: Position::default(),
            canvas_area: Rect::default(),
            focus: Focus::Canvas,
            status: String::new(),
            should_quit: false,
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    #[cfg(test)]
    pub fn issue(&self, id: IssueId) -> Option<&Issue> {
        find_issue(&self.issues, id)
    }

    pub fn board(&self) -> &AttachmentBoard {
        &self.board
    }

    #[cfg(test)]
    pub fn dialog(&self, id: IssueId) -> Option<&IssueDialog> {
        self.dialogs.get(&id)
    }

    pub fn theme_name(&self) -> Option<&str> {
        self.theme_name.as_deref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn cursor(&self) -> AnchorPosition {
        self.cursor
    }

    pub fn show_resolved(&self) -> bool {
        self.show_resolved
    }

    pub fn is_saving(&self) -> bool {
        !self.saving.is_empty()
    }

    #[cfg(test)]
    pub fn is_fetching(&self, id: IssueId) -> bool {
        self.saving.contains_key(&id)
    }

    pub fn take_action(&mut self) -> Option<AppAction> {
        self.actions.pop_front()
    }

    pub fn marker_visible(&self, issue: &Issue) -> bool {
        !issue.resolved || self.show_resolved || self.revealed.contains(&issue.id)
    }

    pub fn visible_markers(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| self.marker_visible(issue))
    }

    /// Called by the UI before dialogs are drawn. `surface` is where dialogs
    /// may go, `canvas` the canvas panel content.
    pub fn set_viewport(&mut self, surface: Rect, canvas: Rect) {
        self.canvas_area = canvas;
        self.board.set_viewport(
            surface,
            Position {
                x: canvas.x,
                y: canvas.y,
            },
            self.scroll,
        );
    }

    pub fn open_issue(&mut self, id: IssueId) -> bool {
        if find_issue(&self.issues, id).is_none() {
            return false;
        }
        self.focus = Focus::Dialogs;
        if self.dialogs.contains_key(&id) {
            self.board.raise(id);
            return true;
        }

        let mut dialog = IssueDialog::new(id);
        self.board.push(id);
        dialog.mount(
            &mut self.board,
            &mut DialogOutbox::new(id, &mut self.requests),
        );
        self.dialogs.insert(id, dialog);
        info!(issue = %id, open = self.dialogs.len(), "dialog opened");
        self.drain_requests();
        true
    }

    pub fn render_dialogs(&mut self, frame: &mut Frame<'_>, theme: &ThemePalette, now: DateTime<Utc>) {
        let stack = self.board.stack().to_vec();
        let top = stack.last().copied();
        for id in stack {
            let Some(issue) = find_issue(&self.issues, id) else {
                continue;
            };
            let Some(dialog) = self.dialogs.get_mut(&id) else {
                continue;
            };
            let props = dialog_props(issue, &self.saving, now);
            let focused = self.focus == Focus::Dialogs && top == Some(id);
            dialog.render(frame, &mut self.board, &props, theme, focused);
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        self.status.clear();
        if self.focus == Focus::Dialogs
            && let Some(top) = self.board.top()
        {
            self.handle_dialog_key(top, key);
            return;
        }
        self.focus = Focus::Canvas;

        let Some(key) = self.keybinds.remap_key(key) else {
            return;
        };
        self.handle_canvas_key(key);
    }

    fn handle_dialog_key(&mut self, top: IssueId, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('o') {
            self.focus = Focus::Canvas;
            return;
        }
        if key.code == KeyCode::Tab {
            if let Some(bottom) = self.board.stack().first().copied() {
                self.board.raise(bottom);
            }
            return;
        }

        let Some(issue) = find_issue(&self.issues, top) else {
            return;
        };
        let Some(dialog) = self.dialogs.get_mut(&top) else {
            return;
        };
        let props = dialog_props(issue, &self.saving, Utc::now());
        dialog.on_key(key, &props, &mut DialogOutbox::new(top, &mut self.requests));
        self.drain_requests();
    }

    fn handle_canvas_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if !ctrl => self.should_quit = true,
            KeyCode::Char('o') if ctrl => {
                if self.board.top().is_some() {
                    self.focus = Focus::Dialogs;
                }
            }
            KeyCode::Enter => {
                match self.issue_at(self.cursor) {
                    Some(id) => {
                        self.open_issue(id);
                    }
                    None => self.set_status("No issue under cursor"),
                }
            }
            KeyCode::Char('n') if !ctrl => self.start_new_issue(),
            KeyCode::Char('r') if !ctrl => {
                self.show_resolved = !self.show_resolved;
                let label = if self.show_resolved { "shown" } else { "hidden" };
                self.set_status(format!("Resolved markers {}", label));
            }
            KeyCode::Tab => self.jump_to_next_issue(),
            KeyCode::Left if ctrl => self.pan(-(PAN_STEP as i32), 0),
            KeyCode::Right if ctrl => self.pan(PAN_STEP as i32, 0),
            KeyCode::Up if ctrl => self.pan(0, -(PAN_STEP as i32 / 2)),
            KeyCode::Down if ctrl => self.pan(0, PAN_STEP as i32 / 2),
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1, 0),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(0, -1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(0, 1),
            _ => {}
        }
    }

    pub fn on_mouse(&mut self, event: MouseEvent) {
        let (column, row) = (event.column, event.row);
        match event.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                if let Some(entered) = self.board.pointer_moved(column, row)
                    && let Some(dialog) = self.dialogs.get(&entered)
                {
                    dialog.on_pointer_enter(&mut DialogOutbox::new(entered, &mut self.requests));
                }
                self.drain_requests();
                let under = self.board.dialog_at(column, row);
                for (id, dialog) in self.dialogs.iter_mut() {
                    if under != Some(*id) {
                        dialog.clear_hover();
                    }
                }
                if let Some(id) = under {
                    self.forward_mouse(id, event);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(id) = self.board.dialog_at(column, row) {
                    self.focus = Focus::Dialogs;
                    self.board.raise(id);
                    self.forward_mouse(id, event);
                    return;
                }
                if !self.canvas_area.contains(Position { x: column, y: row }) {
                    return;
                }
                let Some(anchor) = self.board.to_canvas(column, row) else {
                    return;
                };
                match self.issue_at(anchor) {
                    Some(id) => {
                        self.cursor = anchor;
                        self.open_issue(id);
                    }
                    None => {
                        self.cursor = anchor;
                        self.focus = Focus::Canvas;
                    }
                }
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                if let Some(id) = self.board.dialog_at(column, row) {
                    self.forward_mouse(id, event);
                    return;
                }
                let delta = if event.kind == MouseEventKind::ScrollUp {
                    -1
                } else {
                    1
                };
                self.pan(0, delta);
            }
            _ => {}
        }
    }

    fn forward_mouse(&mut self, id: IssueId, event: MouseEvent) {
        let Some(issue) = find_issue(&self.issues, id) else {
            return;
        };
        let Some(dialog) = self.dialogs.get_mut(&id) else {
            return;
        };
        let props = dialog_props(issue, &self.saving, Utc::now());
        dialog.on_mouse(event, &props, &mut DialogOutbox::new(id, &mut self.requests));
        self.drain_requests();
    }

    /// Issue whose marker covers `anchor`. Markers are drawn as a glyph
    /// followed by the issue label.
    pub fn issue_at(&self, anchor: AnchorPosition) -> Option<IssueId> {
        self.visible_markers()
            .filter(|issue| {
                let width = marker_label(issue.id).chars().count() as u16 + 1;
                issue.position.top == anchor.top
                    && anchor.left >= issue.position.left
                    && anchor.left < issue.position.left.saturating_add(width)
            })
            .map(|issue| issue.id)
            .next()
    }

    fn start_new_issue(&mut self) {
        if let Some(existing) = find_issue(&self.issues, IssueId::NEW) {
            self.cursor = existing.position;
            self.open_issue(IssueId::NEW);
            self.set_status("Finish the open new issue first");
            return;
        }
        self.issues.push(Issue::new_at(self.cursor));
        self.open_issue(IssueId::NEW);
        self.set_status("New issue: type the first comment and press Enter");
    }

    fn jump_to_next_issue(&mut self) {
        let mut ids = self
            .visible_markers()
            .map(|issue| (issue.id, issue.position))
            .collect::<Vec<_>>();
        if ids.is_empty() {
            self.set_status("No issues on this board");
            return;
        }
        ids.sort_by_key(|(id, _)| *id);
        let current = self.issue_at(self.cursor);
        let next = match current.and_then(|id| ids.iter().position(|(entry, _)| *entry == id)) {
            Some(index) => ids[(index + 1) % ids.len()],
            None => ids[0],
        };
        self.cursor = next.1;
        self.scroll_to_cursor();
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        self.cursor.left = offset(self.cursor.left, dx);
        self.cursor.top = offset(self.cursor.top, dy);
        self.scroll_to_cursor();
    }

    fn pan(&mut self, dx: i32, dy: i32) {
        self.scroll.x = offset(self.scroll.x, dx);
        self.scroll.y = offset(self.scroll.y, dy);
        self.board.set_viewport(
            self.board.surface(),
            Position {
                x: self.canvas_area.x,
                y: self.canvas_area.y,
            },
            self.scroll,
        );
    }

    fn scroll_to_cursor(&mut self) {
        let width = self.canvas_area.width.max(1);
        let height = self.canvas_area.height.max(1);
        let mut dx = 0i32;
        let mut dy = 0i32;
        if self.cursor.left < self.scroll.x {
            dx = self.cursor.left as i32 - self.scroll.x as i32;
        } else if self.cursor.left >= self.scroll.x.saturating_add(width) {
            dx = self.cursor.left as i32 - (self.scroll.x as i32 + width as i32 - 1);
        }
        if self.cursor.top < self.scroll.y {
            dy = self.cursor.top as i32 - self.scroll.y as i32;
        } else if self.cursor.top >= self.scroll.y.saturating_add(height) {
            dy = self.cursor.top as i32 - (self.scroll.y as i32 + height as i32 - 1);
        }
        if dx != 0 || dy != 0 {
            self.pan(dx, dy);
        }
    }

    fn drain_requests(&mut self) {
        while let Some((id, request)) = self.requests.pop_front() {
            debug!(issue = %id, ?request, "dialog request");
            match request {
                DialogRequest::Collapse => self.close_dialog(id),
                DialogRequest::Resolve => self.set_resolved(id, true),
                DialogRequest::Reopen => self.set_resolved(id, false),
                DialogRequest::SubmitComment(text) => self.add_comment(id, &text, Utc::now()),
                DialogRequest::RevealMarker => {
                    if find_issue(&self.issues, id).is_some() {
                        self.revealed.insert(id);
                    }
                }
                DialogRequest::BringToFront => {
                    self.board.raise(id);
                }
            }
        }
    }

    fn close_dialog(&mut self, id: IssueId) {
        if let Some(mut dialog) = self.dialogs.remove(&id) {
            dialog.unmount(&mut self.board);
        }
        self.board.remove(id);
        // Resolved markers go back into hiding once their thread is closed.
        if find_issue(&self.issues, id).is_some_and(|issue| issue.resolved) {
            self.revealed.remove(&id);
        }
        if !id.is_created() {
            self.issues
                .retain(|issue| issue.id != id || !issue.comments.is_empty());
            self.revealed.remove(&id);
        }
        if self.dialogs.is_empty() {
            self.focus = Focus::Canvas;
        }
        info!(issue = %id, open = self.dialogs.len(), "dialog collapsed");
    }

    fn set_resolved(&mut self, id: IssueId, resolved: bool) {
        if !id.is_created() {
            self.set_status("Add a comment to create the issue first");
            return;
        }
        let Some(issue) = self.issues.iter_mut().find(|issue| issue.id == id) else {
            return;
        };
        if issue.resolved == resolved {
            return;
        }
        issue.resolved = resolved;
        let verb = if resolved { "resolved" } else { "reopened" };
        info!(issue = %id, "issue {}", verb);
        self.set_status(format!("Issue #{} {}", id, verb));
        self.queue_save(id);
    }

    pub(crate) fn add_comment(&mut self, id: IssueId, text: &str, now: DateTime<Utc>) {
        let id = if id.is_created() {
            id
        } else {
            self.promote_new_issue(id)
        };
        let author = self.author.clone();
        let Some(issue) = self.issues.iter_mut().find(|issue| issue.id == id) else {
            return;
        };
        issue.push_comment(&author, text, now);
        let count = issue.comments.len();
        self.set_status(format!("Comment added to issue #{} ({} total)", id, count));
        self.queue_save(id);
    }

    /// Gives a pending new issue its real id and swaps its dialog over.
    fn promote_new_issue(&mut self, pending: IssueId) -> IssueId {
        let next = IssueId(
            self.issues
                .iter()
                .map(|issue| issue.id.0)
                .max()
                .unwrap_or(0)
                .max(0)
                + 1,
        );
        let Some(issue) = self.issues.iter_mut().find(|issue| issue.id == pending) else {
            return pending;
        };
        issue.id = next;

        if let Some(mut dialog) = self.dialogs.remove(&pending) {
            dialog.unmount(&mut self.board);
        }
        self.board.remove(pending);
        self.revealed.remove(&pending);

        let mut dialog = IssueDialog::new(next);
        self.board.push(next);
        dialog.mount(
            &mut self.board,
            &mut DialogOutbox::new(next, &mut self.requests),
        );
        self.dialogs.insert(next, dialog);
        info!(issue = %next, "new issue created");
        next
    }

    fn queue_save(&mut self, id: IssueId) {
        *self.saving.entry(id).or_default() += 1;
        self.actions.push_back(AppAction::SaveBoard { issue: id });
    }

    /// Saved issues only; a pending new issue is not written until it has
    /// its first comment.
    pub fn board_snapshot(&self) -> BoardFile {
        BoardFile {
            issues: self
                .issues
                .iter()
                .filter(|issue| issue.id.is_created())
                .cloned()
                .collect(),
        }
    }

    pub fn finish_save(&mut self, id: IssueId, result: Result<(), String>) {
        if let Some(pending) = self.saving.get_mut(&id) {
            *pending -= 1;
            if *pending == 0 {
                self.saving.remove(&id);
            }
        }
        if let Err(message) = result {
            warn!(issue = %id, %message, "board save failed");
            self.set_status(format!("Failed to save issue #{}: {}", id, message));
        }
    }
}

pub fn marker_label(id: IssueId) -> String {
    if id.is_created() {
        return format!("#{}", id);
    }
    "new".to_string()
}

fn find_issue(issues: &[Issue], id: IssueId) -> Option<&Issue> {
    issues.iter().find(|issue| issue.id == id)
}

fn dialog_props<'a>(
    issue: &'a Issue,
    saving: &HashMap<IssueId, usize>,
    now: DateTime<Utc>,
) -> IssueDialogProps<'a> {
    IssueDialogProps {
        id: issue.id,
        comments: &issue.comments,
        position: issue.position,
        resolved: issue.resolved,
        is_fetching: saving.contains_key(&issue.id),
        now,
    }
}

fn offset(value: u16, delta: i32) -> u16 {
    (value as i32 + delta).clamp(0, u16::MAX as i32) as u16
}
