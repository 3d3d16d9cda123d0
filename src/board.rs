use std::collections::HashMap;

use ratatui::layout::{Position, Rect};
use tracing::debug;

use crate::issue::{AnchorPosition, IssueId};

/// Shared surface every issue dialog is drawn onto.
///
/// Dialogs are painted after the canvas, in stack order, so the last entry
/// of the stack is on top. Placement is computed against the whole surface
/// rather than the canvas panel, which keeps dialogs clear of panel borders
/// and clipping.
#[derive(Debug, Default)]
pub struct AttachmentBoard {
    surface: Rect,
    origin: Position,
    scroll: Position,
    stack: Vec<IssueId>,
    listeners: Vec<IssueId>,
    bounds: HashMap<IssueId, Rect>,
    hovered: Option<IssueId>,
}

impl AttachmentBoard {
    /// `surface` is the drawable area, `origin` the screen cell of canvas
    /// coordinate (0, 0) and `scroll` the canvas pan offset.
    pub fn set_viewport(&mut self, surface: Rect, origin: Position, scroll: Position) {
        self.surface = surface;
        self.origin = origin;
        self.scroll = scroll;
    }

    pub fn surface(&self) -> Rect {
        self.surface
    }

    /// Screen cell of a canvas anchor, if it falls inside the surface.
    pub fn to_screen(&self, anchor: AnchorPosition) -> Option<Position> {
        if anchor.left < self.scroll.x || anchor.top < self.scroll.y {
            return None;
        }
        let x = self
            .origin
            .x
            .checked_add(anchor.left - self.scroll.x)?;
        let y = self.origin.y.checked_add(anchor.top - self.scroll.y)?;
        let position = Position { x, y };
        self.surface.contains(position).then_some(position)
    }

    /// Canvas anchor under a screen cell.
    pub fn to_canvas(&self, column: u16, row: u16) -> Option<AnchorPosition> {
        if column < self.origin.x || row < self.origin.y {
            return None;
        }
        Some(AnchorPosition {
            top: (row - self.origin.y).saturating_add(self.scroll.y),
            left: (column - self.origin.x).saturating_add(self.scroll.x),
        })
    }

    /// Rectangle for a dialog anchored at `anchor`. The dialog opens just
    /// right of and below its anchor and is shifted back inside the surface
    /// when it would overflow. Returns `None` while the anchor is scrolled
    /// out of view.
    pub fn place(&self, anchor: AnchorPosition, width: u16, height: u16) -> Option<Rect> {
        let at = self.to_screen(anchor)?;
        let surface = self.surface;
        let width = width.min(surface.width);
        let height = height.min(surface.height);
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = surface.right().saturating_sub(width);
        let max_y = surface.bottom().saturating_sub(height);
        let x = at.x.saturating_add(1).min(max_x).max(surface.x);
        let y = at.y.saturating_add(1).min(max_y).max(surface.y);
        Some(Rect::new(x, y, width, height))
    }

    pub fn stack(&self) -> &[IssueId] {
        &self.stack
    }

    pub fn top(&self) -> Option<IssueId> {
        self.stack.last().copied()
    }

    pub fn push(&mut self, id: IssueId) {
        if self.stack.contains(&id) {
            self.raise(id);
            return;
        }
        self.stack.push(id);
    }

    pub fn remove(&mut self, id: IssueId) {
        self.stack.retain(|entry| *entry != id);
        self.bounds.remove(&id);
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }

    /// Moves `id` to the top of the stack. Returns whether the order changed.
    pub fn raise(&mut self, id: IssueId) -> bool {
        let Some(index) = self.stack.iter().position(|entry| *entry == id) else {
            return false;
        };
        if index + 1 == self.stack.len() {
            return false;
        }
        let entry = self.stack.remove(index);
        self.stack.push(entry);
        debug!(issue = %id, "dialog raised");
        true
    }

    pub fn add_enter_listener(&mut self, id: IssueId) {
        if !self.listeners.contains(&id) {
            self.listeners.push(id);
        }
    }

    pub fn remove_enter_listener(&mut self, id: IssueId) {
        self.listeners.retain(|entry| *entry != id);
    }

    pub fn has_enter_listener(&self, id: IssueId) -> bool {
        self.listeners.contains(&id)
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn record_bounds(&mut self, id: IssueId, area: Option<Rect>) {
        match area {
            Some(area) => {
                self.bounds.insert(id, area);
            }
            None => {
                self.bounds.remove(&id);
            }
        }
    }

    #[cfg(test)]
    pub fn bounds(&self, id: IssueId) -> Option<Rect> {
        self.bounds.get(&id).copied()
    }

    /// Top-most dialog drawn under a screen cell.
    pub fn dialog_at(&self, column: u16, row: u16) -> Option<IssueId> {
        let position = Position { x: column, y: row };
        self.stack
            .iter()
            .rev()
            .find(|id| {
                self.bounds
                    .get(id)
                    .is_some_and(|area| area.contains(position))
            })
            .copied()
    }

    /// Tracks the pointer and reports the dialog it just entered, if that
    /// dialog listens for pointer-enter.
    pub fn pointer_moved(&mut self, column: u16, row: u16) -> Option<IssueId> {
        let under = self.dialog_at(column, row);
        if under == self.hovered {
            return None;
        }
        self.hovered = under;
        under.filter(|id| self.has_enter_listener(*id))
    }
}

#[cfg(test)]
mod tests {
    use ratatui::layout::{Position, Rect};

    use super::AttachmentBoard;
    use crate::issue::{AnchorPosition, IssueId};

    fn board() -> AttachmentBoard {
        let mut board = AttachmentBoard::default();
        board.set_viewport(
            Rect::new(0, 0, 80, 24),
            Position { x: 1, y: 2 },
            Position { x: 0, y: 0 },
        );
        board
    }

    #[test]
    fn place_opens_below_right_of_anchor() {
        let board = board();
        let area = board
            .place(AnchorPosition { top: 3, left: 4 }, 20, 6)
            .expect("placed");
        assert_eq!(area, Rect::new(6, 6, 20, 6));
    }

    #[test]
    fn place_shifts_back_inside_surface() {
        let board = board();
        let area = board
            .place(AnchorPosition { top: 20, left: 75 }, 20, 6)
            .expect("placed");
        assert_eq!(area, Rect::new(60, 18, 20, 6));
    }

    #[test]
    fn place_follows_scroll_and_hides_offscreen_anchor() {
        let mut board = board();
        board.set_viewport(
            Rect::new(0, 0, 80, 24),
            Position { x: 1, y: 2 },
            Position { x: 10, y: 0 },
        );
        assert!(board.place(AnchorPosition { top: 3, left: 4 }, 20, 6).is_none());
        let area = board
            .place(AnchorPosition { top: 3, left: 14 }, 20, 6)
            .expect("placed");
        assert_eq!(area.x, 6);
    }

    #[test]
    fn to_canvas_inverts_to_screen() {
        let board = board();
        let anchor = AnchorPosition { top: 5, left: 9 };
        let screen = board.to_screen(anchor).expect("visible");
        assert_eq!(board.to_canvas(screen.x, screen.y), Some(anchor));
    }

    #[test]
    fn raise_moves_entry_to_top() {
        let mut board = board();
        board.push(IssueId(1));
        board.push(IssueId(2));
        board.push(IssueId(3));

        assert!(board.raise(IssueId(1)));
        assert_eq!(board.stack(), &[IssueId(2), IssueId(3), IssueId(1)]);
        assert!(!board.raise(IssueId(1)));
        assert!(!board.raise(IssueId(9)));
    }

    #[test]
    fn dialog_at_prefers_top_of_stack() {
        let mut board = board();
        board.push(IssueId(1));
        board.push(IssueId(2));
        board.record_bounds(IssueId(1), Some(Rect::new(0, 0, 10, 10)));
        board.record_bounds(IssueId(2), Some(Rect::new(5, 5, 10, 10)));

        assert_eq!(board.dialog_at(6, 6), Some(IssueId(2)));
        assert_eq!(board.dialog_at(1, 1), Some(IssueId(1)));
        assert_eq!(board.dialog_at(30, 20), None);
    }

    #[test]
    fn pointer_moved_reports_enter_once_and_only_for_listeners() {
        let mut board = board();
        board.push(IssueId(1));
        board.push(IssueId(2));
        board.record_bounds(IssueId(1), Some(Rect::new(0, 0, 10, 10)));
        board.record_bounds(IssueId(2), Some(Rect::new(20, 0, 10, 10)));
        board.add_enter_listener(IssueId(1));

        assert_eq!(board.pointer_moved(2, 2), Some(IssueId(1)));
        assert_eq!(board.pointer_moved(3, 3), None);
        assert_eq!(board.pointer_moved(22, 2), None);
        assert_eq!(board.pointer_moved(40, 20), None);
        assert_eq!(board.pointer_moved(2, 2), Some(IssueId(1)));
    }

    #[test]
    fn remove_drops_bounds_and_hover() {
        let mut board = board();
        board.push(IssueId(4));
        board.record_bounds(IssueId(4), Some(Rect::new(0, 0, 10, 10)));
        board.add_enter_listener(IssueId(4));
        board.pointer_moved(1, 1);

        board.remove(IssueId(4));
        board.remove_enter_listener(IssueId(4));
        assert!(board.stack().is_empty());
        assert_eq!(board.bounds(IssueId(4)), None);
        assert_eq!(board.listener_count(), 0);
    }
}
