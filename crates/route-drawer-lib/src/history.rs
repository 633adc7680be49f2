//! Linear undo/redo log over combined route and waypoint state
//!
//! The log always holds at least one entry (the empty state). Recording a new
//! entry drops everything after the cursor first, so a redo branch is gone as
//! soon as a fresh edit is made.

use crate::route::Route;
use crate::waypoint::Waypoint;

/// Route and waypoints as one unit; the live editor state and every history entry
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EditorState {
    pub route: Route,
    pub waypoints: Vec<Waypoint>,
}

impl EditorState {
    /// Empty route without waypoints
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Snapshot log with a cursor at the current entry
///
/// Entries are owned values; nothing outside the log can reach them mutably,
/// so a recorded snapshot never changes afterwards.
#[derive(Clone, Debug)]
pub struct History {
    entries: Vec<EditorState>,
    cursor: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl History {
    /// Log containing only the empty state
    pub fn new() -> Self {
        Self {
            entries: vec![EditorState::empty()],
            cursor: 0,
        }
    }

    /// Truncate after the cursor, append `state`, and move the cursor onto it
    pub fn record(&mut self, state: EditorState) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(state);
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry; `None` at the oldest entry
    pub fn undo(&mut self) -> Option<&EditorState> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one entry; `None` at the newest entry
    pub fn redo(&mut self) -> Option<&EditorState> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len() - 1
    }

    /// Entry under the cursor
    #[inline]
    pub fn current(&self) -> &EditorState {
        &self.entries[self.cursor]
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of entries, including the initial empty one
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the initial entry cannot be removed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and start over from the empty state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
