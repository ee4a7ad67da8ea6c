//! Per-frame pointer input.
//!
//! The drag controller never polls the window system directly. Instead the
//! windowed app feeds raw events into an [`InputTracker`], and once per frame
//! [`InputTracker::take_frame`] produces an immutable [`PointerInput`]
//! snapshot with edge-triggered press/release flags. Headless callers and
//! tests build [`PointerInput`] values by hand.

use std::collections::BTreeMap;

use kurbo::Vec2;

// ---------------------------------------------------------------------------
// TouchId
// ---------------------------------------------------------------------------

/// Identity of one finger on a touch screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub u64);

// ---------------------------------------------------------------------------
// PointerInput
// ---------------------------------------------------------------------------

/// Snapshot of pointer state for a single frame, in screen pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerInput {
    /// Current mouse cursor position.
    pub cursor: Vec2,
    /// Left mouse button went down this frame.
    pub mouse_pressed: bool,
    /// Left mouse button went up this frame.
    pub mouse_released: bool,
    /// Touches that started this frame, in arrival order.
    pub touches_pressed: Vec<TouchId>,
    /// Touches that ended or were cancelled this frame.
    pub touches_released: Vec<TouchId>,
    /// Positions of all touches currently down.
    pub touch_positions: BTreeMap<TouchId, Vec2>,
}

impl PointerInput {
    /// Input with only a cursor position.
    pub fn at(cursor: Vec2) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    /// Mouse press at `cursor`.
    pub fn mouse_press(cursor: Vec2) -> Self {
        Self {
            cursor,
            mouse_pressed: true,
            ..Self::default()
        }
    }

    /// Mouse release at `cursor`.
    pub fn mouse_release(cursor: Vec2) -> Self {
        Self {
            cursor,
            mouse_released: true,
            ..Self::default()
        }
    }

    /// Add a touch that started this frame.
    pub fn with_new_touch(mut self, id: TouchId, position: Vec2) -> Self {
        self.touches_pressed.push(id);
        self.touch_positions.insert(id, position);
        self
    }

    /// Add a touch that is held (started in an earlier frame).
    pub fn with_touch(mut self, id: TouchId, position: Vec2) -> Self {
        self.touch_positions.insert(id, position);
        self
    }

    /// Add a touch that ended this frame.
    pub fn with_released_touch(mut self, id: TouchId) -> Self {
        self.touches_released.push(id);
        self.touch_positions.remove(&id);
        self
    }

    /// Current position of a touch, if it is down.
    pub fn touch_position(&self, id: TouchId) -> Option<Vec2> {
        self.touch_positions.get(&id).copied()
    }

    pub fn touch_released(&self, id: TouchId) -> bool {
        self.touches_released.contains(&id)
    }
}

// ---------------------------------------------------------------------------
// InputTracker
// ---------------------------------------------------------------------------

/// Accumulates window events between frames.
#[derive(Debug, Default)]
pub struct InputTracker {
    cursor: Vec2,
    mouse_down: bool,
    mouse_pressed: bool,
    mouse_released: bool,
    touches: BTreeMap<TouchId, Vec2>,
    touches_pressed: Vec<TouchId>,
    touches_released: Vec<TouchId>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_moved(&mut self, position: Vec2) {
        self.cursor = position;
    }

    /// Left mouse button state change. Repeated events with the same state are ignored.
    pub fn mouse_button(&mut self, down: bool) {
        if down == self.mouse_down {
            return;
        }
        self.mouse_down = down;
        if down {
            self.mouse_pressed = true;
        } else {
            self.mouse_released = true;
        }
    }

    pub fn touch_started(&mut self, id: TouchId, position: Vec2) {
        self.touches.insert(id, position);
        self.touches_pressed.push(id);
    }

    pub fn touch_moved(&mut self, id: TouchId, position: Vec2) {
        if let Some(p) = self.touches.get_mut(&id) {
            *p = position;
        }
    }

    /// Touch lifted or cancelled.
    pub fn touch_ended(&mut self, id: TouchId) {
        if self.touches.remove(&id).is_some() {
            self.touches_released.push(id);
        }
    }

    pub fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    /// Snapshot the current frame and reset the edge flags.
    pub fn take_frame(&mut self) -> PointerInput {
        PointerInput {
            cursor: self.cursor,
            mouse_pressed: std::mem::take(&mut self.mouse_pressed),
            mouse_released: std::mem::take(&mut self.mouse_released),
            touches_pressed: std::mem::take(&mut self.touches_pressed),
            touches_released: std::mem::take(&mut self.touches_released),
            touch_positions: self.touches.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
