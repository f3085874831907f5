//! Exclusive slide-out panel state machine.
//!
//! At most one panel is open. Opening another panel implicitly closes the
//! current one; an outside pointer press or a route change closes whatever is
//! open. Pure and synchronous: the host feeds events in and renders from
//! [`PanelCoordinator::state`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::CoreError;

// ─── Panel keys ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKey {
    Announcements,
    Status,
    Onboarding,
}

impl PanelKey {
    pub const ALL: [Self; 3] = [Self::Announcements, Self::Status, Self::Onboarding];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Announcements => "announcements",
            Self::Status => "status",
            Self::Onboarding => "onboarding",
        }
    }
}

impl fmt::Display for PanelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PanelKey {
    type Err = CoreError;

    /// Accepts the canonical names and the legacy sidebar names
    /// (`broadcasts`, `statusupdate`, `todos`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "announcements" | "broadcasts" => Ok(Self::Announcements),
            "status" | "statusupdate" => Ok(Self::Status),
            "onboarding" | "todos" => Ok(Self::Onboarding),
            _ => Err(CoreError::UnknownPanel(s.to_string())),
        }
    }
}

// ─── Panel state ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "panel", rename_all = "snake_case")]
pub enum PanelState {
    #[default]
    Closed,
    Open(PanelKey),
}

impl PanelState {
    pub fn open_key(self) -> Option<PanelKey> {
        match self {
            Self::Closed => None,
            Self::Open(key) => Some(key),
        }
    }

    pub fn is_open(self, key: PanelKey) -> bool {
        self == Self::Open(key)
    }
}

/// A state change produced by the coordinator. Never constructed for no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelTransition {
    pub from: PanelState,
    pub to: PanelState,
}

impl PanelTransition {
    /// Panel that became visible with this transition.
    pub fn opened(&self) -> Option<PanelKey> {
        self.to.open_key()
    }

    /// Panel that stopped being visible with this transition.
    pub fn closed(&self) -> Option<PanelKey> {
        self.from.open_key()
    }
}

// ─── Geometry ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Screen rectangle of the panel-owning container (edges inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x
            && p.x <= self.x + self.width
            && p.y >= self.y
            && p.y <= self.y + self.height
    }
}

// ─── Coordinator ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct PanelCoordinator {
    state: PanelState,
    container: Option<Bounds>,
}

impl PanelCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn open_panel(&self) -> Option<PanelKey> {
        self.state.open_key()
    }

    pub fn container(&self) -> Option<Bounds> {
        self.container
    }

    /// Host supplies (or clears) the container rectangle used for
    /// outside-interaction checks.
    pub fn set_container(&mut self, bounds: Option<Bounds>) {
        self.container = bounds;
    }

    /// Same key open → closed; anything else → `Open(key)`.
    pub fn toggle(&mut self, key: PanelKey) -> Option<PanelTransition> {
        if self.state.is_open(key) {
            self.transition(PanelState::Closed)
        } else {
            self.transition(PanelState::Open(key))
        }
    }

    pub fn show(&mut self, key: PanelKey) -> Option<PanelTransition> {
        self.transition(PanelState::Open(key))
    }

    pub fn close(&mut self) -> Option<PanelTransition> {
        self.transition(PanelState::Closed)
    }

    /// Pointer press somewhere on the page. Closes the open panel when the
    /// target lies outside the container. Without known container bounds the
    /// press cannot be classified and is ignored.
    pub fn on_outside_interaction(&mut self, target: Point) -> Option<PanelTransition> {
        if self.state == PanelState::Closed {
            return None;
        }
        let container = self.container?;
        if container.contains(target) {
            return None;
        }
        self.transition(PanelState::Closed)
    }

    /// Route change. Any real navigation collapses the open panel.
    pub fn on_navigation(&mut self, previous: &str, next: &str) -> Option<PanelTransition> {
        if previous == next {
            return None;
        }
        self.transition(PanelState::Closed)
    }

    fn transition(&mut self, to: PanelState) -> Option<PanelTransition> {
        if self.state == to {
            return None;
        }
        let from = std::mem::replace(&mut self.state, to);
        Some(PanelTransition { from, to })
    }
}
