//! Controller lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a controller instance.
///
/// The host drives the stages; the controller only moves forward and
/// never leaves `Redundant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Active,
    /// Replaced by a newer version.
    Redundant,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable lifecycle bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    pub state: ControllerState,
    /// Install asked to replace the previous controller without waiting.
    pub skip_waiting: bool,
    /// Activation took control of already open pages.
    pub clients_claimed: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self { state: ControllerState::Parsed, skip_waiting: false, clients_claimed: false }
    }
}

impl Lifecycle {
    /// Move to `next` if it lies ahead of the current state.
    pub fn advance(&mut self, next: ControllerState) -> bool {
        if next > self.state {
            self.state = next;
            true
        } else {
            false
        }
    }
}

/// Snapshot of a controller for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub state: ControllerState,
    pub bucket: String,
    pub skip_waiting: bool,
    pub clients_claimed: bool,
}
