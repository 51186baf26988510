//! Lifecycle state shared by voices, banks and oscillators

use std::fmt;

use serde::{Deserialize, Serialize};

/// Play state of a tone-generator handle
///
/// `Ready → Playing → Used`. `Used` is terminal: a used handle ignores
/// further play and update calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    /// Constructed and silent (default state)
    #[default]
    Ready,
    Playing,
    Used,
}

impl PlayState {
    pub fn is_ready(&self) -> bool {
        *self == PlayState::Ready
    }

    pub fn is_playing(&self) -> bool {
        *self == PlayState::Playing
    }

    pub fn is_used(&self) -> bool {
        *self == PlayState::Used
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::Ready => write!(f, "ready"),
            PlayState::Playing => write!(f, "playing"),
            PlayState::Used => write!(f, "used"),
        }
    }
}
