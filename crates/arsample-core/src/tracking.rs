use serde::{Deserialize, Serialize};

/// Tracking state reported by the AR runtime for a trackable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Tracking,
    #[default]
    Paused,
    Stopped,
}

impl TrackingState {
    pub fn is_tracking(self) -> bool {
        self == TrackingState::Tracking
    }
}
