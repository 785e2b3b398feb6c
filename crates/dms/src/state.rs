//! Drowsiness state tracking
//!
//! One [`Observation`] per processed frame drives a small state machine:
//! a run of "face present, eyes not open" frames accumulates a score, the
//! alert fires once when the score reaches the threshold, and any frame
//! with no face or open eyes resets the episode.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Eyes detected inside a face at or above which the eyes count as open
pub const EYES_OPEN_MIN: usize = 2;

/// What the detector saw in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// At least one face was detected
    pub face_present: bool,
    /// Eyes detected in the face (largest count when several faces)
    pub eyes_open_count: usize,
}

impl Observation {
    pub fn no_face() -> Self {
        Self {
            face_present: false,
            eyes_open_count: 0,
        }
    }

    pub fn face(eyes_open_count: usize) -> Self {
        Self {
            face_present: true,
            eyes_open_count,
        }
    }

    /// Face present with fewer than two eyes visible
    pub fn eyes_closed(&self) -> bool {
        self.face_present && self.eyes_open_count < EYES_OPEN_MIN
    }
}

/// Outcome of one tracker update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// No face in frame; episode reset
    NoFace,

    /// Eyes open; episode reset
    EyesOpen,

    /// Eyes closed for this many consecutive frames, below the threshold
    EyesClosed(u32),

    /// Threshold reached for the first time this episode; fire the alert
    DrowsinessAlert,

    /// Threshold already reached and alerted; keep showing the warning
    DrowsinessOngoing,
}

impl Action {
    /// Frame counts as drowsy (alert or ongoing)
    pub fn is_drowsy(&self) -> bool {
        matches!(self, Action::DrowsinessAlert | Action::DrowsinessOngoing)
    }

    /// Phase the tracker is in after emitting this action
    pub fn phase(&self) -> DrowsinessPhase {
        match self {
            Action::NoFace => DrowsinessPhase::Idle,
            Action::EyesOpen => DrowsinessPhase::EyesOpen,
            Action::EyesClosed(_) => DrowsinessPhase::EyesClosed,
            Action::DrowsinessAlert | Action::DrowsinessOngoing => DrowsinessPhase::DrowsyAlerted,
        }
    }
}

/// Coarse tracker phase, for display and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrowsinessPhase {
    /// No face seen (reset state)
    #[default]
    Idle,
    /// Eyes open (reset state)
    EyesOpen,
    /// Accumulating closed-eyes frames
    EyesClosed,
    /// Alert fired; lasts until the next reset
    DrowsyAlerted,
}

/// Per-session drowsiness counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Consecutive frames with face present and eyes closed
    pub score: u32,
    /// Alert already fired for the current episode
    pub alert_fired: bool,
}

impl SessionState {
    /// Apply one observation, returning the next state and the action to take.
    pub fn update(self, threshold: NonZeroU32, obs: Observation) -> (SessionState, Action) {
        if !obs.face_present {
            return (SessionState::default(), Action::NoFace);
        }
        if obs.eyes_open_count >= EYES_OPEN_MIN {
            return (SessionState::default(), Action::EyesOpen);
        }

        let score = self.score.saturating_add(1);
        if score < threshold.get() {
            let next = SessionState { score, ..self };
            return (next, Action::EyesClosed(score));
        }

        let action = if self.alert_fired {
            Action::DrowsinessOngoing
        } else {
            Action::DrowsinessAlert
        };
        (
            SessionState {
                score,
                alert_fired: true,
            },
            action,
        )
    }

    /// Whole seconds of closed eyes at the given frame rate
    pub fn elapsed_secs(&self, fps: NonZeroU32) -> u32 {
        self.score / fps.get()
    }
}

/// Owns the session state and the alert threshold for one monitoring run
#[derive(Debug, Clone)]
pub struct DrowsinessTracker {
    threshold: NonZeroU32,
    state: SessionState,
    longest_run: u32,
}

impl DrowsinessTracker {
    pub fn new(threshold: NonZeroU32) -> Self {
        Self {
            threshold,
            state: SessionState::default(),
            longest_run: 0,
        }
    }

    /// Feed one frame's observation. Call once per frame, in frame order.
    pub fn observe(&mut self, obs: Observation) -> Action {
        let (next, action) = self.state.update(self.threshold, obs);
        self.state = next;
        self.longest_run = self.longest_run.max(next.score);
        action
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn threshold(&self) -> NonZeroU32 {
        self.threshold
    }

    /// Longest closed-eyes run seen since the tracker was created
    pub fn longest_run(&self) -> u32 {
        self.longest_run
    }
}
