//! Engine lifecycle state.

use std::fmt;

/// Lifecycle of one gateway session.
///
/// ```text
/// Connecting --(handshake ok)--------> Ready
/// Connecting --(socket/handshake err)-> ExitError
/// Ready      --(stop)----------------> ExitNormal
/// Ready      --(fatal I/O error)-----> ExitError
/// ```
///
/// `ExitNormal` and `ExitError` are terminal.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EngineState {
    Connecting = 0,
    Ready = 1,
    ExitNormal = 2,
    ExitError = 3,
}

impl EngineState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(EngineState::Connecting),
            1 => Some(EngineState::Ready),
            2 => Some(EngineState::ExitNormal),
            3 => Some(EngineState::ExitError),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::ExitNormal | EngineState::ExitError)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (EngineState::Connecting, EngineState::Ready)
                | (EngineState::Connecting, EngineState::ExitError)
                | (EngineState::Ready, EngineState::ExitNormal)
                | (EngineState::Ready, EngineState::ExitError)
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EngineState::Connecting => "connecting",
            EngineState::Ready => "ready",
            EngineState::ExitNormal => "exit-normal",
            EngineState::ExitError => "exit-error",
        };
        f.write_str(label)
    }
}
