use std::fmt;

/// Lifecycle of one transfer.
///
/// `Idle → Probing → RangedPlanning → RangedExecuting → Completed | Failed`, or
/// `Idle → Probing → FallbackExecuting → Completed | Failed`. A probe failure
/// goes straight to `Failed`. There is no cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransferState {
    Idle = 0,
    Probing = 1,
    RangedPlanning = 2,
    RangedExecuting = 3,
    FallbackExecuting = 4,
    Completed = 5,
    Failed = 6,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Completed | TransferState::Failed)
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => TransferState::Probing,
            2 => TransferState::RangedPlanning,
            3 => TransferState::RangedExecuting,
            4 => TransferState::FallbackExecuting,
            5 => TransferState::Completed,
            6 => TransferState::Failed,
            _ => TransferState::Idle,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferState::Idle => "idle",
            TransferState::Probing => "probing",
            TransferState::RangedPlanning => "planning",
            TransferState::RangedExecuting => "downloading",
            TransferState::FallbackExecuting => "downloading (single stream)",
            TransferState::Completed => "completed",
            TransferState::Failed => "failed",
        };
        f.write_str(s)
    }
}
