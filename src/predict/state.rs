#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Armed,
    Normalizing,
    Inferring,
    Done,
    Halted,
}

impl CycleState {
    /// Normalization and inference both count as in flight.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Normalizing | Self::Inferring)
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Normalizing => "normalizing",
            Self::Inferring => "inferring",
            Self::Done => "done",
            Self::Halted => "halted",
        }
    }
}

pub fn can_transition(from: CycleState, to: CycleState) -> bool {
    matches!(
        (from, to),
        (CycleState::Idle, CycleState::Armed)
            | (CycleState::Armed, CycleState::Normalizing)
            | (CycleState::Armed, CycleState::Halted)
            | (CycleState::Normalizing, CycleState::Inferring)
            | (CycleState::Normalizing, CycleState::Halted)
            | (CycleState::Inferring, CycleState::Done)
            | (CycleState::Inferring, CycleState::Halted)
            | (CycleState::Done, CycleState::Idle)
            | (CycleState::Halted, CycleState::Idle)
    ) || from == to
}
