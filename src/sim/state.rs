//! Attack lifecycle states and the fixed progression order.

use serde::{Deserialize, Serialize};

/// State of the simulated attack.
///
/// A run starts `Dormant` and walks [`PROGRESSION`] in order, ending at
/// `Impact`. `Contained` exists as a reporting state for runs where the
/// analyst isolated the attacker; the progression never transitions into
/// it automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackState {
    /// No attack activity yet
    Dormant,
    /// Attacker gains a foothold (credential stuffing, phishing)
    InitialAccess,
    /// Attacker establishes persistence mechanisms
    Persistence,
    /// Attacker moves across hosts
    LateralMovement,
    /// Data leaves the environment
    Exfiltration,
    /// Destructive payload (ransomware) executes
    Impact,
    /// Attack stopped by the defender
    Contained,
}

/// The fixed attack progression. `advance()` walks this list in order;
/// the last entry is terminal.
pub const PROGRESSION: [AttackState; 5] = [
    AttackState::InitialAccess,
    AttackState::Persistence,
    AttackState::LateralMovement,
    AttackState::Exfiltration,
    AttackState::Impact,
];

impl AttackState {
    /// Display label used in banners and decision prompts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dormant => "DORMANT",
            Self::InitialAccess => "INITIAL ACCESS",
            Self::Persistence => "PERSISTENCE",
            Self::LateralMovement => "LATERAL MOVEMENT",
            Self::Exfiltration => "EXFILTRATION",
            Self::Impact => "IMPACT",
            Self::Contained => "CONTAINED",
        }
    }

    /// Returns the state's position in [`PROGRESSION`], if it is part of
    /// the automatic flow.
    #[must_use]
    pub fn progression_index(self) -> Option<usize> {
        PROGRESSION.iter().position(|&s| s == self)
    }

    /// Returns whether this state is the terminal progression state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Impact
    }
}

impl std::fmt::Display for AttackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
