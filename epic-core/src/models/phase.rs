use serde::{Deserialize, Serialize};

/// One of the five flywheel stages.
///
/// Declaration order is dependency order: every phase depends on all
/// phases declared before it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Understand,
    Create,
    Distribute,
    Learn,
    Automate,
}

impl Phase {
    pub const COUNT: usize = 5;

    pub const ALL: [Phase; Phase::COUNT] = [
        Self::Understand,
        Self::Create,
        Self::Distribute,
        Self::Learn,
        Self::Automate,
    ];

    /// Position in the dependency chain.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Understand => "UNDERSTAND",
            Self::Create => "CREATE",
            Self::Distribute => "DISTRIBUTE",
            Self::Learn => "LEARN",
            Self::Automate => "AUTOMATE",
        }
    }

    /// Parses a phase name, ignoring ASCII case so `understand` in a URL
    /// path resolves the same as `UNDERSTAND` in a JSON body.
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s))
    }

    pub fn definition(self) -> &'static PhaseDefinition {
        &PHASE_DEFINITIONS[self.index()]
    }

    pub fn total_steps(self) -> u32 {
        self.definition().total_steps
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NOT_STARTED" => Some(Self::NotStarted),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Static description of a phase as presented by the wizard.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDefinition {
    pub phase: Phase,
    pub title: &'static str,
    pub description: &'static str,
    pub total_steps: u32,
}

/// Indexed by [`Phase::index`].
pub const PHASE_DEFINITIONS: [PhaseDefinition; Phase::COUNT] = [
    PhaseDefinition {
        phase: Phase::Understand,
        title: "Understand",
        description: "Capture the brand, its voice and its audience",
        total_steps: 5,
    },
    PhaseDefinition {
        phase: Phase::Create,
        title: "Create",
        description: "Set up content pillars and generate the first posts",
        total_steps: 5,
    },
    PhaseDefinition {
        phase: Phase::Distribute,
        title: "Distribute",
        description: "Connect social accounts and choose a publishing cadence",
        total_steps: 4,
    },
    PhaseDefinition {
        phase: Phase::Learn,
        title: "Learn",
        description: "Wire up analytics and review what performs",
        total_steps: 4,
    },
    PhaseDefinition {
        phase: Phase::Automate,
        title: "Automate",
        description: "Configure autopilot triggers and approval rules",
        total_steps: 5,
    },
];
