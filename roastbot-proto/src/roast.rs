//! Roast severity tiers and their fixed message sets.

use serde::{Deserialize, Serialize};

/// How harsh an overdue notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoastTier {
    /// Gentle nudge.
    Mild,
    /// Pointed jab.
    Medium,
    /// No mercy.
    Savage,
}

const MILD: &[&str] = &[
    "Come on, you can do better!",
    "Oops, forgot something?",
    "Hey lazybones, maybe try actually finishing something!",
    "This ain't a Netflix show, stop pausing and get to work!",
];

const MEDIUM: &[&str] = &[
    "Bro, even a sloth moves faster than you!",
    "That was pathetic!",
    "You had one job. Just one!",
    "Procrastination king strikes again!",
];

const SAVAGE: &[&str] = &[
    "You're the reason warnings exist.",
    "If procrastination was a sport, you'd have gold medals!",
    "Deadlines fear you... because they know you'll never respect them.",
    "You ignored the task so hard it thought it was ghosted!",
    "Your productivity level is lower than your phone battery at 3%.",
    "Even Google can't find your work ethic!",
    "NASA called. They're studying your ability to do nothing for science!",
    "Your task list is starting to look like a graveyard of abandoned dreams.",
];

impl RoastTier {
    /// Every tier, in ascending severity.
    pub const ALL: [Self; 3] = [Self::Mild, Self::Medium, Self::Savage];

    /// The fixed message set for this tier. Never empty.
    #[must_use]
    pub const fn messages(self) -> &'static [&'static str] {
        match self {
            Self::Mild => MILD,
            Self::Medium => MEDIUM,
            Self::Savage => SAVAGE,
        }
    }
}

impl std::fmt::Display for RoastTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mild => write!(f, "mild"),
            Self::Medium => write!(f, "medium"),
            Self::Savage => write!(f, "savage"),
        }
    }
}
