//! Display classification for status and priority values
//!
//! Pure lookups so presentation code never branches on enum values itself.

use crate::issue::{Priority, Status};

/// Display weight for an enum value: an ordinal for sorting plus a colour tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Badge {
    pub rank: u8,
    pub color: &'static str,
}

impl Badge {
    /// Used for anything outside the known enumerations
    pub const NEUTRAL: Badge = Badge {
        rank: 0,
        color: "#6B7280",
    };
}

pub fn status_badge(status: Status) -> Badge {
    match status {
        Status::Pending => Badge {
            rank: 1,
            color: "#F59E0B",
        },
        Status::Verified => Badge {
            rank: 2,
            color: "#3B82F6",
        },
        Status::InProgress => Badge {
            rank: 3,
            color: "#8B5CF6",
        },
        Status::Solved => Badge {
            rank: 4,
            color: "#10B981",
        },
        Status::Rejected => Badge {
            rank: 5,
            color: Badge::NEUTRAL.color,
        },
        Status::Unknown => Badge::NEUTRAL,
    }
}

pub fn priority_badge(priority: Priority) -> Badge {
    match priority {
        Priority::Low => Badge {
            rank: 1,
            color: "#6B7280",
        },
        Priority::Medium => Badge {
            rank: 2,
            color: "#3B82F6",
        },
        Priority::High => Badge {
            rank: 3,
            color: "#F59E0B",
        },
        Priority::Critical => Badge {
            rank: 4,
            color: "#EF4444",
        },
        Priority::Unknown => Badge::NEUTRAL,
    }
}
