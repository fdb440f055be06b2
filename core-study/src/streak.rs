//! Reading streaks and badges

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Badge {
    ThreeDayStreak,
    WeekStreak,
    MonthStreak,
    HundredDayStreak,
}

impl Badge {
    pub const ALL: [Badge; 4] = [
        Badge::ThreeDayStreak,
        Badge::WeekStreak,
        Badge::MonthStreak,
        Badge::HundredDayStreak,
    ];

    /// Consecutive days needed to earn the badge.
    pub fn threshold(&self) -> u32 {
        match self {
            Badge::ThreeDayStreak => 3,
            Badge::WeekStreak => 7,
            Badge::MonthStreak => 30,
            Badge::HundredDayStreak => 100,
        }
    }
}

/// What a single [`StreakTracker::record_read`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current: u32,
    pub longest: u32,
    pub new_badges: Vec<Badge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakTracker {
    current: u32,
    longest: u32,
    last_read: Option<NaiveDate>,
    badges: Vec<Badge>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn longest(&self) -> u32 {
        self.longest
    }

    pub fn last_read(&self) -> Option<NaiveDate> {
        self.last_read
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    /// Record reading on `date`. Repeat reads on the same day and reads
    /// dated before the last one change nothing.
    pub fn record_read(&mut self, date: NaiveDate) -> StreakUpdate {
        match self.last_read {
            Some(last) if date <= last => {}
            Some(last) if last.succ_opt() == Some(date) => {
                self.current += 1;
                self.last_read = Some(date);
            }
            _ => {
                self.current = 1;
                self.last_read = Some(date);
            }
        }
        self.longest = self.longest.max(self.current);

        let new_badges: Vec<Badge> = Badge::ALL
            .into_iter()
            .filter(|badge| self.current >= badge.threshold() && !self.badges.contains(badge))
            .collect();

        if !new_badges.is_empty() {
            debug!(streak = self.current, badges = ?new_badges, "Badges earned");
            self.badges.extend(new_badges.iter().copied());
        }

        StreakUpdate {
            current: self.current,
            longest: self.longest,
            new_badges,
        }
    }
}
