//! Reading plans
//!
//! A plan spreads the 114 surahs over a fixed number of days, in order. Each
//! day gets `114 / days` surahs and the first `114 % days` days get one more,
//! so every surah is assigned exactly once and day sizes differ by at most
//! one.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StudyError};

pub const TOTAL_SURAHS: u16 = 114;

/// Surahs assigned to one day of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDay {
    /// 1-based day number
    pub day: u16,
    pub date: NaiveDate,
    pub first_surah: u16,
    pub last_surah: u16,
}

impl PlanDay {
    pub fn surahs(&self) -> impl Iterator<Item = u16> {
        self.first_surah..=self.last_surah
    }

    pub fn contains(&self, surah: u16) -> bool {
        (self.first_surah..=self.last_surah).contains(&surah)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanProgress {
    pub completed_surahs: u16,
    pub completed_days: u16,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingPlan {
    pub id: Uuid,
    pub total_days: u16,
    pub start: NaiveDate,
    pub days: Vec<PlanDay>,
}

impl ReadingPlan {
    pub fn partition(total_days: u16, start: NaiveDate) -> Result<Self> {
        if !(1..=TOTAL_SURAHS).contains(&total_days) {
            return Err(StudyError::InvalidPlan(format!(
                "total_days must be within 1..={}, got {}",
                TOTAL_SURAHS, total_days
            )));
        }

        let base = TOTAL_SURAHS / total_days;
        let extra = TOTAL_SURAHS % total_days;

        let mut days = Vec::with_capacity(total_days as usize);
        let mut next_surah = 1;
        for index in 0..total_days {
            let count = base + u16::from(index < extra);
            let date = start
                .checked_add_days(Days::new(u64::from(index)))
                .ok_or_else(|| StudyError::InvalidPlan("plan runs past the calendar".to_string()))?;

            days.push(PlanDay {
                day: index + 1,
                date,
                first_surah: next_surah,
                last_surah: next_surah + count - 1,
            });
            next_surah += count;
        }

        Ok(Self {
            id: Uuid::new_v4(),
            total_days,
            start,
            days,
        })
    }

    pub fn day_for(&self, surah: u16) -> Result<&PlanDay> {
        self.days
            .iter()
            .find(|day| day.contains(surah))
            .ok_or(StudyError::InvalidSurah(surah))
    }

    /// The day scheduled for `date`, if the plan covers it.
    pub fn day_on(&self, date: NaiveDate) -> Option<&PlanDay> {
        self.days.iter().find(|day| day.date == date)
    }

    pub fn end(&self) -> NaiveDate {
        self.days.last().map(|day| day.date).unwrap_or(self.start)
    }

    /// Surahs outside 1..=114 and duplicates are ignored.
    pub fn progress<I>(&self, completed: I) -> PlanProgress
    where
        I: IntoIterator<Item = u16>,
    {
        let done: BTreeSet<u16> = completed
            .into_iter()
            .filter(|surah| (1..=TOTAL_SURAHS).contains(surah))
            .collect();

        let completed_days = self
            .days
            .iter()
            .filter(|day| day.surahs().all(|surah| done.contains(&surah)))
            .count() as u16;

        PlanProgress {
            completed_surahs: done.len() as u16,
            completed_days,
            percent: done.len() as f64 * 100.0 / f64::from(TOTAL_SURAHS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn test_thirty_day_plan() {
        let plan = ReadingPlan::partition(30, start()).unwrap();
        assert_eq!(plan.days.len(), 30);

        // 114 = 30 * 3 + 24: the first 24 days read four surahs.
        assert_eq!((plan.days[0].first_surah, plan.days[0].last_surah), (1, 4));
        assert_eq!(plan.days[23].surahs().count(), 4);
        assert_eq!(plan.days[24].surahs().count(), 3);
        assert_eq!(plan.days[29].last_surah, 114);
        assert_eq!(plan.end(), NaiveDate::from_ymd_opt(2026, 3, 30).unwrap());
    }

    #[test]
    fn test_every_surah_assigned_once() {
        for total_days in [1, 7, 29, 57, 113, 114] {
            let plan = ReadingPlan::partition(total_days, start()).unwrap();
            let all: Vec<u16> = plan.days.iter().flat_map(PlanDay::surahs).collect();
            assert_eq!(all, (1..=114).collect::<Vec<_>>(), "days = {}", total_days);

            let sizes: BTreeSet<usize> = plan.days.iter().map(|d| d.surahs().count()).collect();
            assert!(sizes.len() <= 2);
        }
    }

    #[test]
    fn test_rejects_out_of_range_days() {
        assert!(ReadingPlan::partition(0, start()).is_err());
        assert!(ReadingPlan::partition(115, start()).is_err());
    }

    #[test]
    fn test_day_lookup() {
        let plan = ReadingPlan::partition(7, start()).unwrap();
        assert_eq!(plan.day_for(1).unwrap().day, 1);
        assert_eq!(plan.day_for(114).unwrap().day, 7);
        assert_eq!(plan.day_for(0), Err(StudyError::InvalidSurah(0)));
        assert_eq!(plan.day_on(start()).unwrap().day, 1);
        assert!(plan.day_on(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()).is_none());
    }

    #[test]
    fn test_progress() {
        let plan = ReadingPlan::partition(114, start()).unwrap();
        let progress = plan.progress([1, 2, 2, 3, 200]);
        assert_eq!(progress.completed_surahs, 3);
        assert_eq!(progress.completed_days, 3);
        assert!((progress.percent - 300.0 / 114.0).abs() < 1e-9);

        let full = plan.progress(1..=114);
        assert_eq!(full.completed_days, 114);
        assert!((full.percent - 100.0).abs() < 1e-9);
    }
}
