//! # Study Bookkeeping
//!
//! Pure state for the reader's study features:
//!
//! - [`ReadingPlan`]: spread the 114 surahs over a number of days
//! - [`StreakTracker`]: consecutive reading days and streak badges
//! - [`SessionState`]: chat and presence of a live study group
//!
//! Nothing here performs I/O. Rows are persisted by the backend.

pub mod error;
pub mod plan;
pub mod session;
pub mod streak;

pub use error::{Result, StudyError};
pub use plan::{PlanDay, PlanProgress, ReadingPlan, TOTAL_SURAHS};
pub use session::{ChatMessage, Member, SessionEvent, SessionState};
pub use streak::{Badge, StreakTracker, StreakUpdate};
