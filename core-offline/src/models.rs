//! Offline record types

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OfflineError, Result};

pub const SURAH_COUNT: u16 = 114;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevelationType {
    Meccan,
    Medinan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ayah {
    /// Position across the whole Quran
    pub number: u32,
    pub number_in_surah: u16,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

/// A complete surah, always saved whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Surah {
    pub number: u16,
    pub name: String,
    pub english_name: String,
    pub english_name_translation: String,
    pub number_of_ayahs: u16,
    pub revelation_type: RevelationType,
    pub ayahs: Vec<Ayah>,
}

impl Surah {
    pub fn validate(&self) -> Result<()> {
        if !(1..=SURAH_COUNT).contains(&self.number) {
            return Err(OfflineError::InvalidInput {
                field: "number".to_string(),
                message: format!("surah number must be within 1..={}", SURAH_COUNT),
            });
        }
        Ok(())
    }
}

/// A surah as stored, stamped with its save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSurah {
    #[serde(flatten)]
    pub surah: Surah,
    pub saved_at: DateTime<Utc>,
}

/// Identity of a saved recitation: one ayah by one reciter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioKey {
    pub surah: u16,
    pub ayah: u16,
    pub reciter: String,
}

impl AudioKey {
    pub fn new(surah: u16, ayah: u16, reciter: impl Into<String>) -> Self {
        Self {
            surah,
            ayah,
            reciter: reciter.into(),
        }
    }

    /// File name safe for any reciter identifier.
    pub(crate) fn file_stem(&self) -> String {
        playback_stem(&self.to_string())
    }
}

impl fmt::Display for AudioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.surah, self.ayah, self.reciter)
    }
}

/// Percent-encoded, so distinct keys never share a file and no path
/// separator survives.
pub(crate) fn playback_stem(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

/// A locally playable copy of a saved recitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHandle {
    pub key: AudioKey,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub saved_at: DateTime<Utc>,
}
