//! # Quran Content Client
//!
//! Thin client over the public Quran APIs used by the reader: surah
//! listings, editions, commentary, recitation URLs and search.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{Commentary, ContentClient};
pub use endpoints::{CommentaryProvider, ContentEndpoints};
pub use error::{ContentError, Result};
