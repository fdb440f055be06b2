//! Versioned cache partition names

use std::fmt;

/// The three partitions the worker owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// App shell, plus network-first mirrors
    Static,
    /// Content API responses
    Api,
    /// Audio recitations
    Media,
}

impl PartitionKind {
    pub const ALL: [PartitionKind; 3] = [PartitionKind::Static, PartitionKind::Api, PartitionKind::Media];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Api => "api",
            PartitionKind::Media => "media",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete partition names for one deployment version.
///
/// With version `v3` the names are `v3-static`, `v3-api`, `v3-media`; with an
/// empty version they are the bare kind names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    static_assets: String,
    api: String,
    media: String,
}

impl PartitionNames {
    pub fn for_version(version: &str) -> Self {
        let name = |kind: PartitionKind| {
            if version.is_empty() {
                kind.as_str().to_string()
            } else {
                format!("{}-{}", version, kind.as_str())
            }
        };

        Self {
            static_assets: name(PartitionKind::Static),
            api: name(PartitionKind::Api),
            media: name(PartitionKind::Media),
        }
    }

    pub fn name(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.static_assets,
            PartitionKind::Api => &self.api,
            PartitionKind::Media => &self.media,
        }
    }

    pub fn static_assets(&self) -> &str {
        &self.static_assets
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn media(&self) -> &str {
        &self.media
    }

    /// Whether `name` belongs to this version; everything else is purged on activate.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_assets || name == self.api || name == self.media
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.static_assets, &self.api, &self.media]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unversioned_names() {
        let names = PartitionNames::for_version("");
        assert_eq!(names.all(), ["static", "api", "media"]);
        assert!(names.is_current("api"));
        assert!(!names.is_current("v0-api"));
    }

    #[test]
    fn test_versioned_names_are_disjoint() {
        let names = PartitionNames::for_version("v3");
        assert_eq!(names.static_assets(), "v3-static");
        assert_eq!(names.name(PartitionKind::Media), "v3-media");

        let [a, b, c] = names.all();
        assert!(a != b && b != c && a != c);
        assert!(!names.is_current("static"));
        assert!(!names.is_current("v2-static"));
    }
}
