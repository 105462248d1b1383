//! Version manifest produced by the external fetcher.
//!
//! Example JSON:
//! ```json
//! {
//!   "versions": [
//!     {
//!       "version": "0.48.7",
//!       "platforms": {
//!         "linux-x64": "https://downloads.cursor.com/production/.../Cursor-0.48.7-x86_64.AppImage",
//!         "darwin-arm64": "https://downloads.cursor.com/production/.../Cursor-darwin-arm64.dmg"
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Entries are read leniently: a malformed entry, a non-string version or a
//! non-string URL is dropped with a warning instead of failing the document.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, UpdateError};
use crate::version::Version;

/// Map from platform key to artifact download URL.
pub type PlatformUrls = HashMap<String, String>;

/// Listing of available versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionManifest {
    /// Entries in the order the fetcher wrote them.
    #[serde(default, deserialize_with = "lenient_entries")]
    pub versions: Vec<ManifestEntry>,
}

/// One published version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Dotted version string.
    #[serde(default, deserialize_with = "lenient_version")]
    pub version: Option<String>,
    /// Download URL per platform.
    #[serde(default, deserialize_with = "lenient_urls")]
    pub platforms: PlatformUrls,
}

fn lenient_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<ManifestEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let entries = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping manifest entry {}: {}", index, e);
                None
            }
        })
        .collect();
    Ok(entries)
}

fn lenient_version<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(version) => Some(version),
        Value::Null => None,
        other => {
            tracing::warn!("Ignoring non-string manifest version: {}", other);
            None
        }
    })
}

fn lenient_urls<'de, D>(deserializer: D) -> std::result::Result<PlatformUrls, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        tracing::warn!("Ignoring manifest platforms that are not an object");
        return Ok(PlatformUrls::new());
    };
    let urls = map
        .into_iter()
        .filter_map(|(platform, value)| match value {
            Value::String(url) => Some((platform, url)),
            other => {
                tracing::warn!("Ignoring non-string URL for {}: {}", platform, other);
                None
            }
        })
        .collect();
    Ok(urls)
}

/// The newest entry of a manifest.
#[derive(Debug, Clone)]
pub struct LatestRelease {
    /// Parsed version.
    pub version: Version,
    /// Download URL per platform.
    pub platforms: PlatformUrls,
}

impl VersionManifest {
    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let unreadable = |reason: String| UpdateError::ManifestUnreadable {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        Self::from_json(&content).map_err(|e| unreadable(e.to_string()))
    }

    /// Parses manifest JSON. Unknown fields are ignored.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Picks the entry with the greatest version.
///
/// Entries without a parsable version are skipped; the first of several
/// equal maxima wins.
pub fn select_latest(manifest: &VersionManifest) -> Result<LatestRelease> {
    let mut latest: Option<(Version, &ManifestEntry)> = None;

    for entry in &manifest.versions {
        let Some(raw) = entry.version.as_deref() else {
            tracing::debug!("Skipping manifest entry without a version");
            continue;
        };

        let version = match Version::parse(raw) {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!("Skipping manifest entry: {}", e);
                continue;
            }
        };

        let is_greater = latest
            .as_ref()
            .is_none_or(|(current, _)| version > *current);
        if is_greater {
            latest = Some((version, entry));
        }
    }

    let (version, entry) = latest.ok_or(UpdateError::ManifestEmpty)?;
    tracing::info!("Latest version found: {}", version);

    Ok(LatestRelease {
        version,
        platforms: entry.platforms.clone(),
    })
}

/// Returns the artifact URL for `platform_key`. There is no fallback platform.
pub fn resolve_artifact_url<'a>(platforms: &'a PlatformUrls, platform_key: &str) -> Result<&'a str> {
    platforms
        .get(platform_key)
        .map(String::as_str)
        .ok_or_else(|| UpdateError::PlatformUnsupported(platform_key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manifest(versions: &[&str]) -> VersionManifest {
        VersionManifest {
            versions: versions
                .iter()
                .map(|v| ManifestEntry {
                    version: Some((*v).to_string()),
                    platforms: HashMap::from([(
                        "linux-x64".to_string(),
                        format!("https://example.com/Cursor-{v}-x86_64.AppImage"),
                    )]),
                })
                .collect(),
        }
    }

    #[test]
    fn test_select_latest() {
        let latest = select_latest(&manifest(&["1.0.0", "1.2.0", "1.1.5"])).unwrap();
        assert_eq!(latest.version.to_string(), "1.2.0");
        assert_eq!(
            resolve_artifact_url(&latest.platforms, "linux-x64").unwrap(),
            "https://example.com/Cursor-1.2.0-x86_64.AppImage"
        );
    }

    #[test]
    fn test_select_latest_numeric_not_lexicographic() {
        let latest = select_latest(&manifest(&["0.9.9", "0.10.0", "0.2.1"])).unwrap();
        assert_eq!(latest.version.to_string(), "0.10.0");
    }

    #[test]
    fn test_first_maximal_entry_wins() {
        let mut m = manifest(&["1.2", "1.2.0"]);
        m.versions[1].platforms.clear();

        let latest = select_latest(&m).unwrap();
        assert_eq!(latest.version.to_string(), "1.2");
        assert!(latest.platforms.contains_key("linux-x64"));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let mut m = manifest(&["1.0.0", "nightly", "1.1.0"]);
        m.versions.push(ManifestEntry::default());

        let latest = select_latest(&m).unwrap();
        assert_eq!(latest.version.to_string(), "1.1.0");
    }

    #[test]
    fn test_no_valid_versions() {
        assert!(matches!(
            select_latest(&VersionManifest::default()),
            Err(UpdateError::ManifestEmpty)
        ));
        assert!(matches!(
            select_latest(&manifest(&["beta", ""])),
            Err(UpdateError::ManifestEmpty)
        ));
    }

    #[test]
    fn test_missing_platform_is_an_error() {
        let latest = select_latest(&manifest(&["1.0.0"])).unwrap();
        let result = resolve_artifact_url(&latest.platforms, "darwin-arm64");
        assert!(matches!(result, Err(UpdateError::PlatformUnsupported(key)) if key == "darwin-arm64"));
    }

    #[test]
    fn test_parse_manifest_json() {
        let json = r#"{
            "versions": [
                { "version": "0.47.9", "platforms": { "linux-x64": "https://a" }, "date": "2025-03-01" },
                { "version": "0.48.7", "platforms": { "linux-x64": "https://b" } }
            ],
            "lastUpdated": "2025-04-01"
        }"#;
        let manifest = VersionManifest::from_json(json).unwrap();
        assert_eq!(manifest.versions.len(), 2);

        let latest = select_latest(&manifest).unwrap();
        assert_eq!(latest.version.to_string(), "0.48.7");
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("version-history.json");
        std::fs::write(&path, "{ not json").unwrap();

        match VersionManifest::load(&path) {
            Err(UpdateError::ManifestUnreadable { path: reported, .. }) => {
                assert_eq!(reported, path);
            }
            other => panic!("expected ManifestUnreadable, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_type_entries_are_skipped() {
        let json = r#"{
            "versions": [
                { "version": 2, "platforms": { "linux-x64": "https://two" } },
                { "version": "1.0.0", "platforms": { "linux-x64": null, "darwin-arm64": "https://d" } },
                "1.9.0",
                { "version": "0.9.0", "platforms": ["https://nine"] }
            ]
        }"#;
        let manifest = VersionManifest::from_json(json).unwrap();
        assert_eq!(manifest.versions.len(), 3);
        assert!(manifest.versions[0].version.is_none());
        assert!(manifest.versions[2].platforms.is_empty());

        let latest = select_latest(&manifest).unwrap();
        assert_eq!(latest.version.to_string(), "1.0.0");
        assert_eq!(
            resolve_artifact_url(&latest.platforms, "darwin-arm64").unwrap(),
            "https://d"
        );
        assert!(matches!(
            resolve_artifact_url(&latest.platforms, "linux-x64"),
            Err(UpdateError::PlatformUnsupported(_))
        ));
    }
}
