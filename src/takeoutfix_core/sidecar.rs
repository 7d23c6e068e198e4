use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::takeoutfix_core::classify::SIDECAR_EXTENSION;

/// The part of the export's JSON sidecar we care about.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct SidecarRecord {
    #[serde(default)]
    photo_taken_time: Option<TakenTime>,
}

#[derive(Deserialize, Debug)]
struct TakenTime {
    /// Epoch seconds; the export writes a string, older dumps a number.
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Path of the sidecar that belongs to a media file: `<media>.json`.
///
/// Example: sidecar_path("a/IMG_1.jpg") -> "a/IMG_1.jpg.json"
pub fn sidecar_path(media_path: &Path) -> PathBuf {
    let mut name = media_path.as_os_str().to_owned();
    name.push(".");
    name.push(SIDECAR_EXTENSION);
    PathBuf::from(name)
}

/// Read the capture time from the sidecar next to `media_path`.
///
/// A missing file, unreadable JSON, or a missing or non-numeric timestamp
/// all yield `None`.
pub fn resolve_sidecar(media_path: &Path) -> Option<OffsetDateTime> {
    let path = sidecar_path(media_path);
    let contents = fs::read(&path).ok()?;
    let timestamp = parse_sidecar(&contents)?;
    log::debug!("Sidecar {} gives timestamp {}", path.display(), timestamp);
    Some(timestamp)
}

/// Extract `photoTakenTime.timestamp` from raw sidecar bytes.
pub fn parse_sidecar(bytes: &[u8]) -> Option<OffsetDateTime> {
    let record: SidecarRecord = serde_json::from_slice(bytes).ok()?;
    let value = record.photo_taken_time?.timestamp?;

    let seconds = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };

    OffsetDateTime::from_unix_timestamp(seconds).ok()
}
