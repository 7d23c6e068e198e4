use std::path::Path;
use time::OffsetDateTime;

use crate::takeoutfix_core::classify::Category;
use crate::takeoutfix_core::exif::{resolve_embedded, MetadataService};
use crate::takeoutfix_core::sidecar::resolve_sidecar;

/// Where a capture time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampSource {
    Embedded,
    Sidecar,
    None,
}

impl TimestampSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampSource::Embedded => "embedded",
            TimestampSource::Sidecar => "sidecar",
            TimestampSource::None => "none",
        }
    }
}

impl std::fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authoritative capture time of a file, if any, and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub timestamp: Option<OffsetDateTime>,
    pub source: TimestampSource,
}

impl ResolvedTimestamp {
    pub fn embedded(timestamp: OffsetDateTime) -> Self {
        ResolvedTimestamp {
            timestamp: Some(timestamp),
            source: TimestampSource::Embedded,
        }
    }

    pub fn sidecar(timestamp: OffsetDateTime) -> Self {
        ResolvedTimestamp {
            timestamp: Some(timestamp),
            source: TimestampSource::Sidecar,
        }
    }

    pub fn none() -> Self {
        ResolvedTimestamp {
            timestamp: None,
            source: TimestampSource::None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// Pick the capture time for a media file.
///
/// Images: embedded tag, then sidecar. Videos: sidecar only; their
/// embedded tags are never probed. Other categories resolve to none.
pub fn resolve(
    service: &mut dyn MetadataService,
    path: &Path,
    category: Category,
) -> ResolvedTimestamp {
    match category {
        Category::Image => {
            if let Some(ts) = resolve_embedded(service, path) {
                return ResolvedTimestamp::embedded(ts);
            }
            resolve_sidecar(path)
                .map(ResolvedTimestamp::sidecar)
                .unwrap_or_else(ResolvedTimestamp::none)
        }
        Category::Video => resolve_sidecar(path)
            .map(ResolvedTimestamp::sidecar)
            .unwrap_or_else(ResolvedTimestamp::none),
        _ => ResolvedTimestamp::none(),
    }
}
