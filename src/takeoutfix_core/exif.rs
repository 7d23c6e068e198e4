use crate::takeoutfix_core::error::{Result, TakeoutError};
use exiftool::ExifTool;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Date format used in EXIF data.
const EXIF_DATE_FORMAT: &[time::format_description::FormatItem] =
    time::macros::format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");

const EXIF_OFFSET_FORMAT: &[time::format_description::FormatItem] =
    time::macros::format_description!("[offset_hour sign:mandatory]:[offset_minute]");

/// Capture-time tag read and written by the pipeline.
pub const CAPTURE_TIME_TAG: &str = "DateTimeOriginal";

/// Timezone companion of the capture-time tag.
pub const CAPTURE_OFFSET_TAG: &str = "OffsetTimeOriginal";

/// A single metadata value. Backends hand back capture times either as the
/// raw EXIF string or already parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    DateTime(OffsetDateTime),
    Number(f64),
}

/// Tag name to value.
pub type Tags = BTreeMap<String, TagValue>;

/// Read/write access to embedded metadata.
pub trait MetadataService {
    fn read(&mut self, path: &Path) -> Result<Tags>;
    fn write(&mut self, path: &Path, tags: &Tags) -> Result<()>;
}

/// Metadata backed by a long-lived exiftool process.
///
/// The process is shut down when this value is dropped.
pub struct ExifToolService {
    tool: ExifTool,
}

impl ExifToolService {
    pub fn new() -> Result<Self> {
        let tool = ExifTool::new().map_err(|e| TakeoutError::Exiftool(e.to_string()))?;
        Ok(ExifToolService { tool })
    }
}

impl MetadataService for ExifToolService {
    fn read(&mut self, path: &Path) -> Result<Tags> {
        let raw: HashMap<String, Value> = self
            .tool
            .read_metadata(path, &["-DateTimeOriginal", "-OffsetTimeOriginal"])
            .map_err(|e| TakeoutError::Metadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let tags = raw
            .into_iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    Value::String(s) => TagValue::Text(s),
                    Value::Number(n) => TagValue::Number(n.as_f64()?),
                    _ => return None,
                };
                Some((name, value))
            })
            .collect();

        Ok(tags)
    }

    fn write(&mut self, path: &Path, tags: &Tags) -> Result<()> {
        for (name, value) in tags {
            let text = match value {
                TagValue::Text(s) => s.clone(),
                TagValue::DateTime(dt) => format_exif_date(dt)?,
                TagValue::Number(n) => n.to_string(),
            };
            self.tool
                .write_tag(path, name, text, &[])
                .map_err(|e| TakeoutError::Metadata {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// In-memory metadata with canned tags per path. Records every write.
#[derive(Debug, Default)]
pub struct StaticMetadata {
    tags: HashMap<PathBuf, Tags>,
    failing_reads: HashSet<PathBuf>,
    failing_writes: HashSet<PathBuf>,
    pub reads: Vec<PathBuf>,
    pub writes: Vec<(PathBuf, Tags)>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, path: impl Into<PathBuf>, name: &str, value: TagValue) -> Self {
        self.tags
            .entry(path.into())
            .or_default()
            .insert(name.to_string(), value);
        self
    }

    pub fn failing_read(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing_reads.insert(path.into());
        self
    }

    pub fn failing_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing_writes.insert(path.into());
        self
    }
}

impl MetadataService for StaticMetadata {
    fn read(&mut self, path: &Path) -> Result<Tags> {
        self.reads.push(path.to_path_buf());
        if self.failing_reads.contains(path) {
            return Err(TakeoutError::Metadata {
                path: path.to_path_buf(),
                reason: "unreadable metadata".to_string(),
            });
        }
        Ok(self.tags.get(path).cloned().unwrap_or_default())
    }

    fn write(&mut self, path: &Path, tags: &Tags) -> Result<()> {
        if self.failing_writes.contains(path) {
            return Err(TakeoutError::Metadata {
                path: path.to_path_buf(),
                reason: "write rejected".to_string(),
            });
        }
        self.writes.push((path.to_path_buf(), tags.clone()));
        Ok(())
    }
}

/// Read the embedded capture time of an image.
///
/// Backend failures are logged and treated as "no timestamp".
pub fn resolve_embedded(service: &mut dyn MetadataService, path: &Path) -> Option<OffsetDateTime> {
    match service.read(path) {
        Ok(tags) => capture_time(&tags),
        Err(e) => {
            log::warn!("Could not read metadata from {}: {}", path.display(), e);
            None
        }
    }
}

/// Extract the capture time from a tag set, whichever form it arrived in.
pub fn capture_time(tags: &Tags) -> Option<OffsetDateTime> {
    match tags.get(CAPTURE_TIME_TAG)? {
        TagValue::DateTime(dt) => Some(*dt),
        TagValue::Text(s) => {
            let offset = match tags.get(CAPTURE_OFFSET_TAG) {
                Some(TagValue::Text(o)) => Some(o.as_str()),
                _ => None,
            };
            parse_exif_date(s, offset).ok()
        }
        TagValue::Number(_) => None,
    }
}

/// Tags that record `timestamp` as the capture time, as clock time in the
/// timestamp's own offset.
pub fn capture_tags(timestamp: OffsetDateTime) -> Result<Tags> {
    let offset = timestamp
        .offset()
        .format(EXIF_OFFSET_FORMAT)
        .map_err(|e| TakeoutError::InvalidDateFormat(e.to_string()))?;

    let mut tags = Tags::new();
    tags.insert(CAPTURE_TIME_TAG.to_string(), TagValue::Text(format_exif_date(&timestamp)?));
    tags.insert(CAPTURE_OFFSET_TAG.to_string(), TagValue::Text(offset));
    Ok(tags)
}

/// Format a timestamp as an EXIF date in its own offset.
fn format_exif_date(dt: &OffsetDateTime) -> Result<String> {
    dt.format(EXIF_DATE_FORMAT)
        .map_err(|e| TakeoutError::InvalidDateFormat(e.to_string()))
}

/// Parse an EXIF date string with optional timezone offset.
///
/// Accepts the trailing subsecond and offset parts exiftool sometimes
/// appends, e.g. `2018:07:10 15:28:26.924+02:00`.
fn parse_exif_date(date_str: &str, offset_str: Option<&str>) -> Result<OffsetDateTime> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return Err(TakeoutError::InvalidDateFormat("empty date".to_string()));
    }

    let cut = date_str.len().min(19);
    if !date_str.is_char_boundary(cut) {
        return Err(TakeoutError::InvalidDateFormat(date_str.to_string()));
    }
    let (main, rest) = date_str.split_at(cut);
    let date_time = PrimitiveDateTime::parse(main, EXIF_DATE_FORMAT)
        .map_err(|e| TakeoutError::InvalidDateFormat(e.to_string()))?;

    let inline_offset = rest
        .trim_start_matches(|c: char| c == '.' || c.is_ascii_digit())
        .trim();
    let offset_str = if inline_offset.is_empty() {
        offset_str
    } else {
        Some(inline_offset)
    };

    let offset = match offset_str {
        Some("Z") => UtcOffset::UTC,
        Some(o) if !o.is_empty() => {
            UtcOffset::parse(o, EXIF_OFFSET_FORMAT).unwrap_or_else(|_| get_local_offset())
        }
        _ => get_local_offset(),
    };

    Ok(date_time.assume_offset(offset))
}

/// Get the local timezone offset, falling back to UTC if unavailable.
pub fn get_local_offset() -> UtcOffset {
    OffsetDateTime::now_local()
        .map(|dt| dt.offset())
        .unwrap_or(UtcOffset::UTC)
}
