use filetime::FileTime;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::takeoutfix_core::classify::Category;
use crate::takeoutfix_core::error::{Result, TakeoutError};
use crate::takeoutfix_core::exif::{capture_tags, get_local_offset, MetadataService};
use crate::takeoutfix_core::resolve::{resolve, TimestampSource};

/// Bucket for files whose capture time was recovered.
pub const RESOLVED_DIR: &str = "all";

/// Bucket for files with no recoverable capture time.
pub const UNRESOLVED_DIR: &str = "unknown";

/// The two output buckets under an output root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolved_dir(&self) -> PathBuf {
        self.root.join(RESOLVED_DIR)
    }

    pub fn unresolved_dir(&self) -> PathBuf {
        self.root.join(UNRESOLVED_DIR)
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Resolved {
        destination: PathBuf,
        source: TimestampSource,
    },
    Unresolved {
        destination: PathBuf,
    },
}

/// Fix up one file: recover its capture time, stamp it, and move it into
/// the matching output bucket.
///
/// Metadata write failures are logged and do not stop the move. File
/// system failures are returned.
pub fn reconcile(
    service: &mut dyn MetadataService,
    layout: &OutputLayout,
    path: &Path,
    category: Category,
) -> Result<Outcome> {
    if !category.is_media() {
        return Ok(Outcome::Skipped);
    }

    log::info!("Processing {} ({})", path.display(), category);

    let resolved = resolve(service, path, category);
    let Some(timestamp) = resolved.timestamp else {
        log::info!("No capture time for {}", path.display());
        let destination = relocate(path, &layout.unresolved_dir())?;
        return Ok(Outcome::Unresolved { destination });
    };

    if category == Category::Image {
        write_capture_time(service, path, timestamp, resolved.source);
    }

    let destination = relocate(path, &layout.resolved_dir())?;
    set_file_times(&destination, timestamp)?;

    log::debug!(
        "{} -> {} ({} from {})",
        path.display(),
        destination.display(),
        timestamp,
        resolved.source
    );

    Ok(Outcome::Resolved {
        destination,
        source: resolved.source,
    })
}

/// Embedded times are written back in their own offset. Sidecar times are
/// epoch seconds and get the local offset.
fn write_capture_time(
    service: &mut dyn MetadataService,
    path: &Path,
    timestamp: OffsetDateTime,
    source: TimestampSource,
) {
    let timestamp = match source {
        TimestampSource::Sidecar => timestamp.to_offset(get_local_offset()),
        _ => timestamp,
    };
    let result = capture_tags(timestamp).and_then(|tags| service.write(path, &tags));
    if let Err(e) = result {
        log::warn!("Could not write capture time to {}: {}", path.display(), e);
    }
}

/// Set both access and modification time of `path`.
pub fn set_file_times(path: &Path, timestamp: OffsetDateTime) -> Result<()> {
    let ft = FileTime::from_unix_time(timestamp.unix_timestamp(), timestamp.nanosecond());
    filetime::set_file_times(path, ft, ft).map_err(TakeoutError::file_op("set times on", path))
}

/// Move `path` into `dir` under a name that does not exist yet.
pub fn relocate(path: &Path, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(TakeoutError::file_op("create directory", dir))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| TakeoutError::PathNotFound(path.to_path_buf()))?;
    let destination = unique_destination(dir, file_name);

    match fs::rename(path, &destination) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(path, &destination).map_err(TakeoutError::file_op("copy", path))?;
            fs::remove_file(path).map_err(TakeoutError::file_op("remove", path))?;
        }
        Err(e) => return Err(TakeoutError::file_op("rename", path)(e)),
    }

    Ok(destination)
}

/// First free path for `file_name` in `dir`, appending `_1`, `_2`, ... to
/// the stem on collision. Names are kept byte for byte.
///
/// Example: "IMG_1.jpg" taken -> "IMG_1_1.jpg"; that too -> "IMG_1_2.jpg"
pub fn unique_destination(dir: &Path, file_name: impl AsRef<OsStr>) -> PathBuf {
    let file_name = file_name.as_ref();
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name.file_stem().unwrap_or(file_name);
    let ext = name.extension();

    let mut counter = 1u32;
    loop {
        let mut new_name = OsString::from(stem);
        new_name.push(format!("_{}", counter));
        if let Some(ext) = ext {
            new_name.push(".");
            new_name.push(ext);
        }
        let candidate = dir.join(new_name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
