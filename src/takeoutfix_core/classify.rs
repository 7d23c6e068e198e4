use std::path::Path;

/// Image file extensions (lowercase).
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "gif"];

/// Video file extensions (lowercase).
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi"];

/// Sidecar extension written by the export next to each media file.
pub const SIDECAR_EXTENSION: &str = "json";

/// Suffix exiftool leaves on the backup copy after rewriting a file.
const ORIGINAL_BACKUP_SUFFIX: &str = "_original";

/// Archive folders whose contents are never processed.
const IGNORED_SEGMENTS: &[&str] = &["/Bin/", "/Archive/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Image,
    Video,
    Sidecar,
    Ignored,
    Unhandled,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Sidecar => "sidecar",
            Category::Ignored => "ignored",
            Category::Unhandled => "unhandled",
        }
    }

    /// Images and videos are the only categories that get reconciled.
    pub fn is_media(&self) -> bool {
        matches!(self, Category::Image | Category::Video)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lower-cased extension of a path, without the leading dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Classify a path by extension and location.
pub fn classify(path: &Path) -> Category {
    let Some(ext) = extension_of(path) else {
        return Category::Ignored;
    };

    if ext.ends_with(ORIGINAL_BACKUP_SUFFIX) {
        return Category::Ignored;
    }

    let lossy = path.to_string_lossy();
    let normalized = lossy.replace('\\', "/");
    if IGNORED_SEGMENTS.iter().any(|seg| normalized.contains(seg)) {
        return Category::Ignored;
    }

    if ext == SIDECAR_EXTENSION {
        return Category::Sidecar;
    }

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Category::Image;
    }

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Category::Video;
    }

    Category::Unhandled
}
