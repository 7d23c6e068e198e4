use std::fs;
use std::path::{Path, PathBuf};

use crate::takeoutfix_core::classify::classify;
use crate::takeoutfix_core::error::{Result, TakeoutError};
use crate::takeoutfix_core::walk::list_files;

/// Marker the export appends to the stem of an edited copy.
const EDITED_MARKER: &str = "-edited";

/// Path of the edited copy that shadows `media_path`.
///
/// Example: edited_sibling("a/photo.jpg") -> "a/photo-edited.jpg"
pub fn edited_sibling(media_path: &Path) -> Option<PathBuf> {
    let stem = media_path.file_stem()?.to_str()?;
    let name = match media_path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, EDITED_MARKER, ext),
        None => format!("{}{}", stem, EDITED_MARKER),
    };
    Some(media_path.with_file_name(name))
}

/// Delete every `name-edited.ext` that sits next to a media file `name.ext`.
///
/// This is destructive: the edited copies are removed from disk, not
/// moved. Returns the deleted paths.
pub fn cleanup_edited(root: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut deleted = Vec::new();

    for path in list_files(root, exclude)? {
        if !classify(&path).is_media() {
            continue;
        }

        let Some(edited) = edited_sibling(&path) else {
            continue;
        };

        if edited.is_file() {
            fs::remove_file(&edited).map_err(TakeoutError::file_op("delete", &edited))?;
            println!("Deleted edited copy {}", edited.display());
            log::info!("Deleted {} (edited copy of {})", edited.display(), path.display());
            deleted.push(edited);
        }
    }

    Ok(deleted)
}
