use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::takeoutfix_core::classify::{classify, Category};
use crate::takeoutfix_core::cleanup::cleanup_edited;
use crate::takeoutfix_core::error::{Result, TakeoutError};
use crate::takeoutfix_core::exif::MetadataService;
use crate::takeoutfix_core::reconcile::{reconcile, OutputLayout, Outcome};
use crate::takeoutfix_core::resolve::{resolve, TimestampSource};

/// Default traversal root.
pub const DEFAULT_ROOT: &str = "./data";

/// Default output root holding `all/` and `unknown/`.
pub const DEFAULT_OUTPUT: &str = "./output";

/// Settings for a fix run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    /// Delete `name-edited.ext` copies before reconciling.
    pub remove_edited: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            root: PathBuf::from(DEFAULT_ROOT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            remove_edited: true,
        }
    }
}

/// Result of the count pass: every file under the root, bucketed by category.
#[derive(Debug, Default)]
pub struct Survey {
    pub media: Vec<(PathBuf, Category)>,
    pub sidecars: usize,
    pub ignored: usize,
    pub unhandled: Vec<PathBuf>,
}

impl Survey {
    pub fn is_clean(&self) -> bool {
        self.unhandled.is_empty()
    }
}

/// Totals for a completed fix run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub deleted_edited: Vec<PathBuf>,
    pub resolved: HashMap<TimestampSource, usize>,
    pub unresolved: usize,
    pub skipped: usize,
}

impl RunReport {
    pub fn resolved_total(&self) -> usize {
        self.resolved.values().sum()
    }

    pub fn resolved_from(&self, source: TimestampSource) -> usize {
        self.resolved.get(&source).copied().unwrap_or(0)
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Resolved { source, .. } => *self.resolved.entry(*source).or_insert(0) += 1,
            Outcome::Unresolved { .. } => self.unresolved += 1,
        }
    }
}

/// Result of a read-only check.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub checked: usize,
    pub no_date: Vec<PathBuf>,
    pub unhandled: Vec<PathBuf>,
}

/// Every regular file under `root`, recursively, skipping the `exclude` tree.
pub fn list_files(root: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(TakeoutError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(TakeoutError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| exclude.is_none_or(|ex| entry.path() != ex));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Classify every file under `root` without touching anything.
pub fn survey(root: &Path, exclude: Option<&Path>) -> Result<Survey> {
    let mut result = Survey::default();

    for path in list_files(root, exclude)? {
        match classify(&path) {
            category @ (Category::Image | Category::Video) => result.media.push((path, category)),
            Category::Sidecar => result.sidecars += 1,
            Category::Ignored => result.ignored += 1,
            Category::Unhandled => {
                log::warn!("Unhandled file type: {}", path.display());
                result.unhandled.push(path);
            }
        }
    }

    Ok(result)
}

/// Output directory to leave out of traversal when it lives under `root`.
fn output_exclusion(root: &Path, output: &Path) -> Option<PathBuf> {
    let root = root.canonicalize().ok()?;
    let output = output.canonicalize().ok()?;
    output.starts_with(&root).then_some(output)
}

/// Root to walk and the tree to skip. Both are canonical when an exclusion
/// applies, so the exclusion matches what walkdir yields.
fn traversal_plan(root: &Path, output: &Path) -> Result<(PathBuf, Option<PathBuf>)> {
    match output_exclusion(root, output) {
        Some(exclude) => Ok((root.canonicalize()?, Some(exclude))),
        None => Ok((root.to_path_buf(), None)),
    }
}

/// Run the whole pipeline: edited-copy cleanup, count pass, reconciliation.
///
/// Nothing is moved when the count pass finds an unhandled file; the run
/// fails with [`TakeoutError::Unhandled`] instead.
pub fn run_fix(
    options: &RunOptions,
    service: &mut dyn MetadataService,
    bar: &ProgressBar,
) -> Result<RunReport> {
    let layout = OutputLayout::new(&options.output);
    let mut report = RunReport::default();

    let (root, exclude) = traversal_plan(&options.root, layout.root())?;

    if options.remove_edited {
        log::info!("Removing edited copies under {}", root.display());
        report.deleted_edited = cleanup_edited(&root, exclude.as_deref())?;
    }

    log::info!("Counting files under {}", root.display());
    let found = survey(&root, exclude.as_deref())?;
    if !found.is_clean() {
        return Err(TakeoutError::Unhandled(found.unhandled));
    }

    log::info!(
        "Found {} media files, {} sidecars, {} ignored",
        found.media.len(),
        found.sidecars,
        found.ignored
    );

    let bar_style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(bar_style);
    bar.set_length(found.media.len() as u64);

    for (path, category) in &found.media {
        bar.set_message(path.display().to_string());
        let outcome = reconcile(service, &layout, path, *category)?;
        report.record(&outcome);
        bar.inc(1);
    }

    bar.finish_with_message("Timestamps fixed");
    Ok(report)
}

/// Report which media files have no recoverable capture time, and which
/// files are of an unhandled type. Read-only. An `output` tree inside
/// `root` is skipped, as in [`run_fix`].
pub fn check(
    root: &Path,
    output: &Path,
    service: &mut dyn MetadataService,
    bar: &ProgressBar,
) -> Result<CheckReport> {
    let (root, exclude) = traversal_plan(root, output)?;
    let found = survey(&root, exclude.as_deref())?;
    let mut report = CheckReport {
        unhandled: found.unhandled,
        ..Default::default()
    };

    bar.set_length(found.media.len() as u64);
    for (path, category) in found.media {
        log::info!("Checking {}", path.display());
        if !resolve(service, &path, category).is_resolved() {
            log::info!("No date for {}", path.display());
            report.no_date.push(path);
        }
        report.checked += 1;
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::takeoutfix_core::exif::StaticMetadata;
    use assert_fs::prelude::*;

    const SIDECAR: &str = r#"{"photoTakenTime":{"timestamp":"1531234567"}}"#;

    fn options(temp: &assert_fs::TempDir) -> RunOptions {
        RunOptions {
            root: temp.path().join("data"),
            output: temp.path().join("output"),
            remove_edited: true,
        }
    }

    #[test]
    fn test_list_files_recurses_and_excludes() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("a.jpg").touch().unwrap();
        temp.child("x/y/b.mov").touch().unwrap();
        temp.child("skip/c.jpg").touch().unwrap();

        let mut files = list_files(temp.path(), Some(&temp.path().join("skip"))).unwrap();
        files.sort();
        assert_eq!(
            files,
            vec![temp.path().join("a.jpg"), temp.path().join("x/y/b.mov")]
        );
    }

    #[test]
    fn test_list_files_missing_root() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = list_files(&temp.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, TakeoutError::PathNotFound(_)));

        temp.child("file.jpg").touch().unwrap();
        let err = list_files(&temp.path().join("file.jpg"), None).unwrap_err();
        assert!(matches!(err, TakeoutError::NotADirectory(_)));
    }

    #[test]
    fn test_survey_buckets() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("IMG_1.jpg").touch().unwrap();
        temp.child("IMG_1.jpg.json").touch().unwrap();
        temp.child("clip.mp4").touch().unwrap();
        temp.child("IMG_1.jpg_original").touch().unwrap();
        temp.child("notes.txt").touch().unwrap();

        let found = survey(temp.path(), None).unwrap();
        assert_eq!(found.media.len(), 2);
        assert_eq!(found.sidecars, 1);
        assert_eq!(found.ignored, 1);
        assert_eq!(found.unhandled, vec![temp.path().join("notes.txt")]);
        assert!(!found.is_clean());
    }

    #[test]
    fn test_run_fix_end_to_end() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("data/2018/IMG_X.jpg").touch().unwrap();
        temp.child("data/2018/IMG_X.jpg.json").write_str(SIDECAR).unwrap();
        temp.child("data/2018/IMG_X-edited.jpg").touch().unwrap();
        temp.child("data/clips/clip.mov").touch().unwrap();
        temp.child("data/Bin/old.jpg").touch().unwrap();
        let mut meta = StaticMetadata::new();

        let report = run_fix(&options(&temp), &mut meta, &ProgressBar::hidden()).unwrap();

        assert_eq!(report.deleted_edited.len(), 1);
        assert_eq!(report.resolved_from(TimestampSource::Sidecar), 1);
        assert_eq!(report.resolved_total(), 1);
        assert_eq!(report.unresolved, 1);
        temp.child("output/all/IMG_X.jpg").assert(predicates::path::exists());
        temp.child("output/unknown/clip.mov").assert(predicates::path::exists());
        temp.child("data/2018/IMG_X-edited.jpg").assert(predicates::path::missing());
        temp.child("data/2018/IMG_X.jpg.json").assert(predicates::path::exists());
        temp.child("data/Bin/old.jpg").assert(predicates::path::exists());
        assert_eq!(meta.writes.len(), 1);
    }

    #[test]
    fn test_unhandled_file_blocks_every_move() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("data/IMG_X.jpg").touch().unwrap();
        temp.child("data/IMG_X.jpg.json").write_str(SIDECAR).unwrap();
        temp.child("data/notes.txt").touch().unwrap();
        let mut meta = StaticMetadata::new();

        let err = run_fix(&options(&temp), &mut meta, &ProgressBar::hidden()).unwrap_err();

        let TakeoutError::Unhandled(paths) = err else {
            panic!("expected unhandled error");
        };
        assert_eq!(paths, vec![temp.path().join("data/notes.txt")]);
        temp.child("data/IMG_X.jpg").assert(predicates::path::exists());
        temp.child("output").assert(predicates::path::missing());
        assert!(meta.reads.is_empty());
    }

    #[test]
    fn test_second_run_never_overwrites() {
        let temp = assert_fs::TempDir::new().unwrap();
        let mut meta = StaticMetadata::new();

        for content in ["first", "second"] {
            temp.child("data/IMG_1.jpg").write_str(content).unwrap();
            temp.child("data/IMG_1.jpg.json").write_str(SIDECAR).unwrap();
            run_fix(&options(&temp), &mut meta, &ProgressBar::hidden()).unwrap();
        }

        temp.child("output/all/IMG_1.jpg").assert("first");
        temp.child("output/all/IMG_1_1.jpg").assert("second");
    }

    #[test]
    fn test_output_inside_root_is_not_rediscovered() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("data/output/all/IMG_0.jpg").touch().unwrap();
        temp.child("data/clip.mov").touch().unwrap();
        let opts = RunOptions {
            root: temp.path().join("data"),
            output: temp.path().join("data/output"),
            remove_edited: false,
        };
        let mut meta = StaticMetadata::new();

        let report = run_fix(&opts, &mut meta, &ProgressBar::hidden()).unwrap();

        assert_eq!(report.unresolved, 1);
        assert_eq!(report.resolved_total(), 0);
        temp.child("data/output/all/IMG_0.jpg").assert(predicates::path::exists());
        temp.child("data/output/unknown/clip.mov").assert(predicates::path::exists());
    }

    #[test]
    fn test_keep_edited_leaves_copies() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("data/photo.jpg").touch().unwrap();
        temp.child("data/photo-edited.jpg").touch().unwrap();
        let opts = RunOptions {
            remove_edited: false,
            ..options(&temp)
        };
        let mut meta = StaticMetadata::new();

        let report = run_fix(&opts, &mut meta, &ProgressBar::hidden()).unwrap();

        assert!(report.deleted_edited.is_empty());
        assert_eq!(report.unresolved, 2);
        temp.child("output/unknown/photo-edited.jpg").assert(predicates::path::exists());
    }

    #[test]
    fn test_check_skips_output_inside_root() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("data/output/unknown/moved.mov").touch().unwrap();
        temp.child("data/output/notes.txt").touch().unwrap();
        temp.child("data/clip.mov").touch().unwrap();
        let mut meta = StaticMetadata::new();

        let report = check(
            &temp.path().join("data"),
            &temp.path().join("data/output"),
            &mut meta,
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(report.checked, 1);
        assert_eq!(report.no_date.len(), 1);
        assert!(report.no_date[0].ends_with("clip.mov"));
        assert!(report.unhandled.is_empty());
    }

    #[test]
    fn test_check_is_read_only() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("IMG_X.jpg").touch().unwrap();
        temp.child("IMG_X.jpg.json").write_str(SIDECAR).unwrap();
        temp.child("clip.mov").touch().unwrap();
        temp.child("notes.txt").touch().unwrap();
        let mut meta = StaticMetadata::new();

        let output = temp.path().join("output");
        let report = check(temp.path(), &output, &mut meta, &ProgressBar::hidden()).unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.no_date, vec![temp.path().join("clip.mov")]);
        assert_eq!(report.unhandled, vec![temp.path().join("notes.txt")]);
        temp.child("clip.mov").assert(predicates::path::exists());
        assert!(meta.writes.is_empty());
    }
}
