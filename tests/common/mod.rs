use assert_fs::TempDir;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::*;

pub const SIDECAR: &str = r#"{"photoTakenTime":{"timestamp":"1531234567"}}"#;

/// An export tree with one dated video, one undated video and an edited copy.
pub fn setup_export(temp_dir: &TempDir) -> ChildPath {
    let root = temp_dir.child("data");
    root.child("Photos from 2018/clip.mp4").write_str("video").unwrap();
    root.child("Photos from 2018/clip.mp4.json").write_str(SIDECAR).unwrap();
    root.child("Photos from 2018/clip-edited.mp4").write_str("edit").unwrap();
    root.child("Photos from 2019/other.mov").write_str("video").unwrap();
    root
}
