pub mod classify;
pub mod cleanup;
pub mod cli;
pub mod error;
pub mod exif;
pub mod reconcile;
pub mod resolve;
pub mod sidecar;
pub mod walk;

pub use classify::{classify, Category};
pub use cli::{Cli, Commands};
pub use error::{Result, TakeoutError};
pub use exif::{ExifToolService, MetadataService, StaticMetadata, TagValue, Tags};
pub use reconcile::{OutputLayout, Outcome};
pub use resolve::{ResolvedTimestamp, TimestampSource};
pub use walk::{check, run_fix, CheckReport, RunOptions, RunReport};
