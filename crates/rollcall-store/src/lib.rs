//! rollcall-store — Persistence for the attendance tool.
//!
//! Three stores, all append-or-overwrite and none transactional:
//! the person registry (in-memory table + append-only details file), the
//! face store (in-memory samples + one image file per ID), and the
//! attendance ledger (append-only text file).

pub mod faces;
pub mod ledger;
pub mod registry;

use std::path::PathBuf;
use thiserror::Error;

pub use faces::FaceStore;
pub use ledger::{AttendanceLedger, TIMESTAMP_FORMAT};
pub use registry::PersonRegistry;

/// Persistence failures. All of them are recoverable: the in-memory state is
/// already updated when one of these is returned, and the caller decides how
/// loudly to surface the lost record.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to append to details file {path}: {source}")]
    DetailsAppend {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write reference image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("reference image dimensions {width}x{height} do not fit {len} bytes")]
    InvalidSample { width: u32, height: u32, len: usize },
    #[error("failed to append to attendance ledger {path}: {source}")]
    LedgerAppend {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
