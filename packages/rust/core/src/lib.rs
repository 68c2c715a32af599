//! Pipeline orchestration for contactpipe.
//!
//! Wires the source, transform, store, and upload crates into the two run
//! halves the CLI exposes: `ingest` and `upload`.

pub mod pipeline;

pub use pipeline::{
    IngestOptions, IngestSummary, ProgressReporter, SilentProgress, UploadOptions, UploadSummary,
    run_ingest, run_upload,
};
