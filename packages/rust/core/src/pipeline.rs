//! End-to-end pipeline orchestration.
//!
//! Ingest: fetch rows → dedupe by email → map to canonical contacts → one
//! bulk write to the intermediate store. Upload: load store → validate →
//! batched upsert to the CRM. The two halves can run in separate process
//! invocations; the store file is their only shared surface.

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{info, instrument};

use contactpipe_shared::{ContactPipeError, Result, RunId};
use contactpipe_source::SheetsClient;
use contactpipe_store::ContactStore;
use contactpipe_transform::{DedupeIndex, columns, map_row, validate_all};
use contactpipe_upload::{BatchResult, CrmClient, partition_sizes};

// ---------------------------------------------------------------------------
// Options & summaries
// ---------------------------------------------------------------------------

/// Options for an ingest run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Where the intermediate store is written.
    pub store_path: PathBuf,
    /// Reference date for age derivation. One value per run, fixed up front,
    /// so a re-run over an unchanged source reproduces the store byte for
    /// byte.
    pub reference_date: NaiveDate,
}

/// Summary of a completed ingest run.
#[derive(Debug)]
pub struct IngestSummary {
    /// Run identifier.
    pub run_id: RunId,
    /// Data rows seen in the fetched range.
    pub rows_seen: usize,
    /// Rows admitted after email dedupe.
    pub rows_admitted: usize,
    /// Path of the written store, when one was written.
    pub store_path: PathBuf,
    /// SHA-256 of the written store file, when one was written.
    pub store_hash: Option<String>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Options for an upload run.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Where the intermediate store is read from.
    pub store_path: PathBuf,
    /// Maximum contacts per upsert batch.
    pub max_batch_size: usize,
    /// Partition and report without submitting anything.
    pub dry_run: bool,
}

/// Summary of a completed upload run.
#[derive(Debug)]
pub struct UploadSummary {
    /// Run identifier.
    pub run_id: RunId,
    /// Contacts loaded from the store.
    pub records_loaded: usize,
    /// Contacts that passed required-field validation.
    pub records_validated: usize,
    /// Contacts dropped by validation.
    pub records_rejected: usize,
    /// Per-batch outcomes, in submission order (empty on a dry run).
    pub batches: Vec<BatchResult>,
    /// Batch sizes that were (or, on a dry run, would be) submitted.
    pub planned_batches: Vec<usize>,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

impl UploadSummary {
    /// Number of batches the CRM accepted.
    pub fn batches_sent(&self) -> usize {
        self.batches.iter().filter(|b| b.success).count()
    }

    /// Number of batches that failed.
    pub fn batches_failed(&self) -> usize {
        self.batches.len() - self.batches_sent()
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a row is admitted past the dedupe index.
    fn row_admitted(&self, email: &str, admitted: usize);
    /// Called after each batch submission.
    fn batch_done(&self, current: usize, total: usize, success: bool);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn row_admitted(&self, _email: &str, _admitted: usize) {}
    fn batch_done(&self, _current: usize, _total: usize, _success: bool) {}
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Run the ingest half: fetch, dedupe, map, persist.
///
/// A source failure aborts the run; an empty range is a normal terminal
/// outcome that leaves the store untouched.
#[instrument(skip_all, fields(store = %options.store_path.display()))]
pub async fn run_ingest(
    source: &SheetsClient,
    options: &IngestOptions,
    progress: &dyn ProgressReporter,
) -> Result<IngestSummary> {
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, reference_date = %options.reference_date, "starting ingest run");

    progress.phase("Fetching rows");
    let table = source.fetch_rows().await?;

    if table.is_empty() {
        info!(%run_id, "no data found, nothing to ingest");
        return Ok(IngestSummary {
            run_id,
            rows_seen: 0,
            rows_admitted: 0,
            store_path: options.store_path.clone(),
            store_hash: None,
            elapsed: start.elapsed(),
        });
    }

    progress.phase("Deduplicating and mapping");
    let rows_seen = table.row_count();
    let mut index = DedupeIndex::new();
    let mut contacts = Vec::new();

    for row in table.rows() {
        if !index.admit(row.get(columns::EMAIL)) {
            continue;
        }
        let contact = map_row(&row, options.reference_date);
        progress.row_admitted(&contact.properties.email, contacts.len() + 1);
        contacts.push(contact);
    }

    progress.phase("Writing intermediate store");
    let store = ContactStore::new(&options.store_path);
    store.write(&contacts)?;
    let store_hash = store.content_hash()?;

    let summary = IngestSummary {
        run_id,
        rows_seen,
        rows_admitted: contacts.len(),
        store_path: options.store_path.clone(),
        store_hash: Some(store_hash),
        elapsed: start.elapsed(),
    };

    info!(
        run_id = %summary.run_id,
        rows_seen = summary.rows_seen,
        rows_admitted = summary.rows_admitted,
        elapsed_ms = summary.elapsed.as_millis(),
        "ingest run complete"
    );

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Run the upload half: load, validate, batch, submit.
///
/// `crm` goes unused on a dry run. Per-batch failures are reported in the
/// summary, never raised as errors.
#[instrument(skip_all, fields(store = %options.store_path.display(), dry_run = options.dry_run))]
pub async fn run_upload(
    crm: &CrmClient,
    options: &UploadOptions,
    progress: &dyn ProgressReporter,
) -> Result<UploadSummary> {
    let start = Instant::now();
    let run_id = RunId::new();

    if options.max_batch_size == 0 {
        return Err(ContactPipeError::validation(
            "max batch size must be at least 1",
        ));
    }

    info!(%run_id, max_batch_size = options.max_batch_size, "starting upload run");

    progress.phase("Loading intermediate store");
    let store = ContactStore::new(&options.store_path);
    let loaded = store.read()?;
    let records_loaded = loaded.len();

    progress.phase("Validating contacts");
    let outcome = validate_all(loaded);
    info!(
        validated = outcome.accepted.len(),
        rejected = outcome.rejected,
        "validation complete"
    );

    let planned_batches = partition_sizes(outcome.accepted.len(), options.max_batch_size);

    let batches = if options.dry_run {
        progress.phase("Dry run: skipping submission");
        info!(batches = planned_batches.len(), "dry run, nothing submitted");
        Vec::new()
    } else {
        progress.phase("Submitting batches");
        let upload = crm
            .upload(&outcome.accepted, options.max_batch_size)
            .await?;
        let total = upload.batches.len();
        for batch in &upload.batches {
            progress.batch_done(batch.index + 1, total, batch.success);
        }
        upload.batches
    };

    let summary = UploadSummary {
        run_id,
        records_loaded,
        records_validated: outcome.accepted.len(),
        records_rejected: outcome.rejected,
        batches,
        planned_batches,
        dry_run: options.dry_run,
        elapsed: start.elapsed(),
    };

    info!(
        run_id = %summary.run_id,
        records_validated = summary.records_validated,
        records_rejected = summary.records_rejected,
        batches_sent = summary.batches_sent(),
        batches_failed = summary.batches_failed(),
        elapsed_ms = summary.elapsed.as_millis(),
        "upload run complete"
    );

    Ok(summary)
}
