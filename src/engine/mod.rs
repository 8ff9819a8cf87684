//! The reconciliation loop: what to fetch, when, and what to analyse next.

mod backfill;
mod incremental;
mod ingest;
mod pending;
mod scheduler;

pub use {
    backfill::BackfillReconciler,
    incremental::IncrementalFetcher,
    ingest::Ingested,
    pending::PendingAnalysisQueue,
    scheduler::{CycleReport, Scheduler},
};
