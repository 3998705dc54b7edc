//! Surgery report pipeline: transcript extraction, timestamp enrichment
//! and PDF rendering.

pub mod assembler;
pub mod renderer;
pub mod timezone;

pub use assembler::{AssembledReport, ReportAssembler, ReportRow, SkippedToolCall};
pub use renderer::{Letterhead, PatientDetails, RenderedReport, render, report_filename};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Transcript unavailable: {0}")]
    Transcript(String),

    #[error("Operation {0} not found")]
    OperationNotFound(i32),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Failed to render report: {0}")]
    Render(String),
}
