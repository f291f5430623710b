//! Error taxonomy.

use thiserror::Error;

/// Render-level errors surfaced to the caller.
///
/// Recoverable conditions never appear here: mismatched tile or snapshot
/// dimensions are dropped as no-ops (stale work must not abort a render),
/// degenerate numeric samples are zeroed at the sample site, and
/// cancellation is a recognized terminal state reported through
/// `Renderer::is_cancelled()`, not an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Non-positive render target dimensions.
    #[error("invalid render target dimensions {width}x{height}")]
    InvalidDimension {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// `render()` was called while another render is in flight.
    #[error("a render is already in progress")]
    RenderInProgress,

    /// A tile task failed; reported after all sibling tiles finished. Tiles
    /// that completed have been committed and the buffer stays consistent.
    #[error("render worker failed: {0}")]
    WorkerFailure(String),
}

/// Convenience result type for render operations.
pub type Result<T> = std::result::Result<T, Error>;
