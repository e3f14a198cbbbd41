use std::path::PathBuf;

/// Common error type for wellframe data operations.
///
/// Covers lookups against the backing store, decoded-data integrity,
/// alignment failures, and cache I/O. Batch operations report these
/// per key rather than aborting on the first failure.
#[derive(Debug, thiserror::Error)]
pub enum WellframeError {
    /// The requested key has no backing row in the raw store
    #[error("no backing data for {0}")]
    Lookup(String),

    /// A blob decoded into a value violating shape/length/format assumptions
    #[error("integrity violation: {0}")]
    Integrity(String),

    /// Frame/feature length reconciliation exceeded the tolerance
    #[error(
        "could not align {feature}: {n_features} features != {n_timestamps} timestamps; ideal is {n_ideal}"
    )]
    AlignmentMismatch {
        feature: String,
        n_features: usize,
        n_timestamps: usize,
        n_ideal: usize,
    },

    /// A stringent-mode caller refused to proceed past a recoverable problem
    #[error("refusing request: {0}")]
    RefusingRequest(String),

    /// Failed reading a cache entry
    #[error("failed to read cache entry at {}", path.display())]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed writing a cache entry
    #[error("failed to write cache entry at {}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A requested run has zero wells, or a requested key set is empty
    #[error("empty collection: {0}")]
    EmptyCollection(String),

    /// Two parts of one request contradict each other
    #[error("contradictory request: {0}")]
    ContradictoryRequest(String),

    /// The operation is not defined for the given kind
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Result type for wellframe operations
pub type Result<T> = std::result::Result<T, WellframeError>;
