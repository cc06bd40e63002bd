//! Parallel Execution Configuration
//!
//! Worker count, ordering, queue capacity and reordering strategy for the
//! parallel operators. Values are set through an option list or the
//! equivalent `with_*` builders; an invalid value leaves the previous setting
//! in place instead of failing.

use std::num::NonZeroUsize;

/// Fallback worker count when the platform cannot report its parallelism
const FALLBACK_CONCURRENCY: usize = 4;

/// A single configuration option
///
/// Options are applied in order; later options override earlier ones and
/// invalid ones are no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParallelOption {
    /// Number of concurrent workers (must be positive)
    Concurrency(usize),
    /// Whether output order must match input order
    Ordered(bool),
    /// Capacity of the bounded work and result queues (must be positive)
    BufferSize(usize),
    /// Ordered-mode reordering window: `0` streams with an unbounded pending
    /// table, `n > 0` processes fixed batches of `n` elements
    ChunkSize(usize),
}

/// Configuration for the parallel operators
///
/// ```
/// use seqflow_core::parallel::{ParallelConfig, ParallelOption};
///
/// let config = ParallelConfig::from_options([
///     ParallelOption::Concurrency(4),
///     ParallelOption::Concurrency(0), // ignored
///     ParallelOption::ChunkSize(16),
/// ]);
/// assert_eq!(config.concurrency(), 4);
/// assert_eq!(config.chunk_size(), 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParallelConfig {
    concurrency: usize,
    ordered: bool,
    buffer_size: Option<usize>,
    chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism()
                .map_or(FALLBACK_CONCURRENCY, NonZeroUsize::get),
            ordered: true,
            buffer_size: None,
            chunk_size: 0,
        }
    }
}

impl ParallelConfig {
    /// Create a configuration with default values
    ///
    /// Defaults: one worker per available CPU, ordered output, queue capacity
    /// of twice the worker count, streaming reordering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from an option list, starting from the defaults
    #[must_use]
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ParallelOption>,
    {
        Self::default().with_options(options)
    }

    /// Apply an option list on top of this configuration
    #[must_use]
    pub fn with_options<I>(self, options: I) -> Self
    where
        I: IntoIterator<Item = ParallelOption>,
    {
        options.into_iter().fold(self, Self::with_option)
    }

    /// Apply a single option
    #[must_use]
    pub fn with_option(self, option: ParallelOption) -> Self {
        match option {
            ParallelOption::Concurrency(n) => self.with_concurrency(n),
            ParallelOption::Ordered(ordered) => self.with_ordered(ordered),
            ParallelOption::BufferSize(n) => self.with_buffer_size(n),
            ParallelOption::ChunkSize(n) => self.with_chunk_size(n),
        }
    }

    /// Set the worker count (zero is ignored)
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        if concurrency > 0 {
            self.concurrency = concurrency;
        }
        self
    }

    /// Choose ordered or unordered output
    #[must_use]
    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Set the queue capacity (zero is ignored)
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        if buffer_size > 0 {
            self.buffer_size = Some(buffer_size);
        }
        self
    }

    /// Set the chunk size for ordered mode (`0` selects streaming reordering)
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Number of concurrent workers
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Whether output order matches input order
    #[must_use]
    pub fn ordered(&self) -> bool {
        self.ordered
    }

    /// Effective queue capacity
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(self.concurrency * 2)
    }

    /// Ordered-mode chunk size (`0` = streaming)
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Whether ordered output uses bounded chunked reordering
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.ordered && self.chunk_size > 0
    }
}
