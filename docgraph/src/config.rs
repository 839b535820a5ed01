use std::time::Duration;

/// Limits applied to every submission of a [`Parser`](crate::Parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    concurrency: usize,
    timeout: Option<Duration>,
    max_depth: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: None,
            max_depth: Some(32),
        }
    }
}

impl ParserConfig {
    /// Maximum number of records of one list normalized at the same time. The limit applies per
    /// list, so nested joins may have `concurrency` records in flight at every level.
    ///
    /// A value of 0 is treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fails every store round-trip that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Rejects top-level keys nested deeper than `max_depth` levels.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn without_max_depth(mut self) -> Self {
        self.max_depth = None;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}
