//! Executor configuration.

use std::num::NonZeroUsize;
use std::sync::OnceLock;

/// Environment variable overriding [`ExecutorConfig::parallelism`].
pub const PARALLELISM_ENV: &str = "RIVULET_PARALLELISM";

/// Environment variable overriding [`ExecutorConfig::min_split_len`].
pub const MIN_SPLIT_LEN_ENV: &str = "RIVULET_MIN_SPLIT_LEN";

/// Configuration for parallel evaluation.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of sub-ranges (and worker threads) per evaluation.
    pub parallelism: usize,
    /// Sub-ranges are never split smaller than this many elements.
    pub min_split_len: usize,
    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            min_split_len: 1,
            thread_name: "rivulet-worker".to_string(),
        }
    }
}

impl ExecutorConfig {
    /// A config that never splits.
    pub fn sequential() -> Self {
        Self::default().with_parallelism(1)
    }

    /// Defaults, overridden by `RIVULET_PARALLELISM` and `RIVULET_MIN_SPLIT_LEN`.
    ///
    /// Unparseable or zero values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let setting = |key: &str| lookup(key).and_then(|raw| parse_setting(key, &raw));
        if let Some(n) = setting(PARALLELISM_ENV) {
            config.parallelism = n;
        }
        if let Some(n) = setting(MIN_SPLIT_LEN_ENV) {
            config.min_split_len = n;
        }
        config
    }

    /// The config new pipelines start with: [`from_env`](Self::from_env),
    /// read once per process.
    pub(crate) fn process_default() -> Self {
        static CONFIG: OnceLock<ExecutorConfig> = OnceLock::new();
        CONFIG.get_or_init(Self::from_env).clone()
    }

    /// Set the maximum number of sub-ranges.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set the minimum sub-range length.
    pub fn with_min_split_len(mut self, min_split_len: usize) -> Self {
        self.min_split_len = min_split_len.max(1);
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

fn parse_setting(key: &str, raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key = %key, value = %raw, "ignoring invalid executor setting");
            None
        }
    }
}
