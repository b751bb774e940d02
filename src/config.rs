use crate::types::PodId;
use tracing::warn;

const PREFIX_VAR: &str = "TASKPOD_THREAD_PREFIX";
const STACK_SIZE_VAR: &str = "TASKPOD_STACK_SIZE";

/// Settings for the threads pods run on.
///
/// The default names threads `taskpod-<id>` and leaves the stack size to the
/// platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodConfig {
    thread_name_prefix: String,
    stack_size: Option<usize>,
}

impl Default for PodConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: Self::DEFAULT_THREAD_PREFIX.to_owned(),
            stack_size: None,
        }
    }
}

impl PodConfig {
    /// Prefix used when none is configured.
    pub const DEFAULT_THREAD_PREFIX: &'static str = "taskpod";

    /// Same as [`PodConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `TASKPOD_THREAD_PREFIX` and `TASKPOD_STACK_SIZE` from the
    /// environment, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(prefix) = lookup(PREFIX_VAR).filter(|p| !p.trim().is_empty()) {
            config = config.with_thread_name_prefix(prefix.trim());
        }
        if let Some(raw) = lookup(STACK_SIZE_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(bytes) if bytes > 0 => config.stack_size = Some(bytes),
                _ => warn!(value = %raw, "ignoring invalid {STACK_SIZE_VAR}"),
            }
        }
        config
    }

    /// Set the thread name prefix. NUL bytes are removed, thread names
    /// cannot carry them.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        prefix.retain(|c| c != '\0');
        self.thread_name_prefix = prefix;
        self
    }

    /// Set the stack size, in bytes, of every pod thread.
    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Configured thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(&self) -> &str {
        &self.thread_name_prefix
    }

    /// Configured stack size, if any.
    #[must_use]
    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    pub(crate) fn thread_name(&self, id: PodId) -> String {
        format!("{}-{id}", self.thread_name_prefix)
    }
}
