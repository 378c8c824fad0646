use std::collections::BTreeSet;
use std::fmt;

/// Settings read by the HTTP gate and the filter pipeline.
///
/// Built once from the validated process configuration and never mutated.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub read_only: bool,
    pub api_token: Option<String>,
    pub allowed_origins: BTreeSet<String>,
}

impl RuntimeConfig {
    #[must_use]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    #[must_use]
    pub fn with_allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("read_only", &self.read_only)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}
