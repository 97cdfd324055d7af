use cdcflat_api::error::PluginError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("config error: {0}")]
    Config(String),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Add context to the error.
    ///
    /// For `Plugin`, context goes to the inner `PluginError`.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            HostError::Plugin(e) => HostError::Plugin(e.with_context(ctx)),
            HostError::Config(msg) => HostError::Config(format!("{ctx}: {msg}")),
            HostError::Io(e) => HostError::Io(std::io::Error::new(e.kind(), format!("{ctx}: {e}"))),
        }
    }
}
