use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Host(#[from] cdcflat_host::HostError),

    #[error("plugin: {0}")]
    Plugin(#[from] cdcflat_api::error::PluginError),

    #[error("input '{}': {source}", .path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },
}
