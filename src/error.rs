use thiserror::Error;

/// Failures that abort startup. `main` prints the message on one line and
/// exits with status 1.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to create window: {0}")]
    Window(String),
    #[error("Failed to initialize graphics: {0}")]
    Graphics(String),
    #[error("{0}")]
    Usage(String),
}

impl StartupError {
    pub fn graphics(err: &anyhow::Error) -> Self {
        Self::Graphics(format!("{err:#}"))
    }
}
