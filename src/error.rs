use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowseError>;

/// Failures surfaced while listing or reading a remote repository.
///
/// None of these are fatal to a browsing session: the UI turns them into a
/// notification and the user retries by repeating the action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowseError {
    #[error("access to {0} was denied (missing or expired token)")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid repository '{0}', expected owner/name[@branch]")]
    InvalidRepository(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl BrowseError {
    /// Short text suitable for a status line.
    pub fn user_message(&self) -> String {
        match self {
            BrowseError::Auth(_) => {
                "Connect your GitHub account: set GITHUB_TOKEN or `token` in the config file"
                    .to_string()
            }
            BrowseError::Network(msg) => format!("Network error (press r to retry): {msg}"),
            BrowseError::NotFound(path) => format!("Could not load file: {path}"),
            BrowseError::InvalidRepository(_) | BrowseError::Decode(_) => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for BrowseError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BrowseError::Decode(e.to_string())
        } else {
            BrowseError::Network(e.to_string())
        }
    }
}
