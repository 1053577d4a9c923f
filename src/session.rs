use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::repository::RepositoryRef;

const SESSION_FILENAME: &str = "session.json";

/// State carried between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub last_repository: Option<RepositoryRef>,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// `<data dir>/repopick/session.json`, if the platform has a data dir.
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|dir| SessionStore::new(dir.join("repopick").join(SESSION_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable state yields the empty state.
    pub fn load(&self) -> SessionState {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return SessionState::default(),
            Err(e) => {
                log::warn!("Could not read {}: {}", self.path.display(), e);
                return SessionState::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
            SessionState::default()
        })
    }

    pub fn save(&self, state: &SessionState) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(state).map_err(io::Error::other)?;
        fs::write(&self.path, text)
    }

    pub fn remember_repository(&self, repo: &RepositoryRef) -> io::Result<()> {
        let mut state = self.load();
        if state.last_repository.as_ref() == Some(repo) {
            return Ok(());
        }
        state.last_repository = Some(repo.clone());
        self.save(&state)
    }
}
