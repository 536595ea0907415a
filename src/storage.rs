use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::snippet::{self, Snippet};

const STATE_ENV: &str = "SNIPBOX_STATE";

/// JSON-backed snippet store. Snippet metadata lives in a single
/// document (`snippets.json` by default) under the home directory;
/// each snippet's contents live in `<home>/<folder>/<file>`.
#[derive(Debug, Clone)]
pub struct Store {
    home: PathBuf,
    file: String,
}

#[derive(Debug, Default, Clone)]
pub struct Options {
    pub home: Option<PathBuf>,
    pub file: Option<String>,
}

impl Store {
    pub fn open(opts: Options) -> Result<Self> {
        let home = if let Some(home) = opts.home {
            home
        } else {
            default_home().context("storage: resolve default home directory")?
        };

        fs::create_dir_all(&home)
            .with_context(|| format!("storage: create directory {}", home.display()))?;

        Ok(Self {
            home,
            file: opts.file.unwrap_or_else(|| "snippets.json".to_string()),
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.home.join(&self.file)
    }

    pub fn snippet_path(&self, snippet: &Snippet) -> PathBuf {
        self.home.join(snippet.path())
    }

    /// Reads all snippets from the metadata file. A missing file is
    /// first-run state: a placeholder snippet is written out so the
    /// interactive view always has something to select.
    pub fn load(&self, default_language: &str) -> Result<Vec<Snippet>> {
        let path = self.metadata_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let placeholder = vec![Snippet::placeholder(default_language)];
                self.save(&placeholder)?;
                return Ok(placeholder);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("storage: read {}", path.display()));
            }
        };

        let snippets: Vec<Snippet> = serde_json::from_slice(&data)
            .with_context(|| format!("storage: parse {}", path.display()))?;
        Ok(snippets)
    }

    pub fn save(&self, snippets: &[Snippet]) -> Result<()> {
        let path = self.metadata_path();
        let data = serde_json::to_vec(snippets).context("storage: serialize snippets")?;
        fs::write(&path, data)
            .with_context(|| format!("storage: write {}", path.display()))?;
        Ok(())
    }

    /// Moves any backing file still stored in the legacy flat layout
    /// (`<home>/<folder>-<file>`) into `<home>/<folder>/<file>`.
    /// Returns true when anything moved, so the caller knows to
    /// persist the rewritten metadata.
    pub fn migrate_legacy(&self, snippets: &mut [Snippet]) -> bool {
        let mut migrated = false;
        for snippet in snippets.iter_mut() {
            let legacy = self.home.join(snippet.legacy_path());
            if !legacy.is_file() {
                continue;
            }
            let prefix = format!("{}-", snippet.folder);
            let file = snippet
                .file
                .strip_prefix(&prefix)
                .unwrap_or(&snippet.file)
                .to_string();
            let new_dir = self.home.join(&snippet.folder);
            if fs::create_dir_all(&new_dir).is_err() {
                continue;
            }
            if fs::rename(&legacy, new_dir.join(&file)).is_err() {
                continue;
            }
            snippet.file = file;
            migrated = true;
        }
        migrated
    }
}

fn default_home() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("snipbox"))
}

/// Interactive-session state persisted between runs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    #[serde(default)]
    pub current_folder: usize,
}

impl SessionState {
    pub fn save(self) -> Result<()> {
        let path = state_path().context("storage: resolve state path")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("storage: create directory {}", parent.display()))?;
        }
        let data = serde_json::to_vec(&self).context("storage: serialize state")?;
        fs::write(&path, data)
            .with_context(|| format!("storage: write {}", path.display()))?;
        Ok(())
    }
}

/// Reads the persisted session state, falling back to the default on
/// any failure. A corrupt or missing state file never blocks startup.
pub fn read_state() -> SessionState {
    let Some(path) = state_path() else {
        return SessionState::default();
    };
    let Ok(data) = fs::read(&path) else {
        return SessionState::default();
    };
    serde_json::from_slice(&data).unwrap_or_default()
}

fn state_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(STATE_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::state_dir()
        .or_else(dirs::data_dir)
        .map(|dir| dir.join("snipbox").join("state.json"))
}

/// Default metadata written on first run, mirroring
/// [`Snippet::placeholder`].
pub fn placeholder_snippets(default_language: &str) -> Vec<Snippet> {
    vec![Snippet::placeholder(default_language)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn test_store(dir: &Path) -> Store {
        Store::open(Options {
            home: Some(dir.to_path_buf()),
            file: None,
        })
        .unwrap()
    }

    fn sample(folder: &str, name: &str, language: &str) -> Snippet {
        Snippet {
            tags: vec!["test".into()],
            folder: folder.to_string(),
            date: Utc::now(),
            favorite: false,
            name: name.to_string(),
            file: format!("{name}.{language}"),
            language: language.to_string(),
        }
    }

    #[test]
    fn first_load_creates_placeholder() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());
        let snippets = store.load("go").unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].folder, snippet::DEFAULT_FOLDER);
        assert_eq!(snippets[0].name, snippet::DEFAULT_NAME);
        assert!(store.metadata_path().is_file());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());
        let snippets = vec![sample("a", "first", "rs"), sample("b", "second", "py")];
        store.save(&snippets).unwrap();
        let loaded = store.load("go").unwrap();
        assert_eq!(loaded, snippets);
        // Saving what was loaded is content-stable.
        store.save(&loaded).unwrap();
        assert_eq!(store.load("go").unwrap(), snippets);
    }

    #[test]
    fn migrate_legacy_moves_flat_files() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());
        let mut snippets = vec![Snippet {
            file: "notes-hello.rs".to_string(),
            ..sample("notes", "hello", "rs")
        }];
        fs::write(dir.path().join("notes-hello.rs"), "fn main() {}").unwrap();

        assert!(store.migrate_legacy(&mut snippets));
        assert_eq!(snippets[0].file, "hello.rs");
        assert!(dir.path().join("notes").join("hello.rs").is_file());
        assert!(!dir.path().join("notes-hello.rs").exists());
    }

    #[test]
    fn migrate_legacy_is_noop_without_flat_files() {
        let dir = tempdir().unwrap();
        let store = test_store(dir.path());
        let mut snippets = vec![sample("notes", "hello", "rs")];
        assert!(!store.migrate_legacy(&mut snippets));
        assert_eq!(snippets[0].file, "hello.rs");
    }

    #[test]
    fn session_state_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        env::set_var(STATE_ENV, &path);
        let state = SessionState { current_folder: 3 };
        state.save().unwrap();
        assert_eq!(read_state(), state);
        env::remove_var(STATE_ENV);
    }
}
