//! Locally persisted favorites list: one JSON file holding the full list of
//! Movie records, rewritten wholesale on every mutation.

use crate::models::Movie;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const FAVORITES_PATH_VAR: &str = "CINESCOUT_FAVORITES";

/// The one process-wide mutable resource: an insertion-ordered, id-unique
/// set of movies. Opened once at startup and passed by reference to whoever
/// needs it.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    movies: Vec<Movie>,
    ids: HashSet<i32>,
}

impl FavoritesStore {
    /// Opens the store at `path`, creating parent directories as needed.
    /// A missing file means an empty list, not an error.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let movies: Vec<Movie> = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("{} is not a valid favorites file", path.display()))?
        } else {
            Vec::new()
        };
        let mut ids = HashSet::new();
        let mut deduped = Vec::with_capacity(movies.len());
        for movie in movies {
            if ids.insert(movie.id) {
                deduped.push(movie);
            }
        }
        debug!(path = %path.display(), count = deduped.len(), "favorites loaded");
        Ok(Self {
            path,
            movies: deduped,
            ids,
        })
    }

    /// Default location: `CINESCOUT_FAVORITES` if set, otherwise the
    /// platform data directory.
    pub fn open_default() -> Result<Self> {
        let path = match env::var(FAVORITES_PATH_VAR) {
            Ok(p) => PathBuf::from(p),
            Err(_) => {
                let dirs = directories::ProjectDirs::from("", "", "cinescout")
                    .context("no usable home directory for favorites storage")?;
                dirs.data_dir().join("favorites.json")
            }
        };
        Self::open(path)
    }

    /// Appends the movie unless its id is already present, then persists.
    pub fn add(&mut self, movie: Movie) {
        if self.ids.insert(movie.id) {
            self.movies.push(movie);
            self.persist();
        }
    }

    /// Removes the entry with this id if present, then persists.
    pub fn remove(&mut self, id: i32) {
        if self.ids.remove(&id) {
            self.movies.retain(|m| m.id != id);
            self.persist();
        }
    }

    pub fn contains(&self, id: i32) -> bool {
        self.ids.contains(&id)
    }

    /// Current favorites in insertion order.
    pub fn list(&self) -> &[Movie] {
        &self.movies
    }

    /// Case-insensitive title substring filter for the favorites view.
    /// An empty query returns the full list.
    pub fn filter(&self, query: &str) -> Vec<&Movie> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.movies.iter().collect();
        }
        self.movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .collect()
    }

    // Callers never see a persistence failure; it lands in the log instead.
    fn persist(&self) {
        if let Err(e) = self.write_to_disk() {
            warn!("failed to persist favorites: {e:#}");
        }
    }

    // Temp-file + rename keeps the file intact if the write is interrupted.
    fn write_to_disk(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.movies).context("serializing favorites")?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
