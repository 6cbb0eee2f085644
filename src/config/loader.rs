use crate::store::TomlFileStore;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::path::{Path, PathBuf};

const STORE_DIR: &str = ".linksweep";
const STORE_FILE: &str = "store.toml";

/// `~/.linksweep/store.toml`.
pub fn default_store_path() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(STORE_DIR).join(STORE_FILE))
}

/// Open the shared store at `path`, or at the default location when `None`.
pub async fn open_store(path: Option<&Path>) -> Result<TomlFileStore> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_store_path()?,
    };
    TomlFileStore::open(&path)
        .await
        .with_context(|| format!("Failed to open store at {}", path.display()))
}
