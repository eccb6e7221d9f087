//! JSON mirror files.
//!
//! Every collection is mirrored to one pretty-printed JSON file in the data directory.
//! Writes go to a temporary sibling first and are renamed into place, so a crash never
//! leaves a half-written mirror behind.

use crate::errors::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mirror of the countries.
pub const COUNTRIES_FILE: &str = "countries.json";
/// Mirror of the categories.
pub const CATEGORIES_FILE: &str = "categories.json";
/// Mirror of the products.
pub const PRODUCTS_FILE: &str = "products.json";
/// Append-only purchase history.
pub const HISTORY_FILE: &str = "history.json";

/// Reads and writes mirror files inside one directory.
#[derive(Debug, Clone)]
pub struct JsonFiles {
    dir: PathBuf,
}

impl JsonFiles {
    /// Mirror files live in `dir`, which is created on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the mirror file `name`.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Reads `name`, returning `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or does not parse as `T`.
    pub async fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Mirror file {:?} does not exist", path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Writes `value` to `name`, creating the data directory if needed.
    pub async fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(name);
        let tmp = self.path(&format!(".{name}.tmp"));
        let body = serde_json::to_vec_pretty(value)?;
        let len = body.len();
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Mirrored {} bytes to {:?}", len, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Country;

    #[tokio::test]
    async fn test_read_missing_file_is_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let files = JsonFiles::new(dir.path());
        let value: Option<Vec<Country>> = files.read(COUNTRIES_FILE).await?;
        assert!(value.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_reads_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let files = JsonFiles::new(dir.path().join("nested").join("data"));
        let countries = vec![Country {
            code: "1".to_string(),
            name: "Thailand".to_string(),
            emoji: "🇹🇭".to_string(),
        }];

        files.write(COUNTRIES_FILE, &countries).await?;
        let loaded: Option<Vec<Country>> = files.read(COUNTRIES_FILE).await?;

        assert_eq!(loaded, Some(countries));
        assert!(!files.path(&format!(".{COUNTRIES_FILE}.tmp")).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_corrupt_file_is_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let files = JsonFiles::new(dir.path());
        std::fs::write(files.path(PRODUCTS_FILE), "{not json")?;

        let result: Result<Option<Vec<Country>>> = files.read(PRODUCTS_FILE).await;
        assert!(result.is_err());
        Ok(())
    }
}
