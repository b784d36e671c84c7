//! File-based cache of completed time windows
//!
//! Each closed window is stored as one JSON array of records named after the
//! window bounds. Entries are written to a temporary file in the cache
//! directory and renamed into place, so readers never see a partial entry.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::index::error::CacheError;
use crate::index::types::{ModuleVersion, TimeWindow};

#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, window: &TimeWindow) -> PathBuf {
        self.dir.join(window.cache_key())
    }

    /// Reads the records stored for `window`.
    ///
    /// Returns `Ok(None)` when no entry exists. An unreadable or undecodable
    /// entry is an error; callers treat it as a miss.
    pub fn load(&self, window: &TimeWindow) -> Result<Option<Vec<ModuleVersion>>, CacheError> {
        if !window.cacheable {
            return Err(CacheError::OpenWindow(window.to));
        }

        let path = self.entry_path(window);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No cache entry at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<ModuleVersion> = serde_json::from_reader(BufReader::new(file))?;
        debug!("Loaded {} records from {:?}", records.len(), path);
        Ok(Some(records))
    }

    /// Atomically writes `records` as the entry for `window`.
    pub fn store(&self, window: &TimeWindow, records: &[ModuleVersion]) -> Result<(), CacheError> {
        if !window.cacheable {
            return Err(CacheError::OpenWindow(window.to));
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(window);

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, records)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&path)?;

        info!("Cached {} records at {:?}", records.len(), path);
        Ok(())
    }
}
