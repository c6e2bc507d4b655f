//! JSON file persistence: one purse per file.

use crate::{
    adapter::{PersistenceAdapter, PurseSnapshot},
    error::{PurseError, PurseResult},
    level::Level,
    types::Amount,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct JsonFileAdapter {
    path: PathBuf,
}

impl JsonFileAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored snapshot. A missing file reads as an empty purse.
    pub fn read_snapshot(&self) -> PurseResult<PurseSnapshot> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(PurseSnapshot::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PersistenceAdapter for JsonFileAdapter {
    fn save(&mut self, amount: Amount, level: Level) -> PurseResult<()> {
        // serde_json writes non-finite floats as null, which never loads back.
        if !amount.is_finite() {
            return Err(PurseError::InvalidAmount { value: amount });
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&PurseSnapshot::new(amount, level))?;
        std::fs::write(&self.path, json)?;
        log::debug!("file_store: wrote {}", self.path.display());
        Ok(())
    }

    fn load_amount(&mut self) -> PurseResult<Amount> {
        Ok(self.read_snapshot()?.amount)
    }

    fn load_level(&mut self) -> PurseResult<Level> {
        Ok(self.read_snapshot()?.level)
    }
}
