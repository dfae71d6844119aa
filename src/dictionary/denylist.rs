use std::{
    collections::HashSet,
    path::{
        Path,
        PathBuf,
    },
};

use log::info;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::TankyuError,
    persistence::{
        load_json_from_path,
        save_json_to_path,
    },
};

pub const DENYLIST_FILE: &str = "denylist.json";

/// Particles and copulas that show up in nearly every sentence.
pub const DEFAULT_DENIED_TERMS: &[&str] = &[
    "の", "は", "に", "へ", "を", "て", "が", "だ", "た", "と", "から", "も", "で", "か", "です",
    "ね", "な",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenylistData {
    pub denied_terms: Vec<String>,
}

impl Default for DenylistData {
    fn default() -> Self {
        Self { denied_terms: DEFAULT_DENIED_TERMS.iter().map(|s| s.to_string()).collect() }
    }
}

/// Words kept out of the vocabulary ordering.
#[derive(Debug)]
pub struct Denylist {
    data: DenylistData,
    lookup: HashSet<String>,
    file_path: Option<PathBuf>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self::from_terms(DenylistData::default().denied_terms)
    }
}

impl Denylist {
    /// Loads `denylist.json` from `dir`, writing the defaults on first use.
    pub fn load_from(dir: &Path) -> Result<Self, TankyuError> {
        let file_path = dir.join(DENYLIST_FILE);

        let data = if file_path.exists() {
            load_json_from_path::<DenylistData>(&file_path)?
        } else {
            info!("No denylist at {}, writing defaults", file_path.display());
            DenylistData::default()
        };

        let mut denylist = Self::from_terms(data.denied_terms);
        denylist.file_path = Some(file_path);
        denylist.save()?;
        Ok(denylist)
    }

    /// In-memory denylist, never written to disk.
    pub fn from_terms(terms: Vec<String>) -> Self {
        let lookup = terms.iter().cloned().collect();
        Self { data: DenylistData { denied_terms: terms }, lookup, file_path: None }
    }

    pub fn save(&self) -> Result<(), TankyuError> {
        match &self.file_path {
            Some(file_path) => save_json_to_path(&self.data, file_path),
            None => Ok(()),
        }
    }

    pub fn add_term(&mut self, term: &str) -> Result<bool, TankyuError> {
        if self.lookup.insert(term.to_string()) {
            self.data.denied_terms.insert(0, term.to_string());
            self.save()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn remove_term(&mut self, term: &str) -> Result<bool, TankyuError> {
        if self.lookup.remove(term) {
            self.data.denied_terms.retain(|t| t != term);
            self.save()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.lookup.contains(term)
    }

    pub fn terms(&self) -> &[String] {
        &self.data.denied_terms
    }
}
