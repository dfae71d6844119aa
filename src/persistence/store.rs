use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    future::Future,
    path::{
        Path,
        PathBuf,
    },
    sync::Mutex,
};

use log::{
    debug,
    info,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    DayStats,
    EngineSettings,
    Known,
    TankyuError,
    Token,
    TrackedWord,
    WordState,
};

pub const STORE_FILE: &str = "store.json";

/// CRUD interface the engine persists through. Rows are independent and the
/// last write wins; `store_batch` must write all of its rows or none.
pub trait EngineStore: Send + Sync {
    fn load_all_words(
        &self,
    ) -> impl Future<Output = Result<HashMap<u64, TrackedWord>, TankyuError>> + Send;

    fn store_word(&self, word: &TrackedWord)
        -> impl Future<Output = Result<(), TankyuError>> + Send;

    fn store_batch(
        &self,
        words: &[TrackedWord],
        day_stats: &DayStats,
    ) -> impl Future<Output = Result<(), TankyuError>> + Send;

    fn load_day_stats(
        &self,
        day_number: i64,
    ) -> impl Future<Output = Result<Option<DayStats>, TankyuError>> + Send;

    fn store_day_stats(&self, stats: &DayStats)
        -> impl Future<Output = Result<(), TankyuError>> + Send;

    fn get_settings(&self) -> impl Future<Output = Result<EngineSettings, TankyuError>> + Send;

    fn set_settings(
        &self,
        settings: &EngineSettings,
    ) -> impl Future<Output = Result<(), TankyuError>> + Send;
}

/// Flat on-disk row for a word. `next_time` and `interval` change meaning with
/// `status`; only this type deals with that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWord {
    pub id: u64,
    pub spec: String,
    pub tokens: Vec<Token>,
    pub status: String,
    pub known: String,
    pub next_time: i64,
    pub interval: i64,
    pub time_added: i64,
    pub time_last_shown: i64,
    pub time_known_updated: i64,
    #[serde(default)]
    pub notes: String,
}

fn known_code(known: Option<Known>) -> &'static str {
    match known {
        Some(Known::Yes) => "Y",
        Some(Known::No) => "N",
        Some(Known::Maybe) => "M",
        None => "-",
    }
}

impl From<&TrackedWord> for StoredWord {
    fn from(word: &TrackedWord) -> Self {
        let (status, next_time, interval) = match &word.state {
            WordState::Tracked { .. } => ("T", 0, 0),
            WordState::Queued { queued_at, .. } => ("Q", *queued_at, 0),
            WordState::Ignored => ("I", 0, 0),
            WordState::Learning { due_at, interval_secs } => ("L", *due_at, *interval_secs),
            WordState::Reviewing { due_day, interval_days } => ("R", *due_day, *interval_days),
        };

        StoredWord {
            id: word.id,
            spec: word.spec.clone(),
            tokens: word.tokens.clone(),
            status: status.to_string(),
            known: known_code(word.state.known()).to_string(),
            next_time,
            interval,
            time_added: word.time_added,
            time_last_shown: word.time_last_shown,
            time_known_updated: word.time_known_updated,
            notes: word.notes.clone(),
        }
    }
}

impl TryFrom<StoredWord> for TrackedWord {
    type Error = TankyuError;

    fn try_from(row: StoredWord) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| TankyuError::CorruptRecord { id: row.id, reason };

        let known = match row.known.as_str() {
            "Y" => Some(Known::Yes),
            "N" => Some(Known::No),
            "M" => Some(Known::Maybe),
            "-" => None,
            other => return Err(corrupt(format!("unknown known code '{}'", other))),
        };

        let state = match (row.status.as_str(), known) {
            ("T", Some(known)) => WordState::Tracked { known },
            ("Q", Some(known)) => WordState::Queued { known, queued_at: row.next_time },
            ("I", None) => WordState::Ignored,
            ("L", None) => {
                WordState::Learning { due_at: row.next_time, interval_secs: row.interval }
            }
            ("R", None) => {
                WordState::Reviewing { due_day: row.next_time, interval_days: row.interval }
            }
            ("T" | "Q", None) => {
                return Err(corrupt(format!("status {} needs a known value", row.status)))
            }
            ("I" | "L" | "R", Some(_)) => {
                return Err(corrupt(format!("status {} cannot carry a known value", row.status)))
            }
            (other, _) => return Err(corrupt(format!("unknown status code '{}'", other))),
        };

        Ok(TrackedWord {
            id: row.id,
            spec: row.spec,
            tokens: row.tokens,
            state,
            time_added: row.time_added,
            time_last_shown: row.time_last_shown,
            time_known_updated: row.time_known_updated,
            notes: row.notes,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    words: Vec<StoredWord>,
    #[serde(default)]
    day_stats: Vec<DayStats>,
    #[serde(default)]
    settings: EngineSettings,
}

#[derive(Debug, Default, Clone)]
struct StoreData {
    words: BTreeMap<u64, StoredWord>,
    day_stats: BTreeMap<i64, DayStats>,
    settings: EngineSettings,
}

impl StoreData {
    fn from_file(file: StoreFile) -> Self {
        Self {
            words: file.words.into_iter().map(|w| (w.id, w)).collect(),
            day_stats: file.day_stats.into_iter().map(|s| (s.day_number, s)).collect(),
            settings: file.settings,
        }
    }

    fn to_file(&self) -> StoreFile {
        StoreFile {
            words: self.words.values().cloned().collect(),
            day_stats: self.day_stats.values().copied().collect(),
            settings: self.settings.clone(),
        }
    }

    fn decode_words(&self) -> Result<HashMap<u64, TrackedWord>, TankyuError> {
        self.words
            .values()
            .map(|row| TrackedWord::try_from(row.clone()).map(|w| (w.id, w)))
            .collect()
    }
}

/// Whole-store JSON file. Every write replaces the file through a temporary
/// sibling and a rename, so a batch lands completely or not at all.
pub struct JsonStore {
    path: PathBuf,
    data: tokio::sync::Mutex<StoreData>,
}

impl JsonStore {
    pub async fn open(dir: &Path) -> Result<Self, TankyuError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(STORE_FILE);

        let file = if tokio::fs::try_exists(&path).await? {
            let json = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str::<StoreFile>(&json)?
        } else {
            StoreFile::default()
        };

        info!("Opened store at {} ({} words)", path.display(), file.words.len());
        Ok(Self { path, data: tokio::sync::Mutex::new(StoreData::from_file(file)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_through(&self, data: &StoreData) -> Result<(), TankyuError> {
        let json = serde_json::to_string_pretty(&data.to_file())?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Store flushed to {}", self.path.display());
        Ok(())
    }

    /// Applies `edit` to a copy, writes it, then keeps it only if the write succeeded.
    async fn commit(&self, edit: impl FnOnce(&mut StoreData) + Send) -> Result<(), TankyuError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        edit(&mut next);
        self.write_through(&next).await?;
        *data = next;
        Ok(())
    }
}

impl EngineStore for JsonStore {
    async fn load_all_words(&self) -> Result<HashMap<u64, TrackedWord>, TankyuError> {
        self.data.lock().await.decode_words()
    }

    async fn store_word(&self, word: &TrackedWord) -> Result<(), TankyuError> {
        let row = StoredWord::from(word);
        self.commit(move |data| {
            data.words.insert(row.id, row);
        })
        .await
    }

    async fn store_batch(
        &self,
        words: &[TrackedWord],
        day_stats: &DayStats,
    ) -> Result<(), TankyuError> {
        let rows: Vec<StoredWord> = words.iter().map(StoredWord::from).collect();
        let stats = *day_stats;
        self.commit(move |data| {
            for row in rows {
                data.words.insert(row.id, row);
            }
            data.day_stats.insert(stats.day_number, stats);
        })
        .await
    }

    async fn load_day_stats(&self, day_number: i64) -> Result<Option<DayStats>, TankyuError> {
        Ok(self.data.lock().await.day_stats.get(&day_number).copied())
    }

    async fn store_day_stats(&self, stats: &DayStats) -> Result<(), TankyuError> {
        let stats = *stats;
        self.commit(move |data| {
            data.day_stats.insert(stats.day_number, stats);
        })
        .await
    }

    async fn get_settings(&self) -> Result<EngineSettings, TankyuError> {
        Ok(self.data.lock().await.settings.clone())
    }

    async fn set_settings(&self, settings: &EngineSettings) -> Result<(), TankyuError> {
        let settings = settings.clone();
        self.commit(move |data| data.settings = settings).await
    }
}

/// In-process store. Rows still pass through `StoredWord`.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_data<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> Result<R, TankyuError> {
        let mut data =
            self.data.lock().map_err(|_| TankyuError::Storage("memory store poisoned".into()))?;
        Ok(f(&mut data))
    }
}

impl EngineStore for MemoryStore {
    async fn load_all_words(&self) -> Result<HashMap<u64, TrackedWord>, TankyuError> {
        self.with_data(|data| data.decode_words())?
    }

    async fn store_word(&self, word: &TrackedWord) -> Result<(), TankyuError> {
        let row = StoredWord::from(word);
        self.with_data(|data| {
            data.words.insert(row.id, row);
        })
    }

    async fn store_batch(
        &self,
        words: &[TrackedWord],
        day_stats: &DayStats,
    ) -> Result<(), TankyuError> {
        self.with_data(|data| {
            for word in words {
                data.words.insert(word.id, StoredWord::from(word));
            }
            data.day_stats.insert(day_stats.day_number, *day_stats);
        })
    }

    async fn load_day_stats(&self, day_number: i64) -> Result<Option<DayStats>, TankyuError> {
        self.with_data(|data| data.day_stats.get(&day_number).copied())
    }

    async fn store_day_stats(&self, stats: &DayStats) -> Result<(), TankyuError> {
        self.with_data(|data| {
            data.day_stats.insert(stats.day_number, *stats);
        })
    }

    async fn get_settings(&self) -> Result<EngineSettings, TankyuError> {
        self.with_data(|data| data.settings.clone())
    }

    async fn set_settings(&self, settings: &EngineSettings) -> Result<(), TankyuError> {
        self.with_data(|data| data.settings = settings.clone())
    }
}
