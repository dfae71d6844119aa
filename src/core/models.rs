use serde::{
    Deserialize,
    Serialize,
};

/// Normalized token string. Equality is the only operation the engine relies on.
pub type Token = String;

/// Tokens of one unbroken run of text. A fragment is a list of these, and no
/// phrase is ever matched across the end of a run.
pub type ContigTokenization<T = Token> = Vec<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordStatus {
    Tracked,
    Queued,
    Ignored,
    Learning,
    Reviewing,
}

/// Rough guess as to whether the learner knows a word that is not in SRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Known {
    Yes,
    No,
    Maybe,
}

impl Known {
    pub fn from_bool(known: bool) -> Self {
        if known {
            Known::Yes
        } else {
            Known::No
        }
    }
}

/// Per-word learning state. Each variant only carries what is meaningful for
/// it, so `Learning` intervals are always seconds and `Reviewing` intervals
/// are always days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordState {
    Tracked { known: Known },
    Queued { known: Known, queued_at: i64 },
    Ignored,
    Learning { due_at: i64, interval_secs: i64 },
    Reviewing { due_day: i64, interval_days: i64 },
}

impl WordState {
    pub fn status(&self) -> WordStatus {
        match self {
            WordState::Tracked { .. } => WordStatus::Tracked,
            WordState::Queued { .. } => WordStatus::Queued,
            WordState::Ignored => WordStatus::Ignored,
            WordState::Learning { .. } => WordStatus::Learning,
            WordState::Reviewing { .. } => WordStatus::Reviewing,
        }
    }

    /// `None` stands for "not applicable": the word is in SRS or ignored.
    pub fn known(&self) -> Option<Known> {
        match self {
            WordState::Tracked { known } | WordState::Queued { known, .. } => Some(*known),
            _ => None,
        }
    }

    pub fn is_in_srs(&self) -> bool {
        matches!(self, WordState::Learning { .. } | WordState::Reviewing { .. })
    }

    /// Known/unknown evidence usable by the estimators. SRS words count as known.
    pub fn settled_known(&self) -> Option<bool> {
        match self {
            WordState::Learning { .. } | WordState::Reviewing { .. } => Some(true),
            WordState::Tracked { known } | WordState::Queued { known, .. } => match known {
                Known::Yes => Some(true),
                Known::No => Some(false),
                Known::Maybe => None,
            },
            WordState::Ignored => None,
        }
    }
}

/// A word or multi-token phrase the learner has been quizzed on, given
/// feedback about, or seen in a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedWord {
    pub id: u64,
    pub spec: String, // doubles as the fragment search query
    pub tokens: Vec<Token>,
    pub state: WordState,
    pub time_added: i64,
    pub time_last_shown: i64,
    pub time_known_updated: i64,
    pub notes: String,
}

impl TrackedWord {
    pub fn new(id: u64, spec: String, tokens: Vec<Token>, now: i64) -> Self {
        Self {
            id,
            spec,
            tokens,
            state: WordState::Tracked { known: Known::Maybe },
            time_added: now,
            time_last_shown: 0,
            time_known_updated: 0,
            notes: String::new(),
        }
    }

    /// Records a known/unknown guess. Has no effect on SRS or ignored words.
    pub fn set_known(&mut self, value: Known, now: i64) {
        match &mut self.state {
            WordState::Tracked { known } | WordState::Queued { known, .. } => {
                *known = value;
                self.time_known_updated = now;
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub day_number: i64,
    pub intro_count: u32,
}

impl DayStats {
    pub fn fresh(day_number: i64) -> Self {
        Self { day_number, intro_count: 0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Rank below which the learner is assumed fluent. Set by the placement test.
    pub ordering_intro_idx: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizKind {
    SrsReview,
    SuggestSrs,
    SuggestQueue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTarget {
    pub spec: String,
    pub tokens: Vec<Token>,
    pub rank: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub kind: QuizKind,
    pub fragment_text: String,
    pub fragment_highlighted_html: String,
    pub fragment_tokens: Vec<ContigTokenization>,
    pub target: QuizTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub fragment_understood: bool,
    pub target_word_known: Option<bool>,
    pub target_word_ignored: bool,
    pub target_word_not_in_fragment: bool,
    pub target_word_agreed_to_srs: Option<bool>,
}

impl Feedback {
    pub fn assert_consistent(&self) {
        assert!(
            !(self.target_word_ignored && self.target_word_agreed_to_srs == Some(true)),
            "feedback cannot both ignore the target word and add it to SRS"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextQuiz {
    Ready(Quiz),
    PlacementTestRequired,
    NothingAvailable,
}
