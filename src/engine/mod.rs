//! The quiz engine: picks the next word to quiz on and folds learner feedback
//! back into every word seen in the shown fragment.

use std::{
    collections::{
        BTreeMap,
        HashMap,
        HashSet,
    },
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
        Mutex,
        MutexGuard,
    },
};

use log::{
    debug,
    info,
    warn,
};
use rand::{
    rngs::StdRng,
    seq::IndexedRandom,
    SeedableRng,
};

use crate::{
    core::{
        DayStats,
        EngineConfig,
        EngineSettings,
        Feedback,
        Known,
        Moment,
        NextQuiz,
        Quiz,
        QuizKind,
        QuizTarget,
        TankyuError,
        Token,
        TrackedWord,
        WordState,
    },
    dictionary::{
        placement_test,
        PlacementLevel,
        VocabularyOrdering,
    },
    estimation::{
        estimator_for,
        KnowledgeEstimator,
        Observation,
    },
    persistence::EngineStore,
    search::FragmentSearch,
    segmentation::WordTrie,
    srs::{
        Scheduler,
        SrsAnalysis,
    },
};


struct EngineState {
    words: HashMap<u64, TrackedWord>,
    ids_by_spec: HashMap<String, u64>,
    today: DayStats,
    settings: EngineSettings,
    active_quiz: Option<Quiz>,
    next_id: u64,
}

impl EngineState {
    fn word_by_spec(&self, spec: &str) -> Option<&TrackedWord> {
        self.ids_by_spec.get(spec).and_then(|id| self.words.get(id))
    }
}

/// Resets the busy flag when a request ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, TankyuError> {
        if flag.swap(true, Ordering::Acquire) {
            return Err(TankyuError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Word rows touched by one piece of feedback, written together before any
/// of them becomes visible.
struct FeedbackPlan<'s> {
    state: &'s EngineState,
    pending: BTreeMap<u64, TrackedWord>,
    new_ids: HashMap<String, u64>,
    next_id: u64,
    today: DayStats,
}

impl<'s> FeedbackPlan<'s> {
    fn new(state: &'s EngineState) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
            new_ids: HashMap::new(),
            next_id: state.next_id,
            today: state.today,
        }
    }

    /// Working copy of the word, created as Tracked/Maybe on first reference.
    fn word_mut(&mut self, spec: &str, tokens: &[Token], now: i64) -> &mut TrackedWord {
        let existing = self.state.ids_by_spec.get(spec).or_else(|| self.new_ids.get(spec)).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                self.new_ids.insert(spec.to_string(), id);
                debug!("Tracking new word '{}' as {}", spec, id);
                id
            }
        };

        let state = self.state;
        self.pending.entry(id).or_insert_with(|| match state.words.get(&id) {
            Some(word) => word.clone(),
            None => TrackedWord::new(id, spec.to_string(), tokens.to_vec(), now),
        })
    }
}

pub struct QuizEngine<S: EngineStore, F: FragmentSearch> {
    config: EngineConfig,
    ordering: Arc<VocabularyOrdering>,
    store: S,
    search: F,
    estimator: Box<dyn KnowledgeEstimator>,
    scheduler: Scheduler,
    state: Mutex<EngineState>,
    rng: Mutex<StdRng>,
    busy: AtomicBool,
}

impl<S: EngineStore, F: FragmentSearch> QuizEngine<S, F> {
    /// Loads words, settings and the day's counters from `store`. Fails on an
    /// invalid `config`.
    pub async fn load(
        config: EngineConfig,
        ordering: Arc<VocabularyOrdering>,
        store: S,
        search: F,
        now: Moment,
    ) -> Result<Self, TankyuError> {
        config.validate()?;
        let words = store.load_all_words().await?;
        let settings = store.get_settings().await?;
        let today =
            store.load_day_stats(now.day_number).await?.unwrap_or(DayStats::fresh(now.day_number));

        let mut ids_by_spec = HashMap::with_capacity(words.len());
        for word in words.values() {
            if let Some(previous) = ids_by_spec.insert(word.spec.clone(), word.id) {
                warn!("Words {} and {} share the spec '{}'", previous, word.id, word.spec);
            }
        }
        let next_id = words.keys().max().map_or(1, |id| id + 1);

        info!(
            "Quiz engine loaded {} tracked words, {} ranked words, estimator {:?}",
            words.len(),
            ordering.len(),
            config.quiz.estimator
        );

        Ok(Self {
            estimator: estimator_for(config.quiz.estimator),
            scheduler: Scheduler::new(config.srs.clone()),
            config,
            ordering,
            store,
            search,
            state: Mutex::new(EngineState {
                words,
                ids_by_spec,
                today,
                settings,
                active_quiz: None,
                next_id,
            }),
            rng: Mutex::new(StdRng::from_os_rng()),
            busy: AtomicBool::new(false),
        })
    }

    /// Replaces the random source, e.g. with a seeded one.
    pub fn with_rng(self, rng: StdRng) -> Self {
        Self { rng: Mutex::new(rng), ..self }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ordering(&self) -> &VocabularyOrdering {
        &self.ordering
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, EngineState>, TankyuError> {
        self.state.lock().map_err(|_| TankyuError::Custom("engine state lock poisoned".into()))
    }

    fn lock_rng(&self) -> Result<MutexGuard<'_, StdRng>, TankyuError> {
        self.rng.lock().map_err(|_| TankyuError::Custom("engine rng lock poisoned".into()))
    }

    pub fn need_placement_test(&self) -> Result<bool, TankyuError> {
        Ok(self.lock_state()?.settings.ordering_intro_idx.is_none())
    }

    pub fn ordering_intro_idx(&self) -> Result<Option<usize>, TankyuError> {
        Ok(self.lock_state()?.settings.ordering_intro_idx)
    }

    pub async fn set_ordering_intro_idx(&self, rank: usize) -> Result<(), TankyuError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        let settings = EngineSettings { ordering_intro_idx: Some(rank) };
        self.store.set_settings(&settings).await?;
        self.lock_state()?.settings = settings;
        info!("Placement set to rank {}", rank);
        Ok(())
    }

    pub fn placement_test(&self, words_per_level: usize) -> Result<Vec<PlacementLevel>, TankyuError> {
        let mut rng = self.lock_rng()?;
        Ok(placement_test(&self.ordering, &mut *rng, words_per_level))
    }

    pub fn active_quiz(&self) -> Result<Option<Quiz>, TankyuError> {
        Ok(self.lock_state()?.active_quiz.clone())
    }

    pub fn day_stats(&self) -> Result<DayStats, TankyuError> {
        Ok(self.lock_state()?.today)
    }

    /// Snapshot of every tracked word, ordered by id.
    pub fn tracked_words(&self) -> Result<Vec<TrackedWord>, TankyuError> {
        let state = self.lock_state()?;
        let mut words: Vec<TrackedWord> = state.words.values().cloned().collect();
        words.sort_by_key(|w| w.id);
        Ok(words)
    }

    pub fn srs_analysis(&self, now: Moment) -> Result<SrsAnalysis, TankyuError> {
        let state = self.lock_state()?;
        Ok(self.scheduler.analyze(state.words.values(), now))
    }

    /// Forgets everything learned about a word, including an ignore.
    pub async fn clear_evidence(&self, word_id: u64) -> Result<bool, TankyuError> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let cleared = {
            let state = self.lock_state()?;
            let Some(word) = state.words.get(&word_id) else {
                return Ok(false);
            };
            let mut word = word.clone();
            word.state = WordState::Tracked { known: Known::Maybe };
            word.time_known_updated = 0;
            word
        };

        self.store.store_word(&cleared).await?;
        info!("Cleared evidence for '{}'", cleared.spec);
        self.lock_state()?.words.insert(word_id, cleared);
        Ok(true)
    }

    async fn roll_day(&self, now: Moment) -> Result<(), TankyuError> {
        let current_day = self.lock_state()?.today.day_number;
        if current_day == now.day_number {
            return Ok(());
        }

        let stats =
            self.store.load_day_stats(now.day_number).await?.unwrap_or(DayStats::fresh(now.day_number));
        info!("New day {} ({} introduced so far)", stats.day_number, stats.intro_count);
        self.lock_state()?.today = stats;
        Ok(())
    }

    fn rank_of(&self, spec: &str) -> Option<usize> {
        self.ordering.rank_of(spec)
    }

    fn observations(&self, state: &EngineState) -> Vec<Observation> {
        state
            .words
            .values()
            .filter_map(|word| {
                let rank = self.rank_of(&word.spec)?;
                let known = word.state.settled_known()?;
                Some((rank as i64, known))
            })
            .collect()
    }

    /// Rank around which new words get introduced: the placement rank until
    /// there is enough evidence, then the estimator's answer.
    fn calibration_rank(&self, state: &EngineState, intro_idx: usize) -> usize {
        let len = self.ordering.len();
        let observations = self.observations(state);
        if observations.len() < self.config.quiz.min_estimator_observations {
            return intro_idx.min(len);
        }

        match self.estimator.estimate(
            -1,
            len as i64 + 1,
            &observations,
            self.config.quiz.intro_known_probability,
        ) {
            Some(rank) => {
                debug!(
                    "{} estimator puts calibration at {} from {} observations",
                    self.estimator.name(),
                    rank,
                    observations.len()
                );
                rank.clamp(0, len as i64) as usize
            }
            None => intro_idx.min(len),
        }
    }

    fn target_for_word(&self, word: &TrackedWord) -> QuizTarget {
        QuizTarget {
            spec: word.spec.clone(),
            tokens: word.tokens.clone(),
            rank: self.rank_of(&word.spec),
        }
    }

    fn target_for_rank(&self, rank: usize) -> Option<QuizTarget> {
        self.ordering.get(rank).map(|w| QuizTarget {
            spec: w.spec.clone(),
            tokens: w.tokens.clone(),
            rank: Some(rank),
        })
    }

    fn choose_target(
        &self,
        state: &EngineState,
        now: Moment,
        intro_idx: usize,
    ) -> Option<(QuizKind, QuizTarget)> {
        if let Some(word) = self.scheduler.next_due(state.words.values(), now) {
            debug!("'{}' is due for review", word.spec);
            return Some((QuizKind::SrsReview, self.target_for_word(word)));
        }

        let quota_open = self.scheduler.quota_allows(&state.today);

        if quota_open {
            let queued = state
                .words
                .values()
                .filter_map(|w| match w.state {
                    WordState::Queued { queued_at, .. } => Some((queued_at, w.id, w)),
                    _ => None,
                })
                .min_by_key(|(queued_at, id, _)| (*queued_at, *id));
            if let Some((_, _, word)) = queued {
                debug!("Promoting queued word '{}'", word.spec);
                return Some((QuizKind::SrsReview, self.target_for_word(word)));
            }
        }

        let calibration = self.calibration_rank(state, intro_idx);
        let state_at = |rank: usize| {
            self.ordering.get(rank).and_then(|w| state.word_by_spec(&w.spec)).map(|w| &w.state)
        };

        if quota_open {
            let unknown_below = (0..calibration)
                .find(|&rank| matches!(state_at(rank), Some(WordState::Tracked { known: Known::No })));
            let rank = unknown_below.or_else(|| {
                (calibration..self.ordering.len()).find(|&rank| match state_at(rank) {
                    None => true,
                    Some(WordState::Tracked { known }) => *known != Known::Yes,
                    Some(_) => false,
                })
            });
            debug!("Calibration rank {}, suggesting rank {:?}", calibration, rank);
            return rank.and_then(|r| self.target_for_rank(r)).map(|t| (QuizKind::SuggestSrs, t));
        }

        let probe = (0..calibration).rev().find(|&rank| match state_at(rank) {
            None => true,
            Some(WordState::Tracked { known }) | Some(WordState::Queued { known, .. }) => {
                *known == Known::Maybe
            }
            Some(_) => false,
        });
        debug!("Daily limit reached, calibration {}, probing rank {:?}", calibration, probe);
        probe.and_then(|r| self.target_for_rank(r)).map(|t| (QuizKind::SuggestQueue, t))
    }

    /// Decides what to quiz next and fetches a fragment for it.
    pub async fn get_next_quiz(&self, now: Moment) -> Result<NextQuiz, TankyuError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        self.roll_day(now).await?;

        let chosen = {
            let state = self.lock_state()?;
            let Some(intro_idx) = state.settings.ordering_intro_idx else {
                return Ok(NextQuiz::PlacementTestRequired);
            };
            self.choose_target(&state, now, intro_idx)
        };

        let Some((kind, target)) = chosen else {
            info!("Nothing to review or introduce");
            return Ok(NextQuiz::NothingAvailable);
        };

        let results = self.search.search(&target.spec).await?;
        let fragment = {
            let mut rng = self.lock_rng()?;
            results.results.choose(&mut *rng).cloned()
        };
        let Some(fragment) = fragment else {
            return Err(TankyuError::NoFragments { query: target.spec });
        };

        let quiz = Quiz {
            kind,
            fragment_text: fragment.text,
            fragment_highlighted_html: fragment.highlighted_html,
            fragment_tokens: fragment.tokens,
            target,
        };
        info!("Next quiz: {:?} on '{}'", quiz.kind, quiz.target.spec);
        self.lock_state()?.active_quiz = Some(quiz.clone());
        Ok(NextQuiz::Ready(quiz))
    }

    fn introduce(&self, word: &mut TrackedWord, today: &mut DayStats, now: Moment) {
        word.state = self.scheduler.introduce(now);
        today.intro_count += 1;
        info!("'{}' enters learning ({} today)", word.spec, today.intro_count);
    }

    fn plan_feedback<'s>(
        &self,
        state: &'s EngineState,
        now: Moment,
        quiz: &Quiz,
        feedback: &Feedback,
    ) -> Result<FeedbackPlan<'s>, TankyuError> {
        let mut rng = self.lock_rng()?;
        let mut plan = FeedbackPlan::new(state);

        let trie = WordTrie::build(
            state
                .words
                .values()
                .map(|w| (w.tokens.clone(), (w.spec.as_str(), w.tokens.as_slice())))
                .chain(
                    self.ordering
                        .iter()
                        .filter(|(_, w)| !state.ids_by_spec.contains_key(&w.spec))
                        .map(|(_, w)| (w.tokens.clone(), (w.spec.as_str(), w.tokens.as_slice()))),
                ),
        );
        let found = trie.find(&quiz.fragment_tokens);

        let mut seen = HashSet::new();
        for &&(spec, tokens) in &found.matched {
            if spec == quiz.target.spec || !seen.insert(spec) {
                continue;
            }
            let word = plan.word_mut(spec, tokens, now.unix_time);
            word.time_last_shown = now.unix_time;
            if feedback.fragment_understood {
                match self.scheduler.success(&word.state, now, &mut *rng) {
                    Some(next) => word.state = next,
                    None => word.set_known(Known::Yes, now.unix_time),
                }
            }
        }

        let quota_open = self.scheduler.quota_allows(&plan.today);
        let mut today = plan.today;
        let target = plan.word_mut(&quiz.target.spec, &quiz.target.tokens, now.unix_time);
        target.time_last_shown = now.unix_time;

        if feedback.target_word_ignored {
            target.state = WordState::Ignored;
            info!("'{}' ignored", target.spec);
        } else {
            if !feedback.target_word_not_in_fragment {
                if let Some(known) = feedback.target_word_known {
                    if quota_open && matches!(target.state, WordState::Queued { .. }) {
                        self.introduce(target, &mut today, now);
                    }
                    let next = if known {
                        self.scheduler.success(&target.state, now, &mut *rng)
                    } else {
                        self.scheduler.failure(&target.state, now, &mut *rng)
                    };
                    match next {
                        Some(next) => target.state = next,
                        None => target.set_known(Known::from_bool(known), now.unix_time),
                    }
                }
            }

            if feedback.target_word_agreed_to_srs == Some(true) && !target.state.is_in_srs() {
                if self.scheduler.quota_allows(&today) {
                    self.introduce(target, &mut today, now);
                } else if let Some(known) = target.state.known() {
                    if !matches!(target.state, WordState::Queued { .. }) {
                        target.state = WordState::Queued { known, queued_at: now.unix_time };
                        info!("'{}' queued until the daily limit allows", target.spec);
                    }
                }
            }
        }

        plan.today = today;
        Ok(plan)
    }

    /// Applies feedback on the active quiz to the target and to every word
    /// recognized in its fragment. Nothing changes unless every row is stored.
    ///
    /// # Panics
    /// If `quiz` is not the active quiz, or `feedback` both ignores the
    /// target and adds it to SRS.
    pub async fn take_feedback(
        &self,
        now: Moment,
        quiz: &Quiz,
        feedback: &Feedback,
    ) -> Result<(), TankyuError> {
        let _guard = BusyGuard::acquire(&self.busy)?;
        feedback.assert_consistent();
        self.roll_day(now).await?;

        let (words, today, new_ids, next_id) = {
            let state = self.lock_state()?;
            assert!(
                state.active_quiz.as_ref() == Some(quiz),
                "feedback given for a quiz that is not active"
            );
            let plan = self.plan_feedback(&state, now, quiz, feedback)?;
            let words: Vec<TrackedWord> = plan.pending.into_values().collect();
            (words, plan.today, plan.new_ids, plan.next_id)
        };

        self.store.store_batch(&words, &today).await?;

        let mut state = self.lock_state()?;
        debug!("Stored {} words ({} new)", words.len(), new_ids.len());
        state.ids_by_spec.extend(new_ids);
        for word in words {
            state.words.insert(word.id, word);
        }
        state.today = today;
        state.next_id = next_id;
        state.active_quiz = None;
        Ok(())
    }
}
