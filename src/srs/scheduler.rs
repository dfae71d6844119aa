use log::debug;
use rand::Rng;

use crate::core::{
    config::SrsConfig,
    utils::round_half_up,
    DayStats,
    Moment,
    TrackedWord,
    WordState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SrsAnalysis {
    pub due_learning: usize,
    pub due_reviewing: usize,
    pub total_learning: usize,
    pub total_reviewing: usize,
    /// Seconds until the next learning step comes due. `None` if something is
    /// already due or nothing is in the learning phase.
    pub time_until_next_learning: Option<i64>,
}

pub struct Scheduler {
    config: SrsConfig,
}

impl Scheduler {
    pub fn new(config: SrsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SrsConfig {
        &self.config
    }

    /// State for a word entering SRS now.
    pub fn introduce(&self, now: Moment) -> WordState {
        match self.config.learning_steps_secs.first() {
            Some(&step) => WordState::Learning { due_at: now.unix_time + step, interval_secs: step },
            None => Self::graduate(now),
        }
    }

    fn graduate(now: Moment) -> WordState {
        WordState::Reviewing { due_day: now.day_number + 1, interval_days: 1 }
    }

    /// `x` scaled by a uniform factor in `[1 - f, 1 + f]`.
    pub fn jitter<R: Rng + ?Sized>(&self, x: f64, rng: &mut R) -> f64 {
        let u: f64 = rng.random();
        x * (1.0 + 2.0 * self.config.jitter_fraction * (u - 0.5))
    }

    fn review_days<R: Rng + ?Sized>(&self, days: f64, rng: &mut R) -> i64 {
        (round_half_up(self.jitter(days, rng)) as i64).max(1)
    }

    /// Next state after a correct answer; `None` when the word is not in SRS.
    pub fn success<R: Rng + ?Sized>(
        &self,
        state: &WordState,
        now: Moment,
        rng: &mut R,
    ) -> Option<WordState> {
        let next = match *state {
            WordState::Learning { interval_secs, .. } => {
                match self.config.learning_steps_secs.iter().find(|&&step| step > interval_secs) {
                    Some(&step) => {
                        WordState::Learning { due_at: now.unix_time + step, interval_secs: step }
                    }
                    None => Self::graduate(now),
                }
            }
            WordState::Reviewing { interval_days, .. } => {
                let days = self.review_days(self.config.success_multiplier * interval_days as f64, rng);
                WordState::Reviewing { due_day: now.day_number + days, interval_days: days }
            }
            _ => return None,
        };
        debug!("SRS success: {:?} -> {:?}", state, next);
        Some(next)
    }

    /// Next state after a wrong answer; `None` when the word is not in SRS.
    pub fn failure<R: Rng + ?Sized>(
        &self,
        state: &WordState,
        now: Moment,
        rng: &mut R,
    ) -> Option<WordState> {
        let next = match *state {
            WordState::Learning { .. } => self.introduce(now),
            WordState::Reviewing { interval_days, .. } => {
                let days =
                    self.review_days((interval_days as f64).powf(self.config.fail_exponent), rng);
                WordState::Reviewing { due_day: now.day_number + days, interval_days: days }
            }
            _ => return None,
        };
        debug!("SRS failure: {:?} -> {:?}", state, next);
        Some(next)
    }

    /// The one word to review now: the most overdue learning word, else the
    /// most overdue reviewing word. Ties go to the older id.
    pub fn next_due<'a>(
        &self,
        words: impl IntoIterator<Item = &'a TrackedWord>,
        now: Moment,
    ) -> Option<&'a TrackedWord> {
        let mut learning: Option<(i64, &TrackedWord)> = None;
        let mut reviewing: Option<(i64, &TrackedWord)> = None;

        for word in words {
            let (slot, key) = match word.state {
                WordState::Learning { due_at, .. } if due_at <= now.unix_time => {
                    (&mut learning, due_at)
                }
                WordState::Reviewing { due_day, .. } if due_day <= now.day_number => {
                    (&mut reviewing, due_day)
                }
                _ => continue,
            };
            let better = match slot {
                Some((best_key, best)) => (key, word.id) < (*best_key, best.id),
                None => true,
            };
            if better {
                *slot = Some((key, word));
            }
        }

        learning.or(reviewing).map(|(_, word)| word)
    }

    pub fn quota_allows(&self, stats: &DayStats) -> bool {
        stats.intro_count < self.config.daily_intro_limit
    }

    pub fn analyze<'a>(
        &self,
        words: impl IntoIterator<Item = &'a TrackedWord>,
        now: Moment,
    ) -> SrsAnalysis {
        let mut analysis = SrsAnalysis::default();
        let mut next_learning_due: Option<i64> = None;

        for word in words {
            match word.state {
                WordState::Learning { due_at, .. } => {
                    analysis.total_learning += 1;
                    if due_at <= now.unix_time {
                        analysis.due_learning += 1;
                    } else {
                        next_learning_due = Some(next_learning_due.map_or(due_at, |t| t.min(due_at)));
                    }
                }
                WordState::Reviewing { due_day, .. } => {
                    analysis.total_reviewing += 1;
                    if due_day <= now.day_number {
                        analysis.due_reviewing += 1;
                    }
                }
                _ => {}
            }
        }

        if analysis.due_learning == 0 && analysis.due_reviewing == 0 {
            analysis.time_until_next_learning = next_learning_due.map(|t| t - now.unix_time);
        }
        analysis
    }
}

#[cfg(test)]
mod tests {
    use rand::{
        rngs::StdRng,
        SeedableRng,
    };

    use super::*;
    use crate::core::Known;

    const NOW: Moment = Moment { unix_time: 1_700_000_000, day_number: 19_676 };

    fn scheduler() -> Scheduler {
        Scheduler::new(SrsConfig::default())
    }

    fn word(id: u64, state: WordState) -> TrackedWord {
        let mut word = TrackedWord::new(id, format!("w{}", id), vec![format!("w{}", id)], 0);
        word.state = state;
        word
    }

    #[test]
    fn test_learning_steps_then_graduation() {
        let s = scheduler();
        let mut rng = StdRng::seed_from_u64(1);

        let state = s.introduce(NOW);
        assert_eq!(state, WordState::Learning { due_at: NOW.unix_time + 60, interval_secs: 60 });

        let state = s.success(&state, NOW, &mut rng).unwrap();
        assert_eq!(state, WordState::Learning { due_at: NOW.unix_time + 600, interval_secs: 600 });

        let state = s.success(&state, NOW, &mut rng).unwrap();
        assert_eq!(state, WordState::Reviewing { due_day: NOW.day_number + 1, interval_days: 1 });
    }

    #[test]
    fn test_learning_failure_restarts() {
        let s = scheduler();
        let state = WordState::Learning { due_at: 0, interval_secs: 600 };
        let next = s.failure(&state, NOW, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(next, WordState::Learning { due_at: NOW.unix_time + 60, interval_secs: 60 });
    }

    #[test]
    fn test_review_intervals_stay_in_jitter_bounds() {
        let s = scheduler();
        let mut rng = StdRng::seed_from_u64(3);

        for interval in [1i64, 2, 5, 30, 200] {
            for _ in 0..50 {
                let state = WordState::Reviewing { due_day: 0, interval_days: interval };

                let WordState::Reviewing { due_day, interval_days } =
                    s.success(&state, NOW, &mut rng).unwrap()
                else {
                    panic!("left review");
                };
                let base = 2.0 * interval as f64;
                assert!(interval_days >= round_half_up(base * 0.9).max(1.0) as i64);
                assert!(interval_days <= round_half_up(base * 1.1) as i64);
                assert_eq!(due_day, NOW.day_number + interval_days);

                let WordState::Reviewing { interval_days, .. } =
                    s.failure(&state, NOW, &mut rng).unwrap()
                else {
                    panic!("left review");
                };
                let base = (interval as f64).sqrt();
                assert!(interval_days >= 1);
                assert!(interval_days >= round_half_up(base * 0.9) as i64);
                assert!(interval_days <= round_half_up(base * 1.1).max(1.0) as i64);
            }
        }
    }

    #[test]
    fn test_non_srs_states_are_untouched() {
        let s = scheduler();
        let mut rng = StdRng::seed_from_u64(4);
        for state in [WordState::Ignored, WordState::Tracked { known: Known::No }] {
            assert_eq!(s.success(&state, NOW, &mut rng), None);
            assert_eq!(s.failure(&state, NOW, &mut rng), None);
        }
    }

    #[test]
    fn test_learning_due_beats_overdue_review() {
        let s = scheduler();
        let words = vec![
            word(1, WordState::Reviewing { due_day: NOW.day_number - 10, interval_days: 4 }),
            word(2, WordState::Learning { due_at: NOW.unix_time - 5, interval_secs: 60 }),
            word(3, WordState::Learning { due_at: NOW.unix_time - 50, interval_secs: 60 }),
            word(4, WordState::Learning { due_at: NOW.unix_time + 50, interval_secs: 60 }),
        ];
        assert_eq!(s.next_due(&words, NOW).map(|w| w.id), Some(3));
        assert_eq!(s.next_due(&words[..1], NOW).map(|w| w.id), Some(1));
        assert_eq!(s.next_due(&words[3..], NOW).map(|w| w.id), None);
    }

    #[test]
    fn test_review_due_on_its_day() {
        let s = scheduler();
        let words = vec![
            word(5, WordState::Reviewing { due_day: NOW.day_number, interval_days: 1 }),
            word(6, WordState::Reviewing { due_day: NOW.day_number + 1, interval_days: 1 }),
        ];
        assert_eq!(s.next_due(&words, NOW).map(|w| w.id), Some(5));
    }

    #[test]
    fn test_quota() {
        let s = Scheduler::new(SrsConfig { daily_intro_limit: 2, ..SrsConfig::default() });
        assert!(s.quota_allows(&DayStats { day_number: 1, intro_count: 1 }));
        assert!(!s.quota_allows(&DayStats { day_number: 1, intro_count: 2 }));
    }

    #[test]
    fn test_analysis() {
        let s = scheduler();
        let pending = vec![
            word(1, WordState::Learning { due_at: NOW.unix_time + 90, interval_secs: 60 }),
            word(2, WordState::Learning { due_at: NOW.unix_time + 30, interval_secs: 60 }),
            word(3, WordState::Reviewing { due_day: NOW.day_number + 2, interval_days: 2 }),
            word(4, WordState::Ignored),
        ];
        let analysis = s.analyze(&pending, NOW);
        assert_eq!(analysis.total_learning, 2);
        assert_eq!(analysis.total_reviewing, 1);
        assert_eq!(analysis.due_learning + analysis.due_reviewing, 0);
        assert_eq!(analysis.time_until_next_learning, Some(30));

        let mut due = pending;
        due.push(word(5, WordState::Reviewing { due_day: NOW.day_number, interval_days: 1 }));
        let analysis = s.analyze(&due, NOW);
        assert_eq!(analysis.due_reviewing, 1);
        assert_eq!(analysis.time_until_next_learning, None);
    }
}
