//! crates/echoes_core/src/sessions.rs
//!
//! Bounded log of completed session summaries and the insight derived from it.

use crate::clock::Clock;
use crate::domain::{Insight, SessionInput, SessionSummary};
use crate::drafts::format_elapsed;
use crate::ids::generate_id;
use crate::kv::{keys, read_json, remove_entry, write_json};
use crate::ports::KeyValueStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

pub const MAX_SESSIONS: usize = 10;

pub struct SessionLog {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl SessionLog {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Prepends `session` and keeps only the newest entries.
    pub fn save(&self, session: SessionSummary) {
        let _guard = self.lock();
        let mut history = self.history();
        history.insert(0, session);
        history.truncate(MAX_SESSIONS);
        write_json(self.store.as_ref(), keys::SESSIONS, &history);
    }

    /// Stamps a new summary with an id and the current time, then saves it.
    pub fn record(&self, input: SessionInput) -> SessionSummary {
        let now = self.clock.now_millis();
        let summary = SessionSummary {
            id: generate_id("session", now),
            timestamp: now,
            category_id: input.category_id,
            category_title: input.category_title,
            word_count: input.word_count,
            had_audio: input.had_audio,
            had_image: input.had_image,
        };
        info!(id = %summary.id, category = %summary.category_id, "Recording session");
        self.save(summary.clone());
        summary
    }

    pub fn history(&self) -> Vec<SessionSummary> {
        read_json(self.store.as_ref(), keys::SESSIONS).unwrap_or_default()
    }

    pub fn insight(&self) -> Option<Insight> {
        let history = self.history();
        let last = history.first()?;
        Some(Insight {
            is_returning: true,
            total_sessions: history.len(),
            last_category_id: last.category_id.clone(),
            last_category_title: last.category_title.clone(),
            last_session_at: last.timestamp,
            time_since: format_elapsed(self.clock.now_millis() - last.timestamp),
        })
    }

    pub fn clear(&self) {
        let _guard = self.lock();
        remove_entry(self.store.as_ref(), keys::SESSIONS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::MemoryStore;
    use crate::ports::PortResult;
    use std::thread;
    use std::time::Duration;

    const T0: i64 = 1_700_000_000_000;
    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn setup() -> (SessionLog, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        (SessionLog::new(store.clone(), clock.clone()), clock, store)
    }

    fn input(category: &str, words: u32) -> SessionInput {
        SessionInput {
            category_id: category.to_string(),
            category_title: format!("Title {category}"),
            word_count: words,
            had_audio: false,
            had_image: true,
        }
    }

    #[test]
    fn empty_log_has_no_insight() {
        let (log, _, _) = setup();
        assert!(log.history().is_empty());
        assert_eq!(log.insight(), None);
    }

    #[test]
    fn record_stamps_id_and_timestamp() {
        let (log, _, _) = setup();
        let summary = log.record(input("grief", 120));
        assert!(summary.id.starts_with("session_"));
        assert_eq!(summary.timestamp, T0);
        assert_eq!(log.history(), vec![summary]);
    }

    #[test]
    fn log_is_capped_most_recent_first() {
        let (log, clock, _) = setup();
        for n in 0..14u32 {
            clock.advance(1);
            log.record(input(&format!("c{n}"), n));
            assert_eq!(log.history().len(), (n as usize + 1).min(MAX_SESSIONS));
        }
        let history = log.history();
        assert_eq!(history[0].category_id, "c13");
        assert_eq!(history[MAX_SESSIONS - 1].category_id, "c4");
    }

    #[test]
    fn insight_reflects_latest_session() {
        let (log, clock, _) = setup();
        log.record(input("anger", 10));
        clock.advance(1_000);
        log.record(input("grief", 20));
        clock.advance(2 * DAY);

        let insight = log.insight().unwrap();
        assert!(insight.is_returning);
        assert_eq!(insight.total_sessions, 2);
        assert_eq!(insight.last_category_id, "grief");
        assert_eq!(insight.last_category_title, "Title grief");
        assert_eq!(insight.last_session_at, T0 + 1_000);
        assert_eq!(insight.time_since, "2d ago");
    }

    #[test]
    fn corrupt_log_reads_empty() {
        let (log, _, store) = setup();
        store.set(keys::SESSIONS, "[{\"broken\":").unwrap();
        assert!(log.history().is_empty());
        assert_eq!(log.insight(), None);
        log.record(input("joy", 3));
        assert_eq!(log.history().len(), 1);
    }

    #[derive(Default)]
    struct SlowReadStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for SlowReadStore {
        fn get(&self, key: &str) -> Option<String> {
            thread::sleep(Duration::from_millis(20));
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> PortResult<()> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> PortResult<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn concurrent_records_are_all_kept() {
        let clock = Arc::new(ManualClock::new(T0));
        let log = SessionLog::new(Arc::new(SlowReadStore::default()), clock);

        thread::scope(|s| {
            for n in 0..6u32 {
                let log = &log;
                s.spawn(move || log.record(input(&format!("c{n}"), n)));
            }
        });

        let mut words: Vec<u32> = log.history().iter().map(|s| s.word_count).collect();
        words.sort_unstable();
        assert_eq!(words, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn clear_removes_all_sessions() {
        let (log, _, _) = setup();
        log.record(input("joy", 3));
        log.clear();
        assert!(log.history().is_empty());
    }
}
