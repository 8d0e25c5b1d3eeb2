//! crates/echoes_core/src/drafts.rs
//!
//! The draft store: one "current" in-progress draft plus a bounded,
//! most-recent-first history of archived drafts.
//!
//! The current slot is a singleton, not keyed by category. Saving for a
//! category other than the current draft's starts a fresh draft (new id and
//! creation time) and discards the previous one without archiving it.

use crate::clock::Clock;
use crate::domain::{Draft, DraftInput, Millis};
use crate::ids::generate_id;
use crate::kv::{keys, read_json, remove_entry, write_json};
use crate::ports::KeyValueStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Archived drafts beyond this count are evicted, oldest first.
pub const MAX_HISTORY: usize = 20;

const MINUTE_MS: Millis = 60 * 1000;
const HOUR_MS: Millis = 60 * MINUTE_MS;
const DAY_MS: Millis = 24 * HOUR_MS;

/// Drafts untouched for longer than this are considered stale.
pub const STALE_AFTER_MS: Millis = DAY_MS;

pub struct DraftStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    /// Held for the whole read-modify-write of every mutating operation.
    write_lock: Mutex<()>,
}

impl DraftStore {
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

    /// Creates or updates the current draft and returns the stored record.
    pub fn save_draft(&self, input: DraftInput) -> Draft {
        let _guard = self.lock();
        let now = self.clock.now_millis();
        let draft = match self.current_draft() {
            Some(existing) if existing.category_id == input.category_id => Draft {
                id: existing.id,
                created_at: existing.created_at,
                category_id: input.category_id,
                category_title: input.category_title,
                text: input.text,
                drawing: input.drawing,
                transcription: input.transcription,
                updated_at: now,
            },
            previous => {
                if let Some(previous) = previous {
                    debug!(
                        from = %previous.category_id,
                        to = %input.category_id,
                        "Category changed; starting a fresh draft"
                    );
                }
                Draft {
                    id: generate_id("draft", now),
                    created_at: now,
                    category_id: input.category_id,
                    category_title: input.category_title,
                    text: input.text,
                    drawing: input.drawing,
                    transcription: input.transcription,
                    updated_at: now,
                }
            }
        };
        write_json(self.store.as_ref(), keys::CURRENT_DRAFT, &draft);
        draft
    }

    pub fn current_draft(&self) -> Option<Draft> {
        read_json(self.store.as_ref(), keys::CURRENT_DRAFT)
    }

    pub fn draft_for_category(&self, category_id: &str) -> Option<Draft> {
        self.current_draft()
            .filter(|draft| draft.category_id == category_id)
    }

    /// Moves a non-blank current draft to the front of the history and empties the slot.
    pub fn archive_draft(&self) {
        let _guard = self.lock();
        let Some(draft) = self.current_draft() else {
            return;
        };
        if draft.is_blank() {
            debug!(id = %draft.id, "Discarding blank draft instead of archiving");
        } else {
            let mut history = self.draft_history();
            info!(id = %draft.id, category = %draft.category_id, "Archiving draft");
            history.insert(0, draft);
            history.truncate(MAX_HISTORY);
            write_json(self.store.as_ref(), keys::DRAFTS, &history);
        }
        remove_entry(self.store.as_ref(), keys::CURRENT_DRAFT);
    }

    pub fn clear_current_draft(&self) {
        let _guard = self.lock();
        remove_entry(self.store.as_ref(), keys::CURRENT_DRAFT);
    }

    pub fn draft_history(&self) -> Vec<Draft> {
        read_json(self.store.as_ref(), keys::DRAFTS).unwrap_or_default()
    }

    pub fn delete_draft(&self, id: &str) {
        let _guard = self.lock();
        let mut history = self.draft_history();
        let before = history.len();
        history.retain(|draft| draft.id != id);
        if history.len() != before {
            write_json(self.store.as_ref(), keys::DRAFTS, &history);
        }
    }

    pub fn has_draft(&self) -> bool {
        self.current_draft().is_some()
    }

    pub fn is_draft_stale(&self, draft: &Draft) -> bool {
        self.clock.now_millis() - draft.updated_at > STALE_AFTER_MS
    }

    pub fn time_since(&self, timestamp: Millis) -> String {
        format_elapsed(self.clock.now_millis() - timestamp)
    }
}

/// Formats an elapsed duration with integer truncation. Negative values read as "just now".
pub fn format_elapsed(elapsed_ms: Millis) -> String {
    if elapsed_ms < MINUTE_MS {
        "just now".to_string()
    } else if elapsed_ms < HOUR_MS {
        format!("{}m ago", elapsed_ms / MINUTE_MS)
    } else if elapsed_ms < DAY_MS {
        format!("{}h ago", elapsed_ms / HOUR_MS)
    } else {
        format!("{}d ago", elapsed_ms / DAY_MS)
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

    const T0: Millis = 1_700_000_000_000;

    /// Widens the gap between a read and the write that follows it.
    #[derive(Default)]
    struct SlowReadStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for SlowReadStore {
        fn get(&self, key: &str) -> Option<String> {
            thread::sleep(Duration::from_millis(50));
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> PortResult<()> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> PortResult<()> {
            self.inner.remove(key)
        }
    }

    fn setup() -> (DraftStore, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        (DraftStore::new(store.clone(), clock.clone()), clock, store)
    }

    fn input(category: &str, text: &str) -> DraftInput {
        DraftInput {
            category_id: category.to_string(),
            category_title: category.to_uppercase(),
            text: text.to_string(),
            drawing: None,
            transcription: None,
        }
    }

    #[test]
    fn first_save_creates_draft() {
        let (drafts, _, _) = setup();
        assert!(!drafts.has_draft());
        let draft = drafts.save_draft(input("grief", "hello"));
        assert!(draft.id.starts_with(&format!("draft_{T0}_")));
        assert_eq!(draft.created_at, T0);
        assert_eq!(draft.updated_at, T0);
        assert_eq!(drafts.current_draft(), Some(draft));
        assert!(drafts.has_draft());
    }

    #[test]
    fn same_category_keeps_id_and_created_at() {
        let (drafts, clock, _) = setup();
        let first = drafts.save_draft(input("grief", "a"));
        let mut last_updated = first.updated_at;
        for (i, text) in ["ab", "abc", "abcd"].iter().enumerate() {
            clock.advance(1_000 * (i as Millis + 1));
            let next = drafts.save_draft(DraftInput {
                drawing: Some("data:image/png;base64,AAAA".to_string()),
                ..input("grief", text)
            });
            assert_eq!(next.id, first.id);
            assert_eq!(next.created_at, first.created_at);
            assert!(next.updated_at >= last_updated);
            assert_eq!(next.text, *text);
            assert!(next.drawing.is_some());
            last_updated = next.updated_at;
        }
    }

    #[test]
    fn switching_category_starts_fresh_draft() {
        let (drafts, clock, _) = setup();
        let grief = drafts.save_draft(input("grief", "missing them"));
        clock.advance(5_000);
        let anger = drafts.save_draft(input("anger", "so unfair"));
        assert_ne!(anger.id, grief.id);
        assert_eq!(anger.created_at, T0 + 5_000);
        assert_eq!(drafts.draft_for_category("grief"), None);
        assert_eq!(drafts.draft_for_category("anger"), Some(anger));
        // The replaced draft is discarded, not archived.
        assert!(drafts.draft_history().is_empty());
    }

    #[test]
    fn corrupt_current_draft_reads_as_none_and_heals() {
        let (drafts, _, store) = setup();
        store.set(keys::CURRENT_DRAFT, "{{{").unwrap();
        assert_eq!(drafts.current_draft(), None);
        assert!(!drafts.has_draft());
        let healed = drafts.save_draft(input("fear", "ok"));
        assert_eq!(drafts.current_draft(), Some(healed));
    }

    #[test]
    fn archive_moves_draft_into_history() {
        let (drafts, _, _) = setup();
        drafts.save_draft(input("grief", "hello"));
        drafts.archive_draft();
        assert_eq!(drafts.draft_history()[0].text, "hello");
        assert_eq!(drafts.current_draft(), None);
    }

    #[test]
    fn archiving_blank_draft_leaves_history_untouched() {
        let (drafts, _, _) = setup();
        drafts.save_draft(input("grief", "kept"));
        drafts.archive_draft();
        drafts.save_draft(input("grief", "   \n\t "));
        drafts.archive_draft();
        assert_eq!(drafts.draft_history().len(), 1);
        assert!(!drafts.has_draft());
    }

    #[test]
    fn archive_without_current_draft_is_noop() {
        let (drafts, _, _) = setup();
        drafts.archive_draft();
        assert!(drafts.draft_history().is_empty());
    }

    #[test]
    fn history_is_capped_and_drops_oldest() {
        let (drafts, clock, _) = setup();
        for n in 0..25 {
            clock.advance(1);
            // Alternate categories so every save yields a distinct draft.
            drafts.save_draft(input(&format!("cat{}", n % 2), &format!("entry {n}")));
            drafts.archive_draft();
            assert_eq!(drafts.draft_history().len(), (n + 1).min(MAX_HISTORY));
        }
        let history = drafts.draft_history();
        assert_eq!(history[0].text, "entry 24");
        assert_eq!(history[MAX_HISTORY - 1].text, "entry 5");
    }

    #[test]
    fn delete_draft_removes_only_matching_entry() {
        let (drafts, clock, _) = setup();
        drafts.save_draft(input("a", "one"));
        drafts.archive_draft();
        clock.advance(10);
        drafts.save_draft(input("b", "two"));
        drafts.archive_draft();
        let target = drafts.draft_history()[1].id.clone();

        drafts.delete_draft("does-not-exist");
        assert_eq!(drafts.draft_history().len(), 2);

        drafts.delete_draft(&target);
        let history = drafts.draft_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "two");
    }

    #[test]
    fn clear_current_draft_empties_slot() {
        let (drafts, _, _) = setup();
        drafts.save_draft(input("grief", "hello"));
        drafts.clear_current_draft();
        assert!(!drafts.has_draft());
        assert!(drafts.draft_history().is_empty());
    }

    #[test]
    fn save_during_archive_is_not_lost() {
        let clock = Arc::new(ManualClock::new(T0));
        let drafts = DraftStore::new(Arc::new(SlowReadStore::default()), clock);
        drafts.save_draft(input("grief", "v1"));

        let saved = thread::scope(|s| {
            s.spawn(|| drafts.archive_draft());
            thread::sleep(Duration::from_millis(20));
            s.spawn(|| drafts.save_draft(input("grief", "v2 typed after")))
                .join()
                .unwrap()
        });

        assert_eq!(drafts.current_draft(), Some(saved));
        let texts: Vec<String> = drafts.draft_history().into_iter().map(|d| d.text).collect();
        assert_eq!(texts, vec!["v1"]);
    }

    #[test]
    fn concurrent_deletes_each_take_effect() {
        let clock = Arc::new(ManualClock::new(T0));
        let drafts = DraftStore::new(Arc::new(SlowReadStore::default()), clock.clone());
        for n in 0..4 {
            clock.advance(1);
            drafts.save_draft(input(&format!("c{n}"), &format!("entry {n}")));
            drafts.archive_draft();
        }
        let ids: Vec<String> = drafts.draft_history().into_iter().map(|d| d.id).collect();

        thread::scope(|s| {
            for id in &ids[..3] {
                let drafts = &drafts;
                s.spawn(move || drafts.delete_draft(id));
            }
        });

        let remaining: Vec<String> = drafts.draft_history().into_iter().map(|d| d.id).collect();
        assert_eq!(remaining, vec![ids[3].clone()]);
    }

    #[test]
    fn staleness_threshold_is_24_hours() {
        let (drafts, clock, _) = setup();
        let draft = drafts.save_draft(input("grief", "x"));
        clock.set(T0 + 23 * HOUR_MS + 59 * MINUTE_MS);
        assert!(!drafts.is_draft_stale(&draft));
        clock.set(T0 + 24 * HOUR_MS + MINUTE_MS);
        assert!(drafts.is_draft_stale(&draft));
    }

    #[test]
    fn time_since_formats() {
        let (drafts, _, _) = setup();
        assert_eq!(drafts.time_since(T0 - 30_000), "just now");
        assert_eq!(drafts.time_since(T0 - 300_000), "5m ago");
        assert_eq!(drafts.time_since(T0 - 10_800_000), "3h ago");
        assert_eq!(drafts.time_since(T0 - 172_800_000), "2d ago");
    }

    #[test]
    fn format_elapsed_truncates() {
        assert_eq!(format_elapsed(59_999), "just now");
        assert_eq!(format_elapsed(119_999), "1m ago");
        assert_eq!(format_elapsed(HOUR_MS - 1), "59m ago");
        assert_eq!(format_elapsed(DAY_MS - 1), "23h ago");
        assert_eq!(format_elapsed(-5_000), "just now");
    }
}
