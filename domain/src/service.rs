use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::merge::{dedup, merge};
use crate::sample::{sample, DISPLAY_SAMPLE_SIZE};
use crate::validate::validate_candidate;
use crate::{
    CoreError, ListOrder, NewTestimonial, StaticTestimonials, Testimonial, TestimonialRepository,
    ValidationError,
};

/// Non-fatal condition reported by [`TestimonialStore::load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadNotice {
    /// The remote collection could not be read; only static entries are shown.
    RemoteUnavailable(String),
}

/// What a load produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Size of the merged set after the load.
    pub merged: usize,
    pub notice: Option<LoadNotice>,
    /// False when a newer load had already been applied and this result was dropped.
    pub applied: bool,
}

/// Result of a successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The stored record, with the id and timestamp the repository assigned.
    pub testimonial: Testimonial,
    pub merged: usize,
    /// The caller should reset its pending form input.
    pub clear_input: bool,
    /// The caller should close the submission dialog.
    pub close_dialog: bool,
}

/// Submission failures. None of them change the store's state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid testimonial: {0}")]
    Validation(#[from] ValidationError),
    #[error("could not save testimonial: {0}")]
    Write(#[source] CoreError),
    #[error("testimonial saved but the list could not be refreshed: {0}")]
    Reload(#[source] CoreError),
}

struct StoreState {
    merged: Vec<Testimonial>,
    display: Vec<Testimonial>,
    show_all: bool,
    /// Sequence number of the load whose result is currently applied.
    applied_seq: u64,
    rng: StdRng,
}

impl StoreState {
    fn refresh_display(&mut self) {
        self.display = if self.show_all {
            self.merged.clone()
        } else {
            sample(&self.merged, &mut self.rng)
        };
    }
}

/// Merged view over the remote testimonial collection and the static list,
/// plus the current display selection.
///
/// The merged set, display selection and "show all" flag sit behind one
/// mutex so readers never see a half-applied load. Repository calls are made
/// outside the lock; each load is tagged with a sequence number and a result
/// older than the one already applied is dropped.
pub struct TestimonialStore<R: TestimonialRepository, S: StaticTestimonials> {
    repo: R,
    statics: S,
    state: Mutex<StoreState>,
    next_seq: AtomicU64,
}

impl<R: TestimonialRepository, S: StaticTestimonials> TestimonialStore<R, S> {
    pub fn new(repo: R, statics: S) -> Self {
        Self::with_rng(repo, statics, StdRng::from_entropy())
    }

    /// Build a store with a fixed sampling seed (tests, reproducible demos).
    pub fn with_seed(repo: R, statics: S, seed: u64) -> Self {
        Self::with_rng(repo, statics, StdRng::seed_from_u64(seed))
    }

    fn with_rng(repo: R, statics: S, rng: StdRng) -> Self {
        Self {
            repo,
            statics,
            state: Mutex::new(StoreState {
                merged: Vec::new(),
                display: Vec::new(),
                show_all: false,
                applied_seq: 0,
                rng,
            }),
            next_seq: AtomicU64::new(0),
        }
    }

    // Poisoning only means another caller panicked mid-update; every update
    // below swaps whole vectors, so the data is still consistent.
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_load(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `merged` if `seq` is newer than what is applied. Returns whether it was.
    fn finish_load(&self, seq: u64, merged: Vec<Testimonial>) -> bool {
        let mut state = self.state();
        if seq <= state.applied_seq {
            debug!(seq, applied = state.applied_seq, "discarding stale load");
            return false;
        }
        state.applied_seq = seq;
        state.merged = merged;
        state.refresh_display();
        true
    }

    fn fetch_merged(&self) -> Result<Vec<Testimonial>, CoreError> {
        let remote = self.repo.list(ListOrder::CreatedAtDesc)?;
        Ok(merge(remote, self.statics.testimonials()))
    }

    /// Rebuild the merged set from both sources.
    ///
    /// Never fails: if the remote collection cannot be read the static list
    /// is used alone and a notice is returned.
    pub fn load(&self) -> LoadOutcome {
        let seq = self.begin_load();
        let (merged, notice) = match self.fetch_merged() {
            Ok(merged) => (merged, None),
            Err(e) => {
                warn!(err = %e, "remote testimonials unavailable, showing static list");
                let statics = dedup(self.statics.testimonials().iter().cloned());
                (statics, Some(LoadNotice::RemoteUnavailable(e.to_string())))
            }
        };
        let count = merged.len();
        let applied = self.finish_load(seq, merged);
        LoadOutcome {
            merged: if applied { count } else { self.merged_len() },
            notice,
            applied,
        }
    }

    /// Validate and store a submission, then re-read both sources.
    ///
    /// On any failure the current merged set and display selection are left
    /// as they were.
    pub fn submit(&self, candidate: NewTestimonial) -> Result<SubmitOutcome, StoreError> {
        validate_candidate(&candidate)?;

        let created = self.repo.insert(candidate).map_err(StoreError::Write)?;
        info!(id = %created.id, name = %created.name, "testimonial stored");

        let seq = self.begin_load();
        let merged = self.fetch_merged().map_err(|e| {
            warn!(err = %e, id = %created.id, "reload after submit failed");
            StoreError::Reload(e)
        })?;
        self.finish_load(seq, merged);

        Ok(SubmitOutcome {
            testimonial: created,
            merged: self.merged_len(),
            clear_input: true,
            close_dialog: true,
        })
    }

    /// Switch between the full merged set and a fresh random sample.
    pub fn set_show_all(&self, flag: bool) {
        let mut state = self.state();
        state.show_all = flag;
        state.refresh_display();
    }

    pub fn show_all(&self) -> bool {
        self.state().show_all
    }

    /// The testimonials currently selected for display.
    pub fn display(&self) -> Vec<Testimonial> {
        self.state().display.clone()
    }

    /// The full deduplicated set.
    pub fn merged(&self) -> Vec<Testimonial> {
        self.state().merged.clone()
    }

    pub fn merged_len(&self) -> usize {
        self.state().merged.len()
    }

    /// Whether a "show all" control is worth offering.
    pub fn can_show_all(&self) -> bool {
        self.merged_len() > DISPLAY_SAMPLE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_repo::InMemoryTestimonialRepo;
    use crate::{Rating, Source};
    use std::collections::HashSet;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    /// Memory repo whose reads and writes can be switched off.
    #[derive(Default)]
    struct FlakyRepo {
        inner: InMemoryTestimonialRepo,
        fail_list: AtomicBool,
        fail_insert: AtomicBool,
        /// Fail every list call after the next successful insert.
        fail_list_after_insert: AtomicBool,
    }

    impl TestimonialRepository for FlakyRepo {
        fn list(&self, order: ListOrder) -> Result<Vec<Testimonial>, CoreError> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(CoreError::Repository("connection refused".into()));
            }
            self.inner.list(order)
        }

        fn insert(&self, candidate: NewTestimonial) -> Result<Testimonial, CoreError> {
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(CoreError::Repository("permission denied".into()));
            }
            let t = self.inner.insert(candidate)?;
            if self.fail_list_after_insert.load(Ordering::SeqCst) {
                self.fail_list.store(true, Ordering::SeqCst);
            }
            Ok(t)
        }
    }

    fn stat(id: &str, name: &str, content: &str) -> Testimonial {
        Testimonial {
            id: id.into(),
            name: name.into(),
            role: Some("Engineer".into()),
            company: None,
            content: content.into(),
            rating: Rating::default(),
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(86_400),
            source: Source::Static,
        }
    }

    fn statics(n: usize) -> Vec<Testimonial> {
        (0..n)
            .map(|i| stat(&format!("s-{i}"), &format!("Person {i}"), &format!("Review {i}")))
            .collect()
    }

    fn store(
        repo: Arc<FlakyRepo>,
        list: Vec<Testimonial>,
    ) -> TestimonialStore<Arc<FlakyRepo>, Vec<Testimonial>> {
        TestimonialStore::with_seed(repo, list, 11)
    }

    fn pair_count(items: &[Testimonial], name: &str, content: &str) -> usize {
        items
            .iter()
            .filter(|t| t.name == name && t.content == content)
            .count()
    }

    #[test]
    fn empty_store_before_load() {
        let s = store(Arc::new(FlakyRepo::default()), statics(3));
        assert!(s.merged().is_empty());
        assert!(s.display().is_empty());
        assert!(!s.show_all());
    }

    #[test]
    fn load_merges_remote_first() {
        let repo = Arc::new(FlakyRepo::default());
        repo.inner
            .insert(NewTestimonial::new("Remote Rae", "Shipped on time"))
            .unwrap();
        let s = store(repo, statics(2));

        let outcome = s.load();
        assert_eq!(outcome.merged, 3);
        assert!(outcome.notice.is_none());
        assert!(outcome.applied);

        let merged = s.merged();
        assert_eq!(merged[0].source, Source::Remote);
        assert_eq!(merged[1].id, "s-0");
        assert_eq!(merged[2].id, "s-1");
    }

    #[test]
    fn duplicate_across_sources_keeps_remote_copy() {
        let repo = Arc::new(FlakyRepo::default());
        let remote = repo
            .inner
            .insert(NewTestimonial::new("Alex", "Great collaborator"))
            .unwrap();
        let s = store(repo, vec![stat("s-alex", "Alex", "Great collaborator")]);
        s.load();

        let merged = s.merged();
        assert_eq!(pair_count(&merged, "Alex", "Great collaborator"), 1);
        assert_eq!(merged[0].id, remote.id);
        assert_eq!(merged[0].source, Source::Remote);
    }

    #[test]
    fn remote_failure_falls_back_to_static_list() {
        let repo = Arc::new(FlakyRepo::default());
        repo.fail_list.store(true, Ordering::SeqCst);
        let list = statics(4);
        let s = store(repo, list.clone());

        let outcome = s.load();
        assert_eq!(s.merged(), list);
        assert_eq!(outcome.merged, 4);
        assert!(matches!(
            outcome.notice,
            Some(LoadNotice::RemoteUnavailable(ref msg)) if msg.contains("connection refused")
        ));
    }

    #[test]
    fn display_is_bounded_sample_of_merged() {
        let s = store(Arc::new(FlakyRepo::default()), statics(10));
        s.load();

        let display = s.display();
        assert_eq!(display.len(), DISPLAY_SAMPLE_SIZE);
        let merged_ids: HashSet<_> = s.merged().into_iter().map(|t| t.id).collect();
        let shown: HashSet<_> = display.iter().map(|t| t.id.clone()).collect();
        assert_eq!(shown.len(), display.len());
        assert!(shown.is_subset(&merged_ids));
        assert!(s.can_show_all());
    }

    #[test]
    fn small_merged_set_is_shown_whole() {
        let s = store(Arc::new(FlakyRepo::default()), statics(4));
        s.load();
        assert_eq!(s.display().len(), 4);
        assert!(!s.can_show_all());
    }

    #[test]
    fn show_all_toggles_between_full_set_and_sample() {
        let s = store(Arc::new(FlakyRepo::default()), statics(9));
        s.load();

        s.set_show_all(true);
        assert!(s.show_all());
        assert_eq!(s.display(), s.merged());

        s.set_show_all(false);
        assert!(!s.show_all());
        assert_eq!(s.display().len(), DISPLAY_SAMPLE_SIZE);
    }

    #[test]
    fn load_while_show_all_keeps_full_set() {
        let repo = Arc::new(FlakyRepo::default());
        let s = store(repo.clone(), statics(8));
        s.set_show_all(true);
        s.load();
        assert_eq!(s.display().len(), 8);

        repo.inner.insert(NewTestimonial::new("New", "Entry")).unwrap();
        s.load();
        assert_eq!(s.display(), s.merged());
        assert_eq!(s.display().len(), 9);
    }

    #[test]
    fn submit_with_empty_name_is_rejected_without_write() {
        let repo = Arc::new(FlakyRepo::default());
        let s = store(repo.clone(), statics(3));
        s.load();

        let err = s
            .submit(NewTestimonial::new("", "great job").with_rating(Rating::new(5).unwrap()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.field == "name"));
        assert_eq!(s.merged_len(), 3);
        assert!(repo.inner.list(ListOrder::CreatedAtDesc).unwrap().is_empty());
    }

    #[test]
    fn submit_with_empty_content_is_rejected() {
        let s = store(Arc::new(FlakyRepo::default()), statics(3));
        s.load();
        let err = s.submit(NewTestimonial::new("Dana", "")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ref v) if v.field == "content"));
        assert_eq!(s.merged_len(), 3);
    }

    #[test]
    fn successful_submit_rebuilds_merged_set() {
        let s = store(Arc::new(FlakyRepo::default()), statics(3));
        s.load();
        assert_eq!(s.merged_len(), 3);

        let outcome = s
            .submit(NewTestimonial::new("Dana", "Excellent work"))
            .expect("submit");
        assert_eq!(outcome.merged, 4);
        assert!(outcome.clear_input);
        assert!(outcome.close_dialog);
        assert_eq!(outcome.testimonial.source, Source::Remote);
        assert!(!outcome.testimonial.id.is_empty());

        let merged = s.merged();
        assert_eq!(merged.len(), 4);
        assert_eq!(pair_count(&merged, "Dana", "Excellent work"), 1);
    }

    #[test]
    fn resubmitting_same_pair_does_not_duplicate_merged_entry() {
        let s = store(Arc::new(FlakyRepo::default()), statics(1));
        s.load();
        s.submit(NewTestimonial::new("Dana", "Excellent work")).unwrap();
        s.submit(NewTestimonial::new("Dana", "Excellent work")).unwrap();
        assert_eq!(pair_count(&s.merged(), "Dana", "Excellent work"), 1);
        assert_eq!(s.merged_len(), 2);
    }

    #[test]
    fn write_failure_leaves_state_untouched() {
        let repo = Arc::new(FlakyRepo::default());
        let s = store(repo.clone(), statics(8));
        s.load();
        let before_merged = s.merged();
        let before_display = s.display();

        repo.fail_insert.store(true, Ordering::SeqCst);
        let err = s.submit(NewTestimonial::new("Dana", "Excellent work")).unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
        assert_eq!(s.merged(), before_merged);
        assert_eq!(s.display(), before_display);
    }

    #[test]
    fn reload_failure_leaves_state_untouched() {
        let repo = Arc::new(FlakyRepo::default());
        let s = store(repo.clone(), statics(8));
        s.load();
        let before_merged = s.merged();
        let before_display = s.display();

        repo.fail_list_after_insert.store(true, Ordering::SeqCst);
        let err = s.submit(NewTestimonial::new("Dana", "Excellent work")).unwrap_err();
        assert!(matches!(err, StoreError::Reload(_)));
        assert_eq!(s.merged(), before_merged);
        assert_eq!(s.display(), before_display);
    }

    #[test]
    fn stale_load_result_is_discarded() {
        let s = store(Arc::new(FlakyRepo::default()), statics(0));
        let older = s.begin_load();
        let newer = s.begin_load();

        assert!(s.finish_load(newer, statics(2)));
        assert!(!s.finish_load(older, statics(5)));
        assert_eq!(s.merged(), statics(2));
    }

    #[test]
    fn concurrent_loads_settle_on_a_full_merge() {
        let repo = Arc::new(FlakyRepo::default());
        for i in 0..4 {
            repo.inner
                .insert(NewTestimonial::new(format!("R{i}"), "remote"))
                .unwrap();
        }
        let s = Arc::new(store(repo, statics(3)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || s.load())
            })
            .collect();
        for h in handles {
            h.join().expect("load thread");
        }
        assert_eq!(s.merged_len(), 7);
        assert_eq!(s.display().len(), DISPLAY_SAMPLE_SIZE);
    }
}
