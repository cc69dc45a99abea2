use std::sync::Mutex;

use crate::{
    Clock, CoreError, ListOrder, NewTestimonial, Source, SystemClock, Testimonial,
    TestimonialRepository,
};

/// Simple in-memory testimonial collection for tests and local demos. Not
/// thread-safe for high concurrency beyond the internal mutex guarding the list.
pub struct InMemoryTestimonialRepo {
    inner: Mutex<Inner>,
    clock: Box<dyn Clock>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    // Insertion order; `next_id` breaks created_at ties.
    items: Vec<(u64, Testimonial)>,
}

impl InMemoryTestimonialRepo {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock<C: Clock + 'static>(clock: C) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock: Box::new(clock),
        }
    }

    pub fn len(&self) -> Result<usize, CoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(inner.items.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryTestimonialRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestimonialRepository for InMemoryTestimonialRepo {
    fn list(&self, order: ListOrder) -> Result<Vec<Testimonial>, CoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        let mut items: Vec<_> = inner.items.iter().collect();
        items.sort_by(|(seq_a, a), (seq_b, b)| {
            (a.created_at, seq_a).cmp(&(b.created_at, seq_b))
        });
        if order == ListOrder::CreatedAtDesc {
            items.reverse();
        }
        Ok(items.into_iter().map(|(_, t)| t.clone()).collect())
    }

    fn insert(&self, candidate: NewTestimonial) -> Result<Testimonial, CoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        inner.next_id += 1;
        let seq = inner.next_id;
        let testimonial = Testimonial {
            id: format!("mem-{seq}"),
            name: candidate.name,
            role: candidate.role,
            company: candidate.company,
            content: candidate.content,
            rating: candidate.rating,
            created_at: self.clock.now(),
            source: Source::Remote,
        };
        inner.items.push((seq, testimonial.clone()));
        Ok(testimonial)
    }
}
