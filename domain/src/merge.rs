//! Merging and deduplication of testimonials from the two sources.

use std::collections::HashSet;

use crate::Testimonial;

/// Drop every testimonial whose `(name, content)` pair was already seen,
/// keeping the first occurrence and the original order.
pub fn dedup<I>(items: I) -> Vec<Testimonial>
where
    I: IntoIterator<Item = Testimonial>,
{
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Vec::new();
    for t in items {
        let (name, content) = t.dedup_key();
        if seen.insert((name.to_owned(), content.to_owned())) {
            out.push(t);
        }
    }
    out
}

/// Concatenate remote-then-static and deduplicate, so a remote entry wins over
/// a static one with the same pair.
pub fn merge(remote: Vec<Testimonial>, statics: &[Testimonial]) -> Vec<Testimonial> {
    dedup(remote.into_iter().chain(statics.iter().cloned()))
}
