//! Flash onset detection.
//!
//! An onset is sample 0 (a trial always starts with a flash) and every
//! rising edge `flashing[i - 1] == 0 && flashing[i] != 0` after it.
//! A run of consecutive high samples is one onset.

/// Lazy iterator over the onset indices of one trial's flash timeline.
///
/// The iterator only borrows the timeline, so calling [`onsets`] again or
/// cloning a fresh iterator yields the identical sequence.
#[derive(Debug, Clone)]
pub struct Onsets<'a> {
    flashing: &'a [u8],
    next: usize,
}

/// Onset indices of `flashing`, strictly increasing, starting with 0 for a
/// non-empty timeline.
pub fn onsets(flashing: &[u8]) -> Onsets<'_> {
    Onsets { flashing, next: 0 }
}

impl Iterator for Onsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next < self.flashing.len() {
            let i = self.next;
            self.next += 1;
            if i == 0 || (self.flashing[i - 1] == 0 && self.flashing[i] != 0) {
                return Some(i);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.flashing.len() - self.next))
    }
}

impl std::iter::FusedIterator for Onsets<'_> {}
