//! Fixed-capacity raw sample window.
//!
//! The window absorbs batches of any length while holding at most `capacity`
//! samples, oldest first. Insertion is a single pass: an overfull window (only
//! reachable through [`RawWindow::from_samples`]) is first trimmed to capacity,
//! then the batch is placed according to the window's [`WindowStatus`].
//!
//! After every insertion:
//! - `len() <= capacity()`
//! - existing samples keep their relative order
//! - the last `min(batch.len(), capacity)` samples of the batch sit at the tail,
//!   in their original order
use std::collections::VecDeque;

/// Occupancy of a window relative to its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    /// No samples.
    Empty,
    /// Exactly `capacity` samples.
    Full,
    /// More than `capacity` samples.
    Overfull,
    /// Between one and `capacity - 1` samples.
    PartiallyFull,
}

/// Ordered raw samples with a fixed capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RawWindow {
    /// Empty window.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Window pre-filled with `capacity` zeros.
    pub fn zeroed(capacity: usize) -> Self {
        Self {
            samples: std::iter::repeat(0.0).take(capacity).collect(),
            capacity,
        }
    }

    /// Window holding `samples` as-is, even when that exceeds `capacity`.
    ///
    /// The next [`insert`](Self::insert) trims the excess.
    pub fn from_samples(samples: impl IntoIterator<Item = f64>, capacity: usize) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            capacity,
        }
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples are held.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples, oldest first.
    pub fn samples(&self) -> &VecDeque<f64> {
        &self.samples
    }

    /// Copy of the samples, oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// Classify the current occupancy.
    pub fn status(&self) -> WindowStatus {
        let len = self.samples.len();
        if len == 0 {
            WindowStatus::Empty
        } else if len == self.capacity {
            WindowStatus::Full
        } else if len > self.capacity {
            WindowStatus::Overfull
        } else {
            WindowStatus::PartiallyFull
        }
    }

    /// Absorb a batch, returning how many of its samples were kept.
    pub fn insert(&mut self, data: &[f64]) -> usize {
        let cap = self.capacity;

        if self.status() == WindowStatus::Overfull {
            let excess = self.samples.len() - cap;
            self.samples.drain(..excess);
        }

        let tail = &data[data.len().saturating_sub(cap)..];

        match self.status() {
            WindowStatus::Empty => {
                self.samples.extend(tail);
            }
            WindowStatus::Full | WindowStatus::Overfull => {
                if data.len() < cap {
                    // Slide forward by the batch length.
                    self.samples.drain(..data.len());
                    self.samples.extend(data);
                } else if data.len() == cap {
                    self.samples.clear();
                    self.samples.extend(data);
                } else {
                    self.samples.clear();
                    self.samples.extend(tail);
                }
            }
            WindowStatus::PartiallyFull => {
                let len = self.samples.len();
                if len + data.len() <= cap {
                    self.samples.extend(data);
                } else if data.len() >= cap {
                    self.samples.clear();
                    self.samples.extend(tail);
                } else {
                    self.samples.drain(..len + data.len() - cap);
                    self.samples.extend(data);
                }
            }
        }

        tail.len()
    }
}
