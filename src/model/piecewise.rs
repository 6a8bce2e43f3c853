//! Piecewise Linear Model
//!
//! The default position model: a greedy one-pass segmentation of the level's
//! keys into linear pieces, each guaranteeing that a key's true position
//! deviates from the prediction by at most [`EPSILON`] slots.
//!
//! Training walks the keys once and maintains a shrinking cone of admissible
//! slopes through the segment's first point. When a new point pushes the cone
//! empty, the segment is closed with the midpoint slope of the last valid
//! cone and a new segment starts at that point. Keys are projected to `f64`
//! through [`ModelKey`](super::ModelKey), so one trained model works for any
//! monotone-projectable key type.

use super::{ApproxRange, ModelKey, PositionModel};

/// Maximum prediction error, in slots, guaranteed per segment.
///
/// Bounds the search window a lookup must scan after prediction.
pub const EPSILON: usize = 64;

/// One linear piece: predicts `start + slope * (x - first_key)`
#[derive(Debug, Clone, Copy)]
struct Segment {
    first_key: f64,
    slope: f64,
    start: usize,
}

/// Epsilon-bounded piecewise linear position model
#[derive(Debug, Clone, Default)]
pub struct PiecewiseLinearModel {
    segments: Vec<Segment>,
    len: usize,
}

/// Shrinking cone of admissible slopes for the segment under construction
struct Cone {
    first_key: f64,
    start: usize,
    slope_lo: f64,
    slope_hi: f64,
}

impl Cone {
    fn open(first_key: f64, start: usize) -> Self {
        Self {
            first_key,
            start,
            slope_lo: 0.0,
            slope_hi: f64::INFINITY,
        }
    }

    /// Narrow the cone to admit point `(x, pos)` within EPSILON.
    /// Returns false when the cone would become empty.
    fn admit(&mut self, x: f64, pos: usize) -> bool {
        let dx = x - self.first_key;
        if dx <= 0.0 {
            // The projection collapsed two distinct keys; the point cannot
            // extend this segment.
            return false;
        }
        let dy = (pos - self.start) as f64;
        let lo = self.slope_lo.max((dy - EPSILON as f64) / dx);
        let hi = self.slope_hi.min((dy + EPSILON as f64) / dx);
        if lo > hi {
            return false;
        }
        self.slope_lo = lo;
        self.slope_hi = hi;
        true
    }

    fn close(&self) -> Segment {
        let slope = if self.slope_hi.is_finite() {
            (self.slope_lo + self.slope_hi) / 2.0
        } else {
            self.slope_lo
        };
        Segment {
            first_key: self.first_key,
            slope,
            start: self.start,
        }
    }
}

impl<K: ModelKey> PositionModel<K> for PiecewiseLinearModel {
    fn build<'a, I>(keys: I) -> Self
    where
        I: ExactSizeIterator<Item = &'a K>,
        K: 'a,
    {
        let len = keys.len();
        let mut segments = Vec::new();
        let mut cone: Option<Cone> = None;

        for (pos, key) in keys.enumerate() {
            let x = key.to_model();
            match cone.as_mut() {
                None => cone = Some(Cone::open(x, pos)),
                Some(current) => {
                    if !current.admit(x, pos) {
                        segments.push(current.close());
                        cone = Some(Cone::open(x, pos));
                    }
                }
            }
        }
        if let Some(current) = cone {
            segments.push(current.close());
        }

        Self { segments, len }
    }

    fn search(&self, key: &K) -> ApproxRange {
        if self.len == 0 {
            return ApproxRange::new(0, 0);
        }

        let x = key.to_model();
        // Last segment whose first key does not exceed x; for x below every
        // segment the first segment clamps the prediction to position 0.
        let idx = self.segments.partition_point(|s| s.first_key <= x);
        let seg = &self.segments[idx.saturating_sub(1)];
        let seg_end = match self.segments.get(idx) {
            Some(next) => next.start,
            None => self.len,
        };

        let predicted = (seg.start as f64 + seg.slope * (x - seg.first_key))
            .clamp(seg.start as f64, seg_end as f64) as usize;

        let lo = predicted.saturating_sub(EPSILON + 1);
        let hi = (predicted + EPSILON + 2).min(self.len);
        ApproxRange::new(lo, hi)
    }

    fn size_in_bytes(&self) -> usize {
        if self.segments.is_empty() {
            return 0;
        }
        std::mem::size_of::<Self>() + self.segments.len() * std::mem::size_of::<Segment>()
    }

    fn epsilon() -> Option<usize> {
        Some(EPSILON)
    }
}

impl PiecewiseLinearModel {
    /// Number of linear pieces in the trained model
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}
