// src/history.rs
use crate::frame::FeatureFrame;
use std::collections::VecDeque;

/// Fixed-capacity window of the most recent frames for one track, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    frames: VecDeque<FeatureFrame>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, frame: FeatureFrame) {
        self.frames.push_back(frame);
        if self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&FeatureFrame> {
        self.frames.back()
    }

    /// Frame before the latest one.
    pub fn previous(&self) -> Option<&FeatureFrame> {
        let len = self.frames.len();
        if len < 2 {
            return None;
        }
        self.frames.get(len - 2)
    }

    /// The last `n` frames (or fewer), oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &FeatureFrame> {
        let skip = self.frames.len().saturating_sub(n);
        self.frames.iter().skip(skip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureFrame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Feature;

    fn knee(v: f64) -> FeatureFrame {
        FeatureFrame::new().with(Feature::LeftKneeAngle, v)
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut buffer = HistoryBuffer::new(3);
        for v in [10.0, 20.0, 30.0, 40.0, 50.0] {
            buffer.push(knee(v));
        }
        assert_eq!(buffer.len(), 3);
        let kept: Vec<f64> = buffer
            .iter()
            .filter_map(|f| f.get(Feature::LeftKneeAngle))
            .collect();
        assert_eq!(kept, vec![30.0, 40.0, 50.0]);
        assert_eq!(buffer.latest().unwrap().get(Feature::LeftKneeAngle), Some(50.0));
        assert_eq!(buffer.previous().unwrap().get(Feature::LeftKneeAngle), Some(40.0));
    }

    #[test]
    fn last_n_is_clamped() {
        let mut buffer = HistoryBuffer::new(5);
        buffer.push(knee(1.0));
        buffer.push(knee(2.0));
        assert_eq!(buffer.last_n(3).count(), 2);
        assert_eq!(buffer.last_n(1).next().unwrap().get(Feature::LeftKneeAngle), Some(2.0));
    }

    #[test]
    fn zero_capacity_still_holds_latest() {
        let mut buffer = HistoryBuffer::new(0);
        buffer.push(knee(1.0));
        buffer.push(knee(2.0));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.len(), 1);
        assert!(buffer.previous().is_none());
    }
}
