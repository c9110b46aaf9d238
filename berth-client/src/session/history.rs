use std::collections::VecDeque;

use berth_protocol::TelemetryPoint;

/// Points kept for the usage chart unless configured otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Bounded FIFO of charted points; the oldest is evicted when full
#[derive(Debug, Clone)]
pub struct SampleHistory {
    points: VecDeque<TelemetryPoint>,
    capacity: usize,
}

impl SampleHistory {
    /// Capacity is clamped to at least one point
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, returning the one evicted to make room
    pub fn push(&mut self, point: TelemetryPoint) -> Option<TelemetryPoint> {
        let evicted = if self.points.len() == self.capacity {
            self.points.pop_front()
        } else {
            None
        };
        self.points.push_back(point);
        evicted
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TelemetryPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&TelemetryPoint> {
        self.points.back()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
