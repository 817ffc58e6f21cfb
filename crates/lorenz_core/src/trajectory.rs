//! Bounded trail of trajectory segments for line renderers.

use crate::config::TrailConfig;
use crate::vector::Vector3;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Vector3,
    pub to: Vector3,
}

/// Retains the most recent drawn segments of a trajectory.
///
/// A point only produces a segment once it is further than
/// `min_redraw_distance` from the last drawn point; segments are dropped
/// oldest-first once more than `max_segments` are held.
#[derive(Debug, Clone)]
pub struct TrajectoryTrail {
    config: TrailConfig,
    last_drawn: Vector3,
    segments: VecDeque<Segment>,
}

impl TrajectoryTrail {
    pub fn new(config: TrailConfig, origin: Vector3) -> Self {
        Self {
            config,
            last_drawn: origin,
            segments: VecDeque::with_capacity(config.max_segments.min(4096)),
        }
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn last_drawn(&self) -> Vector3 {
        self.last_drawn
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments oldest first.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter()
    }

    /// Offers a new trajectory point. Returns the appended segment, if any.
    pub fn push(&mut self, x: Vector3) -> Option<Segment> {
        if self.last_drawn.distance(x) <= self.config.min_redraw_distance {
            return None;
        }
        let segment = Segment {
            from: self.last_drawn,
            to: x,
        };
        self.last_drawn = x;
        self.segments.push_back(segment);
        while self.segments.len() > self.config.max_segments {
            self.segments.pop_front();
        }
        Some(segment)
    }

    /// Flattened `[from.x, from.y, from.z, to.x, to.y, to.z, ...]`, oldest first.
    pub fn positions(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.segments.len() * 6);
        for segment in &self.segments {
            out.extend_from_slice(&segment.from.to_array());
            out.extend_from_slice(&segment.to.to_array());
        }
        out
    }

    pub fn clear(&mut self, origin: Vector3) {
        self.segments.clear();
        self.last_drawn = origin;
    }
}
