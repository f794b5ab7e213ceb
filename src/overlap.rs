/*!
 * Overlap detection between two tracks.
 *
 * Two events collide when their closed display intervals intersect,
 * including an exact touch at the boundary. Screen region plays no part in
 * the test; it is carried through for reporting.
 *
 * `find_overlaps` sweeps both tracks in start order and must return exactly
 * what the nested-loop `find_overlaps_brute_force` returns.
 */

use std::collections::BTreeSet;

use log::debug;
use serde::Serialize;

use crate::errors::TrackError;
use crate::timed_text::{EventTrack, TimedEvent};

/// Closed-interval intersection test
pub fn overlaps(a: &TimedEvent, b: &TimedEvent) -> bool {
    a.start() <= b.stop() && b.start() <= a.stop()
}

/// A colliding pair, track-A event first
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OverlapPair {
    /// Position of `a` in its track
    pub a_index: usize,
    /// Position of `b` in its track
    pub b_index: usize,
    pub a: TimedEvent,
    pub b: TimedEvent,
}

impl OverlapPair {
    fn from_indices(track_a: &EventTrack, track_b: &EventTrack, a_index: usize, b_index: usize) -> Self {
        Self {
            a_index,
            b_index,
            a: track_a.events()[a_index].clone(),
            b: track_b.events()[b_index].clone(),
        }
    }

    /// Whether both events sit in the same named region
    pub fn same_region(&self) -> bool {
        self.a.region() == self.b.region()
    }

    /// Length of the shared interval in microseconds
    pub fn shared_micros(&self) -> u64 {
        let start = self.a.start().max(self.b.start());
        let stop = self.a.stop().min(self.b.stop());
        stop.as_micros().saturating_sub(start.as_micros())
    }
}

/// Find every (A, B) pair whose intervals intersect.
///
/// Both tracks are validated before any comparison; a single inverted event
/// fails the whole call. Pairs come back ordered by A position, then B
/// position.
pub fn find_overlaps(track_a: &EventTrack, track_b: &EventTrack) -> Result<Vec<OverlapPair>, TrackError> {
    track_a.validate()?;
    track_b.validate()?;

    if track_a.is_empty() || track_b.is_empty() {
        return Ok(Vec::new());
    }

    let a_order = start_order(track_a);
    let b_order = start_order(track_b);
    let a_events = track_a.events();
    let b_events = track_b.events();

    // Events still on screen at the current sweep position
    let mut active_a: Vec<usize> = Vec::new();
    let mut active_b: Vec<usize> = Vec::new();

    // Ordered by (a_index, b_index); doubles as the dedup step
    let mut found: BTreeSet<(usize, usize)> = BTreeSet::new();

    let (mut i, mut j) = (0, 0);
    while i < a_order.len() || j < b_order.len() {
        let take_a = match (a_order.get(i), b_order.get(j)) {
            (Some(&ai), Some(&bj)) => a_events[ai].start() <= b_events[bj].start(),
            (Some(_), None) => true,
            (None, _) => false,
        };

        if take_a {
            let ai = a_order[i];
            i += 1;
            let start = a_events[ai].start();
            active_b.retain(|&bj| b_events[bj].stop() >= start);
            found.extend(active_b.iter().map(|&bj| (ai, bj)));
            active_a.push(ai);
        } else {
            let bj = b_order[j];
            j += 1;
            let start = b_events[bj].start();
            active_a.retain(|&ai| a_events[ai].stop() >= start);
            found.extend(active_a.iter().map(|&ai| (ai, bj)));
            active_b.push(bj);
        }
    }

    debug!(
        "Overlap sweep: {} '{}' event(s) x {} '{}' event(s) -> {} pair(s)",
        track_a.len(),
        track_a.label(),
        track_b.len(),
        track_b.label(),
        found.len()
    );

    Ok(found
        .into_iter()
        .map(|(ai, bj)| OverlapPair::from_indices(track_a, track_b, ai, bj))
        .collect())
}

/// Nested-loop reference implementation of `find_overlaps`
pub fn find_overlaps_brute_force(
    track_a: &EventTrack,
    track_b: &EventTrack,
) -> Result<Vec<OverlapPair>, TrackError> {
    track_a.validate()?;
    track_b.validate()?;

    let mut pairs = Vec::new();
    for (ai, a) in track_a.iter().enumerate() {
        for (bj, b) in track_b.iter().enumerate() {
            if overlaps(a, b) {
                pairs.push(OverlapPair::from_indices(track_a, track_b, ai, bj));
            }
        }
    }
    Ok(pairs)
}

/// Indices of the track's events, stable-sorted by start time
fn start_order(track: &EventTrack) -> Vec<usize> {
    let mut order: Vec<usize> = (0..track.len()).collect();
    order.sort_by_key(|&i| track.events()[i].start());
    order
}
