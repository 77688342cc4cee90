// The stop-label store. Each stop holds at most one label: the best (smallest) arrival offset
// found so far, monotone across rounds, plus the list of trips ridden to reach it and a pointer
// back to the segment that produced it. Reconstruction walks that pointer chain by `segment_num`
// rather than through parent references into shared mutable state, since the store only ever
// keeps the current winner per stop and earlier segments are not retained.

use arrayvec::ArrayVec;

use crate::feed::{StopIdx, TripIdx};

/// Upper bound on how many trips a preceding-trip list can hold. Round drivers must keep their
/// transfer limit `K` at or below this; `try_upsert` silently drops a push past capacity rather
/// than panic, since exceeding it would mean the caller configured a transfer bound this store
/// wasn't built for.
pub const MAX_PRECEDING_TRIPS: usize = 16;

pub type PrecedingTrips = ArrayVec<TripIdx, MAX_PRECEDING_TRIPS>;

/// What produced a label: a ride segment names the trip and the boarding/alighting positions
/// within it, a walk segment carries nothing beyond the predecessor stop itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTrip {
    Ride { trip_idx: TripIdx, board_position: usize, alight_position: usize },
    Walk,
}

/// A pointer to the segment that produced a label: which stop it came from and what kind of
/// segment connects them. `segment_num` itself lives on the [`Label`], since it's the ordering
/// key reconstruction walks by, not a property of the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorSegment {
    pub from_stop: StopIdx,
    pub segment: SegmentTrip,
}

/// The current best way to reach a stop. `segment_num` is even for a ride (`2k`) and odd for a
/// walk (`2k+1`); it's the sole ordering key reconstruction needs to walk the chain back to the
/// origin, since `round` alone can't distinguish a ride and its following walk within the same
/// round.
#[derive(Debug, Clone)]
pub struct Label {
    /// Arrival time as an offset in seconds from the search's departure time, not a clock time.
    /// This is what makes "adjusted arrival = raw arrival minus departure" a direct comparison.
    pub arrival_offset: f64,
    pub round: u32,
    pub segment_num: u32,
    pub prior_segment: Option<PriorSegment>,
    pub preceding_trips: PrecedingTrips,
}

/// Per-stop best-label table, indexed densely by [`StopIdx`]. A stop has at most one label at
/// any time: a strictly better arrival offset replaces it outright, a tying or worse one leaves
/// the existing label (and whoever wrote it first) untouched.
pub struct StopLabelStore {
    labels: Vec<Option<Label>>,
}

impl StopLabelStore {
    pub fn new(num_stops: usize) -> Self {
        Self { labels: vec![None; num_stops] }
    }

    pub fn has(&self, stop: StopIdx) -> bool {
        self.labels[stop as usize].is_some()
    }

    /// Seeds the search origin with a zero-offset label and no prior segment. Reconstruction
    /// stops as soon as it walks back to a label whose `prior_segment` is `None`.
    pub fn seed_origin(&mut self, stop: StopIdx) {
        self.labels[stop as usize] = Some(Label {
            arrival_offset: 0.0,
            round: 0,
            segment_num: 0,
            prior_segment: None,
            preceding_trips: PrecedingTrips::new(),
        });
    }

    pub fn get(&self, stop: StopIdx) -> Option<&Label> {
        self.labels[stop as usize].as_ref()
    }

    pub fn all_stops(&self) -> impl Iterator<Item = StopIdx> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.is_some().then_some(i as StopIdx))
    }

    /// The preceding-trip list currently recorded for `stop`, or an empty slice if unreached.
    pub fn preceding_of(&self, stop: StopIdx) -> &[TripIdx] {
        self.labels[stop as usize]
            .as_ref()
            .map(|l| l.preceding_trips.as_slice())
            .unwrap_or(&[])
    }

    /// Attempts to install a new label at `stop`. Returns `true` if `arrival_offset` strictly
    /// improved on whatever was there (or the stop was unreached), `false` otherwise, in which
    /// case nothing is written, preserving the first label a tie was ever resolved in favor of.
    ///
    /// `preceding_override`, when given, replaces the *base* preceding-trip list the ride pass
    /// builds on (the anchor stop's own list, before the trip just ridden is appended). When
    /// `None`, the base is the existing label's list at `stop` (or empty, if unreached). Either
    /// way, `trip_id` is then appended to that base unless it already equals the list's last
    /// entry. For the footpath pass this is a no-op (the predecessor's last trip carries through
    /// unchanged); for the ride pass it's where the ridden trip is recorded.
    pub fn try_upsert(
        &mut self,
        stop: StopIdx,
        arrival_offset: f64,
        round: u32,
        segment_num: u32,
        prior_segment: PriorSegment,
        preceding_override: Option<&PrecedingTrips>,
        trip_id: Option<TripIdx>,
    ) -> bool {
        let existing = self.labels[stop as usize].as_ref();
        let improves = match existing {
            None => true,
            Some(e) => arrival_offset < e.arrival_offset,
        };
        if !improves {
            return false;
        }

        let mut preceding_trips = match preceding_override {
            Some(list) => list.clone(),
            None => existing.map(|e| e.preceding_trips.clone()).unwrap_or_default(),
        };
        if let Some(tid) = trip_id {
            if preceding_trips.last().copied() != Some(tid) {
                let _ = preceding_trips.try_push(tid);
            }
        }

        self.labels[stop as usize] = Some(Label {
            arrival_offset,
            round,
            segment_num,
            prior_segment: Some(prior_segment),
            preceding_trips,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(from: StopIdx) -> PriorSegment {
        PriorSegment { from_stop: from, segment: SegmentTrip::Walk }
    }

    #[test]
    fn first_write_wins_on_ties() {
        let mut store = StopLabelStore::new(4);
        assert!(store.try_upsert(1, 100.0, 0, 0, seg(0), None, None));
        assert!(!store.try_upsert(1, 100.0, 0, 2, seg(0), None, None));
        assert_eq!(store.get(1).unwrap().segment_num, 0);
    }

    #[test]
    fn strictly_better_arrival_replaces_label() {
        let mut store = StopLabelStore::new(4);
        store.try_upsert(1, 100.0, 0, 0, seg(0), None, None);
        assert!(store.try_upsert(1, 50.0, 1, 2, seg(0), None, None));
        assert_eq!(store.get(1).unwrap().arrival_offset, 50.0);
    }

    #[test]
    fn walk_pass_derivation_is_a_no_op_append() {
        let mut store = StopLabelStore::new(4);
        let mut preceding = PrecedingTrips::new();
        preceding.push(7);
        store.try_upsert(0, 10.0, 0, 0, seg(0), Some(&preceding), None);
        store.try_upsert(1, 20.0, 0, 1, seg(0), None, Some(7));
        assert_eq!(store.preceding_of(1), &[7]);
    }

    #[test]
    fn unreached_stop_has_no_preceding_trips() {
        let store = StopLabelStore::new(2);
        assert!(store.preceding_of(0).is_empty());
        assert!(!store.has(0));
    }
}
