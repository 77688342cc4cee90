// The footpath-transfer pass. Walks from every stop reached so far, except one already used as
// a ride-pass boarding input in an earlier round, since a footpath from it was computed back then
// and its own label can no longer change, to every stop a type-2 transfer connects it to, keeping
// only the best (earliest) arrival per destination. Predecessor bookkeeping is a no-op by
// construction here: a walk never changes which trip a stop was last reached by, so the last
// entry of the source stop's preceding-trip list simply carries through unchanged.

use std::collections::HashSet;

use crate::feed::{FeedView, StopIdx, TripIdx};
use crate::labels::{PriorSegment, SegmentTrip, StopLabelStore};

struct Candidate {
    to: StopIdx,
    from: StopIdx,
    arrival_offset: f64,
    last_trip: Option<TripIdx>,
}

/// Runs one footpath pass and returns the stops it newly reached or improved. These become the
/// ride pass's `last_updated` input for the next round. `already_processed` names stops whose
/// outgoing transfers were already walked in an earlier round's pass.
pub fn extend_footpaths(
    feed: &FeedView,
    store: &mut StopLabelStore,
    already_processed: &HashSet<StopIdx>,
    round: u32,
) -> Vec<StopIdx> {
    let segment_num = round * 2 + 1;

    // Snapshot candidates against the state as it stood entering this pass, so that a stop
    // updated earlier in this same pass (as someone's `to`) doesn't also act as a `from` with an
    // already-improved value before its own outgoing transfers have been considered.
    let mut candidates = Vec::new();
    for from in store.all_stops() {
        if already_processed.contains(&from) {
            continue;
        }
        let Some(label) = store.get(from) else { continue };
        let base_offset = label.arrival_offset;
        let last_trip = label.preceding_trips.last().copied();
        for transfer in feed.walking_transfers_from(from) {
            let min_time = transfer
                .min_transfer_time
                .expect("walking_transfers_from only yields rows with a transfer time");
            candidates.push(Candidate {
                to: transfer.to_stop,
                from,
                arrival_offset: base_offset + min_time,
                last_trip,
            });
        }
    }

    let mut updated = Vec::new();
    for c in candidates {
        let prior_segment = PriorSegment { from_stop: c.from, segment: SegmentTrip::Walk };
        let did_update =
            store.try_upsert(c.to, c.arrival_offset, round, segment_num, prior_segment, None, c.last_trip);
        if did_update {
            updated.push(c.to);
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedBuilder;
    use rgb::RGB8;

    fn feed_with_transfer() -> FeedView {
        let mut b = FeedBuilder::new();
        let a = b.add_stop("A", "Stop A", 0.0, 0.0);
        let bb = b.add_stop("B", "Stop B", 0.0, 0.001);
        b.add_transfer(a, bb, 90.0);
        b.build().unwrap()
    }

    #[test]
    fn walking_improves_an_unreached_stop() {
        let feed = feed_with_transfer();
        let a = feed.stop_idx("A").unwrap();
        let bb = feed.stop_idx("B").unwrap();
        let mut store = StopLabelStore::new(feed.num_stops());
        store.try_upsert(a, 0.0, 0, 0, PriorSegment { from_stop: a, segment: SegmentTrip::Walk }, None, None);

        let already_processed = HashSet::new();
        let updated = extend_footpaths(&feed, &mut store, &already_processed, 0);

        assert_eq!(updated, vec![bb]);
        assert_eq!(store.get(bb).unwrap().arrival_offset, 90.0);
        assert_eq!(store.get(bb).unwrap().segment_num, 1);
    }

    #[test]
    fn already_processed_stops_do_not_walk_again() {
        let feed = feed_with_transfer();
        let a = feed.stop_idx("A").unwrap();
        let mut store = StopLabelStore::new(feed.num_stops());
        store.try_upsert(a, 0.0, 0, 0, PriorSegment { from_stop: a, segment: SegmentTrip::Walk }, None, None);

        let mut already_processed = HashSet::new();
        already_processed.insert(a);
        let updated = extend_footpaths(&feed, &mut store, &already_processed, 0);
        assert!(updated.is_empty());
    }

    #[test]
    fn worse_walk_does_not_replace_a_better_existing_label() {
        let feed = feed_with_transfer();
        let a = feed.stop_idx("A").unwrap();
        let bb = feed.stop_idx("B").unwrap();
        let mut store = StopLabelStore::new(feed.num_stops());
        store.try_upsert(a, 0.0, 0, 0, PriorSegment { from_stop: a, segment: SegmentTrip::Walk }, None, None);
        store.try_upsert(bb, 10.0, 0, 0, PriorSegment { from_stop: a, segment: SegmentTrip::Walk }, None, None);

        let updated = extend_footpaths(&feed, &mut store, &HashSet::new(), 0);
        assert!(updated.is_empty());
        assert_eq!(store.get(bb).unwrap().arrival_offset, 10.0);
    }
}
