// The ride-extension pass. For each stop reached by the previous round, find every trip
// boardable there, but exclude a (stop, trip) pair already present in that stop's preceding-trip
// list, otherwise a later round could "reboard" the very trip that produced the label in the
// first place and manufacture an illusory improvement. Among the remaining candidates, a trip is
// only ever ridden from its single best anchor: the last_updated stop at which it can be boarded
// latest along its own stop_sequence, since boarding later never loses time and may skip stops
// that would otherwise need a separate (and strictly worse) round to reach.

use std::collections::{HashMap, HashSet};

use crate::feed::{FeedView, StopIdx, Timestamp, TripIdx};
use crate::labels::{PriorSegment, SegmentTrip, StopLabelStore};

/// Runs one ride-extension pass. `last_updated` are the stops newly reached by the previous
/// round's footpath pass (or just the origin, for round 0); `round` is the current round index
/// `k`, which becomes the even segment number `2k` for every label this pass writes.
pub fn extend_rides(
    feed: &FeedView,
    store: &mut StopLabelStore,
    last_updated: &[StopIdx],
    departure_time: Timestamp,
    round: u32,
) {
    let mut excluded: HashSet<(StopIdx, TripIdx)> = HashSet::new();
    for &stop in last_updated {
        for &trip in store.preceding_of(stop) {
            excluded.insert((stop, trip));
        }
    }

    // One anchor boarding per candidate trip: the last_updated stop reachable latest along the
    // trip's own stop_sequence.
    let mut anchors: HashMap<TripIdx, (StopIdx, usize)> = HashMap::new();
    for &stop in last_updated {
        for boarding in feed.boardings_at(stop) {
            if excluded.contains(&(stop, boarding.trip_idx)) {
                continue;
            }
            let candidate_arrival = feed.trip_rows(boarding.trip_idx)[boarding.position].arrival_time;
            let is_better = match anchors.get(&boarding.trip_idx) {
                None => true,
                Some(&(_, existing_pos)) => {
                    candidate_arrival > feed.trip_rows(boarding.trip_idx)[existing_pos].arrival_time
                }
            };
            if is_better {
                anchors.insert(boarding.trip_idx, (stop, boarding.position));
            }
        }
    }

    let segment_num = round * 2;
    for (trip_idx, (anchor_stop, anchor_pos)) in anchors {
        let rows = feed.trip_rows(trip_idx);
        let anchor_row = rows[anchor_pos];

        let Some(anchor_label) = store.get(anchor_stop) else { continue };
        // A traveler can only board a trip at a stop after they've actually arrived there.
        if (anchor_row.departure_time as f64) < anchor_label.arrival_offset + departure_time as f64 {
            continue;
        }
        let preceding_base = anchor_label.preceding_trips.clone();

        for (position, row) in rows.iter().enumerate().skip(anchor_pos) {
            let arrival_offset = row.arrival_time as f64 - departure_time as f64;
            let prior_segment = PriorSegment {
                from_stop: anchor_stop,
                segment: SegmentTrip::Ride { trip_idx, board_position: anchor_pos, alight_position: position },
            };
            store.try_upsert(
                row.stop_idx,
                arrival_offset,
                round,
                segment_num,
                prior_segment,
                Some(&preceding_base),
                Some(trip_idx),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedBuilder;
    use crate::labels::SegmentTrip;
    use rgb::RGB8;

    fn line_feed() -> FeedView {
        let mut b = FeedBuilder::new();
        let a = b.add_stop("A", "Stop A", 0.0, 0.0);
        let bb = b.add_stop("B", "Stop B", 0.0, 0.01);
        let c = b.add_stop("C", "Stop C", 0.0, 0.02);
        let route = b.add_route("R1", "1", "Line", RGB8::new(0, 0, 0));
        let trip = b.add_trip("T1", route);
        b.add_stop_time(trip, a, 1, 0, 0);
        b.add_stop_time(trip, bb, 2, 600, 600);
        b.add_stop_time(trip, c, 3, 1200, 1200);
        b.build().unwrap()
    }

    #[test]
    fn boarding_at_origin_reaches_every_downstream_stop() {
        let feed = line_feed();
        let a = feed.stop_idx("A").unwrap();
        let c = feed.stop_idx("C").unwrap();
        let mut store = StopLabelStore::new(feed.num_stops());
        store.try_upsert(
            a,
            0.0,
            0,
            0,
            PriorSegment { from_stop: a, segment: SegmentTrip::Walk },
            None,
            None,
        );
        extend_rides(&feed, &mut store, &[a], 0, 0);
        let label = store.get(c).unwrap();
        assert_eq!(label.arrival_offset, 1200.0);
        assert_eq!(label.segment_num, 0);
    }

    #[test]
    fn excludes_trip_already_ridden_from_that_stop() {
        let feed = line_feed();
        let a = feed.stop_idx("A").unwrap();
        let bb = feed.stop_idx("B").unwrap();
        let trip = feed.trip_index["T1"];
        let mut store = StopLabelStore::new(feed.num_stops());
        store.try_upsert(
            a,
            0.0,
            0,
            0,
            PriorSegment { from_stop: a, segment: SegmentTrip::Walk },
            None,
            None,
        );
        // Simulate B already having been reached via T1 in a prior round.
        let mut preceding = crate::labels::PrecedingTrips::new();
        preceding.push(trip);
        store.try_upsert(
            bb,
            600.0,
            0,
            0,
            PriorSegment { from_stop: a, segment: SegmentTrip::Ride { trip_idx: trip, board_position: 0, alight_position: 1 } },
            Some(&preceding),
            None,
        );
        extend_rides(&feed, &mut store, &[bb], 0, 1);
        // B's own label shouldn't regress, and nothing new should come from reboarding T1 at B.
        assert_eq!(store.get(bb).unwrap().arrival_offset, 600.0);
    }
}
