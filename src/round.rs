// The round driver. Alternates a ride-extension pass and a footpath pass for up to
// `transfer_limit + 1` rounds, stopping early the moment a ride pass fails to reach any new stop.
// That's the only termination check; a footpath-only round never happening is not grounds to
// stop, since the next round's ride pass might still find something from stops the previous
// footpath pass reached. `already_processed` tracks every stop that has ever been a ride pass's
// input, so the footpath pass never re-walks from a stop whose own label can no longer change.

use std::collections::HashSet;

use crate::feed::{FeedView, StopIdx, Timestamp};
use crate::footpath::extend_footpaths;
use crate::labels::StopLabelStore;
use crate::ride::extend_rides;

#[derive(Clone, Copy)]
pub struct SearchConfig<'a> {
    /// Maximum number of transfers (`K`); the search runs rounds `0..=transfer_limit`.
    pub transfer_limit: u32,
    pub departure_time: Timestamp,
    /// Checked once per round, after the footpath pass and before the next ride pass; a `true`
    /// ends the search early, producing a partial result identical to one that terminated
    /// naturally at the last completed round. `None` means the search always runs to completion.
    pub cancel: Option<&'a dyn Fn() -> bool>,
}

impl<'a> std::fmt::Debug for SearchConfig<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("transfer_limit", &self.transfer_limit)
            .field("departure_time", &self.departure_time)
            .field("cancel", &self.cancel.map(|_| "<fn>"))
            .finish()
    }
}

impl<'a> SearchConfig<'a> {
    pub fn new(transfer_limit: u32, departure_time: Timestamp) -> Self {
        Self { transfer_limit, departure_time, cancel: None }
    }
}

/// Runs the earliest-arrival search from `origin` against every stop in the feed. The returned
/// store holds, for every stop it ever improved, the best arrival offset and a reconstructable
/// path back to `origin`. Querying a specific destination (or finding none was reached) is left
/// to the caller.
pub fn search(feed: &FeedView, origin: StopIdx, config: SearchConfig) -> StopLabelStore {
    let mut store = StopLabelStore::new(feed.num_stops());
    store.seed_origin(origin);

    let mut last_updated = vec![origin];
    let mut already_processed: HashSet<StopIdx> = HashSet::new();

    for round in 0..=config.transfer_limit {
        let stops_before = store.all_stops().count();
        extend_rides(feed, &mut store, &last_updated, config.departure_time, round);
        let added = store.all_stops().count() - stops_before;

        if added == 0 {
            log::info!("no valid transfers found after round {round}");
            break;
        }

        let ride_pass_input = std::mem::take(&mut last_updated);
        last_updated = extend_footpaths(feed, &mut store, &already_processed, round);
        already_processed.extend(ride_pass_input);

        log::debug!(
            "round {round}: {added} stop(s) reached by ride, {} by footpath",
            last_updated.len()
        );

        if config.cancel.is_some_and(|cancel| cancel()) {
            log::debug!("search cancelled after round {round}");
            break;
        }
    }

    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedBuilder;
    use rgb::RGB8;

    // A -> B by trip, B -> C only by a footpath transfer.
    fn feed_with_walk_leg() -> FeedView {
        let mut b = FeedBuilder::new();
        let a = b.add_stop("A", "A", 0.0, 0.0);
        let bb = b.add_stop("B", "B", 0.0, 0.01);
        let c = b.add_stop("C", "C", 0.0, 0.011);
        let route = b.add_route("R1", "1", "Line", RGB8::new(0, 0, 0));
        let trip = b.add_trip("T1", route);
        b.add_stop_time(trip, a, 1, 0, 0);
        b.add_stop_time(trip, bb, 2, 300, 300);
        b.add_transfer(bb, c, 120.0);
        b.build().unwrap()
    }

    #[test]
    fn search_reaches_a_stop_behind_one_transfer() {
        let feed = feed_with_walk_leg();
        let a = feed.stop_idx("A").unwrap();
        let c = feed.stop_idx("C").unwrap();
        let store = search(&feed, a, SearchConfig::new(4, 0));
        assert_eq!(store.get(c).unwrap().arrival_offset, 420.0);
    }

    #[test]
    fn search_stops_early_once_a_round_adds_nothing() {
        let mut b = FeedBuilder::new();
        let a = b.add_stop("A", "A", 0.0, 0.0);
        let feed = b.build().unwrap();
        let store = search(&feed, a, SearchConfig::new(8, 0));
        assert_eq!(store.all_stops().count(), 1);
    }

    #[test]
    fn unreachable_destination_has_no_label() {
        let mut b = FeedBuilder::new();
        let a = b.add_stop("A", "A", 0.0, 0.0);
        let isolated = b.add_stop("Z", "Z", 10.0, 10.0);
        let feed = b.build().unwrap();
        let store = search(&feed, a, SearchConfig::new(4, 0));
        assert!(!store.has(isolated));
    }
}
