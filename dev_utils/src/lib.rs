// Shared scenario data for the example and the benchmark. Builds a feed in memory through
// `FeedBuilder`: a handful of parallel routes long enough to force several round-trip transfers,
// with a footpath between adjacent routes at every interchange stop.

use raptor::feed::{FeedView, StopIdx};
use raptor::{FeedBuilder, SearchConfig};
use rgb::RGB8;

pub const NUM_ROUTES: usize = 4;
pub const STOPS_PER_ROUTE: usize = 12;
pub const TRIPS_PER_ROUTE: u32 = 20;
pub const HEADWAY_SECS: u32 = 600;
pub const DWELL_SECS: u32 = 90;
pub const INTERCHANGE_EVERY: usize = 4;
pub const TRANSFER_TIME_SECS: f64 = 120.0;

/// Builds a multi-route synthetic feed: `NUM_ROUTES` parallel lines of `STOPS_PER_ROUTE` stops
/// each, `TRIPS_PER_ROUTE` distinct trips per route departing every `HEADWAY_SECS` (already
/// materialized as separate trips; no calendar/frequency expansion happens here), with a walking
/// transfer linking route `r` to route `r + 1` at every `INTERCHANGE_EVERY`-th stop position.
pub fn build_synthetic_feed() -> FeedView {
    let mut b = FeedBuilder::new();

    let mut stop_grid = vec![vec![0 as StopIdx; STOPS_PER_ROUTE]; NUM_ROUTES];
    for (r, row) in stop_grid.iter_mut().enumerate() {
        for (p, slot) in row.iter_mut().enumerate() {
            let id = format!("R{r}-{p}");
            *slot = b.add_stop(&id, &id, r as f64 * 0.01, p as f64 * 0.01);
        }
    }

    for r in 0..NUM_ROUTES {
        let color = RGB8::new((40 * r) as u8, 120, 200);
        let route = b.add_route(&format!("route-{r}"), &format!("{r}"), &format!("Line {r}"), color);
        for trip_n in 0..TRIPS_PER_ROUTE {
            let trip_id = format!("R{r}-T{trip_n}");
            let trip = b.add_trip(&trip_id, route);
            let base_departure = trip_n * HEADWAY_SECS;
            for p in 0..STOPS_PER_ROUTE {
                let t = base_departure + p as u32 * DWELL_SECS;
                b.add_stop_time(trip, stop_grid[r][p], p as u32, t, t);
            }
        }
    }

    for r in 0..NUM_ROUTES - 1 {
        let mut p = 0;
        while p < STOPS_PER_ROUTE {
            b.add_transfer(stop_grid[r][p], stop_grid[r + 1][p], TRANSFER_TIME_SECS);
            b.add_transfer(stop_grid[r + 1][p], stop_grid[r][p], TRANSFER_TIME_SECS);
            p += INTERCHANGE_EVERY;
        }
    }

    b.build().expect("synthetic scenario builds a feed satisfying every FeedBuilder invariant")
}

/// A ready-to-run search scenario over [`build_synthetic_feed`]: start at the first stop of route
/// 0, end at the last stop of the last route, forcing the search to cross every interchange.
pub fn get_example_scenario() -> (FeedView, StopIdx, u32, StopIdx, SearchConfig<'static>) {
    let feed = build_synthetic_feed();
    let start = feed.stop_idx("R0-0").unwrap();
    let end = feed.stop_idx(&format!("R{}-{}", NUM_ROUTES - 1, STOPS_PER_ROUTE - 1)).unwrap();
    let departure_time = 0;
    let config = SearchConfig::new((NUM_ROUTES as u32) * 2, departure_time);
    (feed, start, departure_time, end, config)
}
