// Raw GTFS decoding belongs to `gtfs_structures`; what this module owns is the dense,
// ordinal-indexed adapter the round-based search depends on: stop-times grouped and sorted by
// trip, boardings grouped by stop, and the transfer table, all validated once at load time. No
// calendar/service-day filtering happens here; every trip handed to `FeedView::from_gtfs` is
// assumed already scoped to the travel day.

use std::collections::HashMap;
use std::io::Read;
use std::ops::Range;

use gtfs_structures::Gtfs;
use rgb::RGB8;
use serde::Deserialize;

use crate::error::{RaptorError, RaptorResult};
use crate::geometry::{ProjectedPoint, Projector};

pub type StopIdx = u32;
pub type TripIdx = u32;
pub type RouteIdx = u32;

/// A raw GTFS clock time: seconds since service-day midnight.
pub type Timestamp = u32;

#[derive(Debug)]
pub struct StopRecord {
    pub id: Box<str>,
    pub name: Box<str>,
    pub lat: f64,
    pub lon: f64,
    pub projected: ProjectedPoint,
}

#[derive(Debug)]
pub struct RouteRecord {
    pub id: Box<str>,
    pub short_name: Option<Box<str>>,
    pub long_name: Option<Box<str>>,
    pub color: RGB8,
}

#[derive(Debug)]
pub struct TripRecord {
    pub id: Box<str>,
    pub route_idx: RouteIdx,
    pub shape_id: Option<Box<str>>,
}

#[derive(Debug, Clone, Copy)]
pub struct StopTimeRow {
    pub stop_idx: StopIdx,
    pub stop_sequence: u32,
    pub arrival_time: Timestamp,
    pub departure_time: Timestamp,
    pub shape_dist_traveled: Option<f64>,
}

/// A boarding opportunity: trip `trip_idx` stops at some stop at array position `position`
/// within that trip's row range (see `FeedView::trip_rows`).
#[derive(Debug, Clone, Copy)]
pub struct Boarding {
    pub trip_idx: TripIdx,
    pub position: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TransferRecord {
    pub from_stop: StopIdx,
    pub to_stop: StopIdx,
    pub transfer_type: u8,
    pub min_transfer_time: Option<f64>,
}

pub struct FeedView {
    pub stops: Vec<StopRecord>,
    pub stop_index: HashMap<Box<str>, StopIdx>,
    pub trips: Vec<TripRecord>,
    pub trip_index: HashMap<Box<str>, TripIdx>,
    pub routes: Vec<RouteRecord>,
    stop_time_rows: Vec<StopTimeRow>,
    trip_spans: Vec<Range<usize>>,
    boardings_by_stop: Vec<Vec<Boarding>>,
    pub transfers: Vec<TransferRecord>,
    transfers_by_from: Vec<Vec<u32>>,
    shapes: HashMap<Box<str>, Vec<ProjectedPoint>>,
}

#[derive(Deserialize)]
struct TransferCsvRow {
    from_stop_id: String,
    to_stop_id: String,
    transfer_type: u8,
    #[serde(default)]
    min_transfer_time: Option<f64>,
}

impl FeedView {
    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn stop_idx(&self, stop_id: &str) -> Option<StopIdx> {
        self.stop_index.get(stop_id).copied()
    }

    pub fn require_stop(&self, stop_id: &str) -> RaptorResult<StopIdx> {
        self.stop_idx(stop_id)
            .ok_or_else(|| RaptorError::UnknownStop(stop_id.to_owned()))
    }

    pub fn stop(&self, idx: StopIdx) -> &StopRecord {
        &self.stops[idx as usize]
    }

    pub fn trip(&self, idx: TripIdx) -> &TripRecord {
        &self.trips[idx as usize]
    }

    pub fn route(&self, idx: RouteIdx) -> &RouteRecord {
        &self.routes[idx as usize]
    }

    /// The stop-time rows of a trip, in ascending stop_sequence order. This ordering lets a ride
    /// pass scan a trip's tail without re-sorting.
    pub fn trip_rows(&self, trip_idx: TripIdx) -> &[StopTimeRow] {
        &self.stop_time_rows[self.trip_spans[trip_idx as usize].clone()]
    }

    /// Every (trip, position) pair at which `stop` is a scheduled stop.
    pub fn boardings_at(&self, stop: StopIdx) -> &[Boarding] {
        &self.boardings_by_stop[stop as usize]
    }

    /// Type-2 walking transfers with an explicit `min_transfer_time`, originating at `stop`.
    pub fn walking_transfers_from(&self, stop: StopIdx) -> impl Iterator<Item = &TransferRecord> {
        self.transfers_by_from[stop as usize]
            .iter()
            .map(move |&i| &self.transfers[i as usize])
            .filter(|t| t.transfer_type == 2 && t.min_transfer_time.is_some())
    }

    pub fn shape(&self, shape_id: &str) -> Option<&[ProjectedPoint]> {
        self.shapes.get(shape_id).map(|v| v.as_slice())
    }

    /// Builds a feed view from an already-loaded GTFS feed. Performs no calendar/service-day
    /// filtering: every trip present in `gtfs.trips` is treated as running on the travel day
    /// the caller has in mind (calendar expansion is handled upstream).
    pub fn from_gtfs(gtfs: &Gtfs) -> RaptorResult<Self> {
        let mut stops = Vec::with_capacity(gtfs.stops.len());
        let mut stop_index = HashMap::with_capacity(gtfs.stops.len());
        let all_coords: Vec<(f64, f64)> = gtfs
            .stops
            .values()
            .map(|s| (s.latitude.unwrap_or(0.0), s.longitude.unwrap_or(0.0)))
            .collect();
        let projector = Projector::centered_on(all_coords.iter().copied());

        for stop in gtfs.stops.values() {
            let idx = stops.len() as StopIdx;
            let lat = stop.latitude.unwrap_or(0.0);
            let lon = stop.longitude.unwrap_or(0.0);
            stop_index.insert(stop.id.clone().into_boxed_str(), idx);
            stops.push(StopRecord {
                id: stop.id.clone().into_boxed_str(),
                name: stop.name.clone().unwrap_or_default().into_boxed_str(),
                lat,
                lon,
                projected: projector.project(lat, lon),
            });
        }

        let mut routes = Vec::with_capacity(gtfs.routes.len());
        let mut route_index = HashMap::with_capacity(gtfs.routes.len());
        for route in gtfs.routes.values() {
            let idx = routes.len() as RouteIdx;
            route_index.insert(route.id.clone().into_boxed_str(), idx);
            routes.push(RouteRecord {
                id: route.id.clone().into_boxed_str(),
                short_name: route.short_name.clone().map(|s| s.into_boxed_str()),
                long_name: route.long_name.clone().map(|s| s.into_boxed_str()),
                color: route.color,
            });
        }

        let mut shapes = HashMap::new();
        for (shape_id, points) in gtfs.shapes.iter() {
            let projected: Vec<ProjectedPoint> = points
                .iter()
                .map(|p| projector.project(p.latitude, p.longitude))
                .collect();
            shapes.insert(shape_id.clone().into_boxed_str(), projected);
        }

        let mut trips = Vec::with_capacity(gtfs.trips.len());
        let mut trip_index = HashMap::with_capacity(gtfs.trips.len());
        let mut trip_raw_rows: Vec<Vec<StopTimeRow>> = Vec::with_capacity(gtfs.trips.len());

        for trip in gtfs.trips.values() {
            let route_idx = *route_index.get(trip.route_id.as_str()).ok_or_else(|| {
                RaptorError::FeedInvariantViolation(format!(
                    "trip {} references unknown route {}",
                    trip.id, trip.route_id
                ))
            })?;

            let mut rows = Vec::with_capacity(trip.stop_times.len());
            for st in trip.stop_times.iter() {
                let stop_idx = *stop_index.get(st.stop.id.as_str()).ok_or_else(|| {
                    RaptorError::FeedInvariantViolation(format!(
                        "trip {} references unknown stop {}",
                        trip.id, st.stop.id
                    ))
                })?;
                let arrival_time = st.arrival_time.ok_or_else(|| {
                    RaptorError::FeedInvariantViolation(format!(
                        "trip {} stop_time at stop {} is missing arrival_time",
                        trip.id, st.stop.id
                    ))
                })?;
                let departure_time = st.departure_time.ok_or_else(|| {
                    RaptorError::FeedInvariantViolation(format!(
                        "trip {} stop_time at stop {} is missing departure_time",
                        trip.id, st.stop.id
                    ))
                })?;
                rows.push(StopTimeRow {
                    stop_idx,
                    stop_sequence: st.stop_sequence as u32,
                    arrival_time,
                    departure_time,
                    shape_dist_traveled: st.shape_dist_traveled,
                });
            }
            rows.sort_by_key(|r| r.stop_sequence);
            validate_trip_rows(&trip.id, &rows)?;

            let idx = trips.len() as TripIdx;
            trip_index.insert(trip.id.clone().into_boxed_str(), idx);
            trips.push(TripRecord {
                id: trip.id.clone().into_boxed_str(),
                route_idx,
                shape_id: trip.shape_id.clone().map(|s| s.into_boxed_str()),
            });
            trip_raw_rows.push(rows);
        }

        Self::finish(stops, stop_index, trips, trip_index, routes, trip_raw_rows, Vec::new(), shapes)
    }

    /// Parses a `transfers.txt`-shaped CSV (header `from_stop_id,to_stop_id,transfer_type,
    /// min_transfer_time`) and installs the resulting rows, validating that every referenced
    /// stop is known and that no row is a self-transfer.
    pub fn load_transfers(&mut self, reader: impl Read) -> RaptorResult<()> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let mut transfers = Vec::new();
        for result in csv_reader.deserialize::<TransferCsvRow>() {
            let row = result.map_err(|e| RaptorError::FeedInvariantViolation(e.to_string()))?;
            let from_stop = self.require_stop(&row.from_stop_id)?;
            let to_stop = self.require_stop(&row.to_stop_id)?;
            if from_stop == to_stop {
                return Err(RaptorError::FeedInvariantViolation(format!(
                    "self-transfer at stop {}",
                    row.from_stop_id
                )));
            }
            transfers.push(TransferRecord {
                from_stop,
                to_stop,
                transfer_type: row.transfer_type,
                min_transfer_time: row.min_transfer_time,
            });
        }
        self.install_transfers(transfers);
        Ok(())
    }

    fn install_transfers(&mut self, transfers: Vec<TransferRecord>) {
        let mut transfers_by_from = vec![Vec::new(); self.stops.len()];
        for (i, t) in transfers.iter().enumerate() {
            transfers_by_from[t.from_stop as usize].push(i as u32);
        }
        self.transfers = transfers;
        self.transfers_by_from = transfers_by_from;
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        stops: Vec<StopRecord>,
        stop_index: HashMap<Box<str>, StopIdx>,
        trips: Vec<TripRecord>,
        trip_index: HashMap<Box<str>, TripIdx>,
        routes: Vec<RouteRecord>,
        trip_raw_rows: Vec<Vec<StopTimeRow>>,
        transfers: Vec<TransferRecord>,
        shapes: HashMap<Box<str>, Vec<ProjectedPoint>>,
    ) -> RaptorResult<Self> {
        let mut stop_time_rows = Vec::new();
        let mut trip_spans = Vec::with_capacity(trip_raw_rows.len());
        let mut boardings_by_stop = vec![Vec::new(); stops.len()];

        for (trip_idx, rows) in trip_raw_rows.into_iter().enumerate() {
            let start = stop_time_rows.len();
            for (position, row) in rows.iter().enumerate() {
                boardings_by_stop[row.stop_idx as usize].push(Boarding {
                    trip_idx: trip_idx as TripIdx,
                    position,
                });
            }
            stop_time_rows.extend(rows);
            trip_spans.push(start..stop_time_rows.len());
        }

        let mut feed = Self {
            stops,
            stop_index,
            trips,
            trip_index,
            routes,
            stop_time_rows,
            trip_spans,
            boardings_by_stop,
            transfers: Vec::new(),
            transfers_by_from: Vec::new(),
            shapes,
        };
        feed.install_transfers(transfers);
        Ok(feed)
    }
}

fn validate_trip_rows(trip_id: &str, rows: &[StopTimeRow]) -> RaptorResult<()> {
    for pair in rows.windows(2) {
        if pair[0].stop_sequence >= pair[1].stop_sequence {
            return Err(RaptorError::FeedInvariantViolation(format!(
                "trip {trip_id} has non-increasing stop_sequence ({} >= {})",
                pair[0].stop_sequence, pair[1].stop_sequence
            )));
        }
    }
    for row in rows {
        if row.arrival_time > row.departure_time {
            return Err(RaptorError::FeedInvariantViolation(format!(
                "trip {trip_id} has arrival_time > departure_time at stop_sequence {}",
                row.stop_sequence
            )));
        }
    }
    for pair in rows.windows(2) {
        if pair[0].departure_time > pair[1].arrival_time {
            return Err(RaptorError::FeedInvariantViolation(format!(
                "trip {trip_id} is not monotonically non-decreasing between stop_sequence {} and {}",
                pair[0].stop_sequence, pair[1].stop_sequence
            )));
        }
    }
    Ok(())
}

/// Builds a [`FeedView`] by hand, without going through `gtfs_structures`. Used by tests and by
/// tooling that synthesizes small scenarios, but is plain public API: there's nothing test-only
/// about assembling a feed from in-memory rows.
#[derive(Default)]
pub struct FeedBuilder {
    stops: Vec<StopRecord>,
    stop_index: HashMap<Box<str>, StopIdx>,
    routes: Vec<RouteRecord>,
    route_index: HashMap<Box<str>, RouteIdx>,
    trips: Vec<TripRecord>,
    trip_index: HashMap<Box<str>, TripIdx>,
    trip_rows: Vec<Vec<StopTimeRow>>,
    transfers: Vec<TransferRecord>,
    shapes: HashMap<Box<str>, Vec<ProjectedPoint>>,
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stop(&mut self, id: &str, name: &str, lat: f64, lon: f64) -> StopIdx {
        let idx = self.stops.len() as StopIdx;
        self.stop_index.insert(id.into(), idx);
        self.stops.push(StopRecord {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
            projected: ProjectedPoint { x: lon * 1000.0, y: lat * 1000.0 },
        });
        idx
    }

    pub fn add_route(&mut self, id: &str, short_name: &str, long_name: &str, color: RGB8) -> RouteIdx {
        let idx = self.routes.len() as RouteIdx;
        self.route_index.insert(id.into(), idx);
        self.routes.push(RouteRecord {
            id: id.into(),
            short_name: Some(short_name.into()),
            long_name: Some(long_name.into()),
            color,
        });
        idx
    }

    pub fn add_trip(&mut self, id: &str, route: RouteIdx) -> TripIdx {
        let idx = self.trips.len() as TripIdx;
        self.trip_index.insert(id.into(), idx);
        self.trips.push(TripRecord { id: id.into(), route_idx: route, shape_id: None });
        self.trip_rows.push(Vec::new());
        idx
    }

    pub fn add_stop_time(
        &mut self,
        trip: TripIdx,
        stop: StopIdx,
        stop_sequence: u32,
        arrival_time: Timestamp,
        departure_time: Timestamp,
    ) -> &mut Self {
        self.trip_rows[trip as usize].push(StopTimeRow {
            stop_idx: stop,
            stop_sequence,
            arrival_time,
            departure_time,
            shape_dist_traveled: None,
        });
        self
    }

    pub fn add_transfer(&mut self, from: StopIdx, to: StopIdx, min_transfer_time: f64) -> &mut Self {
        self.transfers.push(TransferRecord {
            from_stop: from,
            to_stop: to,
            transfer_type: 2,
            min_transfer_time: Some(min_transfer_time),
        });
        self
    }

    pub fn build(mut self) -> RaptorResult<FeedView> {
        for rows in self.trip_rows.iter_mut() {
            rows.sort_by_key(|r| r.stop_sequence);
        }
        for (trip, rows) in self.trips.iter().zip(self.trip_rows.iter()) {
            validate_trip_rows(&trip.id, rows)?;
        }
        for t in &self.transfers {
            if t.from_stop == t.to_stop {
                return Err(RaptorError::FeedInvariantViolation(format!(
                    "self-transfer at stop {}",
                    self.stops[t.from_stop as usize].id
                )));
            }
        }
        FeedView::finish(
            self.stops,
            self.stop_index,
            self.trips,
            self.trip_index,
            self.routes,
            self.trip_rows,
            self.transfers,
            self.shapes,
        )
    }
}
