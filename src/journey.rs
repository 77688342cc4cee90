// Path reconstruction. A destination's label carries a single `prior_segment` pointer; this
// module just walks that chain back to the origin, guarded by a `MAX_LEGS` bound against a cycle
// that should never occur but would otherwise hang.

use std::fmt::Display;

use geo::LineString;

use crate::feed::{FeedView, StopIdx, Timestamp, TripIdx};
use crate::geometry::ProjectedPoint;
use crate::labels::{SegmentTrip, StopLabelStore};
use crate::utils;

const MAX_LEGS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    Ride { trip_idx: TripIdx, board_position: usize, alight_position: usize },
    Walk,
}

#[derive(Debug, Clone)]
pub struct Leg {
    pub from_stop: StopIdx,
    pub to_stop: StopIdx,
    pub depart_time: Timestamp,
    pub arrive_time: Timestamp,
    pub kind: LegKind,
}

#[derive(thiserror::Error, Debug)]
pub enum JourneyError {
    #[error("no journey found")]
    NoJourneyFound,
    #[error("infinite loop in journey reconstruction")]
    InfiniteLoop,
}

pub type JourneyResult = Result<Journey, JourneyError>;

pub struct Journey {
    pub legs: Vec<Leg>,
    pub duration: Timestamp,
}

impl Journey {
    pub fn empty() -> Self {
        Self { legs: Vec::new(), duration: 0 }
    }

    /// Walks a [`StopLabelStore`]'s predecessor chain from `destination` back to the stop whose
    /// label has no `prior_segment` (the search origin), producing legs in travel order. A ride
    /// leg's depart/arrive times are the trip's own posted times at the boarding and alighting
    /// stop-time rows, not the label's arrival offset, which only tells us when the traveler's
    /// best-known path reaches the alighting stop. The two coincide for the most recent ride but
    /// not in general once later rounds improve a stop feeding into an earlier one.
    pub fn reconstruct(
        feed: &FeedView,
        store: &StopLabelStore,
        destination: StopIdx,
        departure_time: Timestamp,
    ) -> JourneyResult {
        if !store.has(destination) {
            return Err(JourneyError::NoJourneyFound);
        }

        let mut legs = Vec::new();
        let mut current = destination;
        let mut num_legs = 0;

        loop {
            let label = store.get(current).ok_or(JourneyError::NoJourneyFound)?;
            let Some(prior) = label.prior_segment else { break };

            num_legs += 1;
            if num_legs > MAX_LEGS {
                return Err(JourneyError::InfiniteLoop);
            }

            let (depart_time, arrive_time) = match prior.segment {
                SegmentTrip::Ride { trip_idx, board_position, alight_position } => {
                    let rows = feed.trip_rows(trip_idx);
                    (rows[board_position].departure_time, rows[alight_position].arrival_time)
                }
                SegmentTrip::Walk => {
                    let from_label = store.get(prior.from_stop).ok_or(JourneyError::NoJourneyFound)?;
                    let depart = utils::offset_to_clock(departure_time, from_label.arrival_offset);
                    let arrive = utils::offset_to_clock(departure_time, label.arrival_offset);
                    (depart, arrive)
                }
            };

            legs.push(Leg {
                from_stop: prior.from_stop,
                to_stop: current,
                depart_time,
                arrive_time,
                kind: match prior.segment {
                    SegmentTrip::Ride { trip_idx, board_position, alight_position } => {
                        LegKind::Ride { trip_idx, board_position, alight_position }
                    }
                    SegmentTrip::Walk => LegKind::Walk,
                },
            });
            current = prior.from_stop;
        }

        legs.reverse();
        let duration = match (legs.first(), legs.last()) {
            (Some(first), Some(last)) => last.arrive_time.checked_sub(first.depart_time).unwrap_or_else(|| {
                log::warn!("journey duration underflow, first leg departs after last leg arrives");
                0
            }),
            _ => 0,
        };
        Ok(Journey { legs, duration })
    }
}

/// A ride leg's geometry cut from its trip's shape, or the straight line between its two stops
/// if no shape is available or the cut fails for any reason (logged, not propagated as an error).
pub fn leg_geometry(feed: &FeedView, leg: &Leg) -> LineString<f64> {
    let straight_line = |from: ProjectedPoint, to: ProjectedPoint| LineString::from(vec![(from.x, from.y), (to.x, to.y)]);
    let from_point = feed.stop(leg.from_stop).projected;
    let to_point = feed.stop(leg.to_stop).projected;

    let LegKind::Ride { trip_idx, board_position, alight_position } = leg.kind else {
        return straight_line(from_point, to_point);
    };

    let trip = feed.trip(trip_idx);
    let rows = feed.trip_rows(trip_idx);
    let (Some(shape_id), Some(from_dist), Some(to_dist)) = (
        trip.shape_id.as_deref(),
        rows[board_position].shape_dist_traveled,
        rows[alight_position].shape_dist_traveled,
    ) else {
        return straight_line(from_point, to_point);
    };

    match feed.shape(shape_id).and_then(|shape| crate::geometry::cut_shape(shape, from_dist, to_dist)) {
        Some(line) => line,
        None => {
            log::warn!("falling back to a straight line for trip {} leg geometry", trip.id);
            straight_line(from_point, to_point)
        }
    }
}

impl Display for Journey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "-----------------------------------------------")?;
        if !self.legs.is_empty() {
            for leg in &self.legs {
                writeln!(f)?;
                match leg.kind {
                    LegKind::Ride { .. } => {
                        writeln!(
                            f,
                            "Board at stop {} at {}.",
                            leg.from_stop,
                            utils::get_time_str(leg.depart_time)
                        )?;
                        writeln!(
                            f,
                            "Alight at stop {} at {}.",
                            leg.to_stop,
                            utils::get_time_str(leg.arrive_time)
                        )?;
                    }
                    LegKind::Walk => {
                        writeln!(
                            f,
                            "Walk from stop {} to stop {} ({} -> {}).",
                            leg.from_stop,
                            leg.to_stop,
                            utils::get_time_str(leg.depart_time),
                            utils::get_time_str(leg.arrive_time)
                        )?;
                    }
                }
            }
            writeln!(f)?;
            writeln!(f, "Total journey time: {} minutes.", self.duration / 60)?;
        } else {
            writeln!(f)?;
            writeln!(f, "No journey found.")?;
        }
        writeln!(f, "-----------------------------------------------")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedBuilder;
    use crate::round::{search, SearchConfig};
    use rgb::RGB8;

    fn feed_with_walk_leg() -> FeedView {
        let mut b = FeedBuilder::new();
        let a = b.add_stop("A", "A", 0.0, 0.0);
        let bb = b.add_stop("B", "B", 0.0, 0.01);
        let c = b.add_stop("C", "C", 0.0, 0.011);
        b.add_stop("Z", "unreachable", 10.0, 10.0);
        let route = b.add_route("R1", "1", "Line", RGB8::new(0, 0, 0));
        let trip = b.add_trip("T1", route);
        b.add_stop_time(trip, a, 1, 0, 0);
        b.add_stop_time(trip, bb, 2, 300, 300);
        b.add_transfer(bb, c, 120.0);
        b.build().unwrap()
    }

    #[test]
    fn reconstructs_ride_then_walk() {
        let feed = feed_with_walk_leg();
        let a = feed.stop_idx("A").unwrap();
        let c = feed.stop_idx("C").unwrap();
        let store = search(&feed, a, SearchConfig::new(4, 0));
        let journey = Journey::reconstruct(&feed, &store, c, 0).unwrap();
        assert_eq!(journey.legs.len(), 2);
        assert!(matches!(journey.legs[0].kind, LegKind::Ride { .. }));
        assert!(matches!(journey.legs[1].kind, LegKind::Walk));
        assert_eq!(journey.duration, 420);
    }

    /// Two separate trips joined by a zero-cost footpath between adjacent stops: t1 runs A to B
    /// (departs 100, arrives 200), a transfer links B to C at no cost, and t2 runs C to D (departs
    /// 250, arrives 400). Boarding t2 requires the transfer to have posted first, so this exercises
    /// a full ride, walk, ride chain across two distinct trips.
    fn feed_with_two_rides() -> FeedView {
        let mut b = FeedBuilder::new();
        let a = b.add_stop("A", "A", 0.0, 0.0);
        let bb = b.add_stop("B", "B", 0.0, 0.01);
        let c = b.add_stop("C", "C", 0.0, 0.011);
        let d = b.add_stop("D", "D", 0.0, 0.02);
        let route = b.add_route("R1", "1", "Line", RGB8::new(0, 0, 0));
        let t1 = b.add_trip("T1", route);
        b.add_stop_time(t1, a, 1, 100, 100);
        b.add_stop_time(t1, bb, 2, 200, 200);
        b.add_transfer(bb, c, 0.0);
        let t2 = b.add_trip("T2", route);
        b.add_stop_time(t2, c, 1, 250, 250);
        b.add_stop_time(t2, d, 2, 400, 400);
        b.build().unwrap()
    }

    #[test]
    fn reconstructs_a_two_ride_journey_across_a_transfer() {
        let feed = feed_with_two_rides();
        let a = feed.stop_idx("A").unwrap();
        let d = feed.stop_idx("D").unwrap();
        let store = search(&feed, a, SearchConfig::new(1, 100));
        assert_eq!(store.get(d).unwrap().arrival_offset, 300.0);

        let journey = Journey::reconstruct(&feed, &store, d, 100).unwrap();
        assert_eq!(journey.legs.len(), 3);

        let (first, second, third) = (&journey.legs[0], &journey.legs[1], &journey.legs[2]);
        assert!(matches!(first.kind, LegKind::Ride { .. }));
        assert!(matches!(second.kind, LegKind::Walk));
        assert!(matches!(third.kind, LegKind::Ride { .. }));
        assert_eq!(first.from_stop, a);
        assert_eq!(first.to_stop, feed.stop_idx("B").unwrap());
        assert_eq!(second.from_stop, feed.stop_idx("B").unwrap());
        assert_eq!(second.to_stop, feed.stop_idx("C").unwrap());
        assert_eq!(third.from_stop, feed.stop_idx("C").unwrap());
        assert_eq!(third.to_stop, d);
        assert_eq!(first.depart_time, 100);
        assert_eq!(first.arrive_time, 200);
        assert_eq!(third.depart_time, 250);
        assert_eq!(third.arrive_time, 400);
        assert_eq!(journey.duration, 300);

        let trip_ids: Vec<TripIdx> = journey
            .legs
            .iter()
            .filter_map(|leg| match leg.kind {
                LegKind::Ride { trip_idx, .. } => Some(trip_idx),
                LegKind::Walk => None,
            })
            .collect();
        assert_eq!(trip_ids.len(), trip_ids.iter().collect::<std::collections::HashSet<_>>().len());
    }

    #[test]
    fn missing_destination_label_is_no_journey_found() {
        let feed = feed_with_walk_leg();
        let a = feed.stop_idx("A").unwrap();
        let z = feed.stop_idx("Z").unwrap();
        let store = search(&feed, a, SearchConfig::new(4, 0));
        let result = Journey::reconstruct(&feed, &store, z, 0);
        assert!(matches!(result, Err(JourneyError::NoJourneyFound)));
    }

    #[test]
    fn geometry_falls_back_to_straight_line_without_a_shape() {
        let feed = feed_with_walk_leg();
        let a = feed.stop_idx("A").unwrap();
        let c = feed.stop_idx("C").unwrap();
        let store = search(&feed, a, SearchConfig::new(4, 0));
        let journey = Journey::reconstruct(&feed, &store, c, 0).unwrap();
        let line = leg_geometry(&feed, &journey.legs[0]);
        assert_eq!(line.0.len(), 2);
    }
}
