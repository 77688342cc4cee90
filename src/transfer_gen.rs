// Builds a `transfers.txt`-shaped table of walking connections between nearby stops: every stop
// pair within a radius becomes a type-2 transfer, timed at a constant walking speed, using an
// R-tree for the neighbor search instead of a dense cross join, since the cross join doesn't
// scale past a small stop count.

use std::io::Write;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::Serialize;

use crate::error::RaptorResult;
use crate::feed::{FeedView, StopIdx, TransferRecord};

pub const DEFAULT_RADIUS_M: f64 = 150.0;
pub const DEFAULT_WALK_SPEED_M_PER_MIN: f64 = 55.0;

#[derive(Debug, Clone, Copy)]
pub struct TransferGenConfig {
    pub radius_m: f64,
    pub walk_speed_m_per_min: f64,
}

impl Default for TransferGenConfig {
    fn default() -> Self {
        Self { radius_m: DEFAULT_RADIUS_M, walk_speed_m_per_min: DEFAULT_WALK_SPEED_M_PER_MIN }
    }
}

struct IndexedStop {
    point: [f64; 2],
    stop_idx: StopIdx,
}

impl RTreeObject for IndexedStop {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedStop {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Generates a type-2 walking transfer for every ordered pair of distinct stops within
/// `config.radius_m` of each other, timed at `config.walk_speed_m_per_min`.
pub fn generate_transfers(feed: &FeedView, config: &TransferGenConfig) -> Vec<TransferRecord> {
    let entries: Vec<IndexedStop> = (0..feed.num_stops())
        .map(|i| {
            let stop_idx = i as StopIdx;
            let p = feed.stop(stop_idx).projected;
            IndexedStop { point: [p.x, p.y], stop_idx }
        })
        .collect();
    let tree = RTree::bulk_load(entries);

    let radius_sq = config.radius_m * config.radius_m;
    let mut transfers = Vec::new();

    for candidate in tree.iter() {
        for neighbor in tree.locate_within_distance(candidate.point, radius_sq) {
            if neighbor.stop_idx == candidate.stop_idx {
                continue;
            }
            let dist = candidate.distance_2(&neighbor.point).sqrt();
            let min_transfer_time = (dist / config.walk_speed_m_per_min) * 60.0;
            transfers.push(TransferRecord {
                from_stop: candidate.stop_idx,
                to_stop: neighbor.stop_idx,
                transfer_type: 2,
                min_transfer_time: Some(min_transfer_time),
            });
        }
    }

    transfers
}

#[derive(Serialize)]
struct TransferCsvOutRow<'a> {
    from_stop_id: &'a str,
    to_stop_id: &'a str,
    transfer_type: u8,
    min_transfer_time: String,
}

/// Writes `transfers` in `transfers.txt` form, one decimal place on `min_transfer_time` to match
/// the precision the original generator exports at.
pub fn write_transfers_csv(feed: &FeedView, transfers: &[TransferRecord], writer: impl Write) -> RaptorResult<()> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for t in transfers {
        let row = TransferCsvOutRow {
            from_stop_id: &feed.stop(t.from_stop).id,
            to_stop_id: &feed.stop(t.to_stop).id,
            transfer_type: t.transfer_type,
            min_transfer_time: format!("{:.1}", t.min_transfer_time.unwrap_or(0.0)),
        };
        csv_writer
            .serialize(row)
            .map_err(|e| crate::error::RaptorError::FeedInvariantViolation(e.to_string()))?;
    }
    csv_writer.flush().map_err(|e| crate::error::RaptorError::FeedInvariantViolation(e.to_string()))?;
    Ok(())
}
