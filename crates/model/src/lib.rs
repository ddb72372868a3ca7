use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One row of per-lap, per-position timing data for a race.
///
/// `time` keeps the dataset's display form; milliseconds are derived from
/// it on demand rather than trusted from the source table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LapRecord {
    pub race_id: u32,
    pub lap: u32,
    pub position: u32,
    pub time: String,
}

/// Single-lap time difference between two positions on the same lap.
///
/// `delta_ms` is positive when the `to_position` driver lost time to the
/// `from_position` driver on that lap. `display` carries the sign prefix.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Interval {
    pub race_id: u32,
    pub lap: u32,
    pub from_position: u32,
    pub to_position: u32,
    pub delta_ms: i64,
    pub display: String,
}

/// Running sum of leader-pair intervals from lap 1 through `lap`.
/// Negative when the tracked driver is ahead overall.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CumulativeGap {
    pub race_id: u32,
    pub lap: u32,
    pub cumulative_ms: i64,
    pub display: String,
}

/// One point of an averaged gap series, ready for charting.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AveragePoint {
    pub lap: u32,
    pub average_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no lap record for race {race_id} lap {lap} position {position}")]
pub struct MissingRecord {
    pub race_id: u32,
    pub lap: u32,
    pub position: u32,
}

/// Immutable lap-record table with a `(race, lap, position)` index.
#[derive(Clone, Debug, Default)]
pub struct LapTable {
    records: Vec<LapRecord>,
    index: HashMap<(u32, u32, u32), usize>,
}

impl LapTable {
    /// Build the index. At most one record may exist per
    /// `(race, lap, position)`; a duplicate keeps the first record seen.
    pub fn from_records(records: Vec<LapRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            index.entry((r.race_id, r.lap, r.position)).or_insert(i);
        }
        Self { records, index }
    }

    /// Recorded lap-time string for a position on a lap.
    pub fn time_for(&self, race_id: u32, lap: u32, position: u32) -> Result<&str, MissingRecord> {
        self.index
            .get(&(race_id, lap, position))
            .map(|&i| self.records[i].time.as_str())
            .ok_or(MissingRecord {
                race_id,
                lap,
                position,
            })
    }

    /// Distinct race ids, ascending.
    pub fn races(&self) -> Vec<u32> {
        let mut out: Vec<u32> = self.records.iter().map(|r| r.race_id).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Highest lap number recorded for a race, if any.
    pub fn max_lap(&self, race_id: u32) -> Option<u32> {
        self.records
            .iter()
            .filter(|r| r.race_id == race_id)
            .map(|r| r.lap)
            .max()
    }

    pub fn records(&self) -> &[LapRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(race_id: u32, lap: u32, position: u32, time: &str) -> LapRecord {
        LapRecord {
            race_id,
            lap,
            position,
            time: time.to_string(),
        }
    }

    #[test]
    fn lookup_hits_and_misses() {
        let table = LapTable::from_records(vec![
            record(1, 1, 1, "1:30.000"),
            record(1, 1, 2, "1:31.250"),
        ]);
        assert_eq!(table.time_for(1, 1, 2), Ok("1:31.250"));
        assert_eq!(
            table.time_for(1, 2, 1),
            Err(MissingRecord {
                race_id: 1,
                lap: 2,
                position: 1
            })
        );
    }

    #[test]
    fn duplicate_key_keeps_first_record() {
        let table = LapTable::from_records(vec![
            record(1, 1, 1, "1:30.000"),
            record(1, 1, 1, "9:99.999"),
        ]);
        assert_eq!(table.time_for(1, 1, 1), Ok("1:30.000"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn race_and_lap_enumeration() {
        let table = LapTable::from_records(vec![
            record(7, 2, 1, "1:30.000"),
            record(3, 1, 1, "1:31.000"),
            record(7, 1, 1, "1:32.000"),
        ]);
        assert_eq!(table.races(), vec![3, 7]);
        assert_eq!(table.max_lap(7), Some(2));
        assert_eq!(table.max_lap(4), None);
    }
}
