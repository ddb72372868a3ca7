//! Derived race statistics: inter-driver intervals, cumulative leader
//! gaps and averaged gap series ready for charting.

use log::warn;
use model::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use timing::{format_delta, parse_delta, FormatError, NO_TIME};

/// Outlier cutoff used by the reference analysis: single-lap intervals
/// above 200 s are pit stops, crashes or lapped traffic, not racing gaps.
pub const DEFAULT_OUTLIER_MS: i64 = 200_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Missing(#[from] MissingRecord),
}

/// Signed time difference between two positions on one lap.
///
/// `behind == 1` is the leader, who has nobody ahead: the interval is the
/// `--:--` sentinel with value 0 and no lookup is performed. Otherwise the
/// display gets a `+` prefix when the ahead driver's lap was faster (the
/// behind driver fell back), `-` when slower, nothing when equal.
pub fn interval(
    table: &LapTable,
    race_id: u32,
    lap: u32,
    ahead: u32,
    behind: u32,
) -> Result<Interval, AnalysisError> {
    if behind == 1 {
        return Ok(Interval {
            race_id,
            lap,
            from_position: ahead,
            to_position: behind,
            delta_ms: 0,
            display: NO_TIME.to_string(),
        });
    }

    let t_ahead = parse_delta(table.time_for(race_id, lap, ahead)?)?;
    let t_behind = parse_delta(table.time_for(race_id, lap, behind)?)?;

    let mut display = format_delta(Some((t_ahead - t_behind).abs()));
    if t_ahead < t_behind {
        display.insert(0, '+');
    } else if t_ahead > t_behind {
        display.insert(0, '-');
    }

    Ok(Interval {
        race_id,
        lap,
        from_position: ahead,
        to_position: behind,
        delta_ms: t_behind - t_ahead,
        display,
    })
}

/// Fixed-pair variant: interval between the leader and second place.
pub fn leader_interval(table: &LapTable, race_id: u32, lap: u32) -> Result<Interval, AnalysisError> {
    interval(table, race_id, lap, 1, 2)
}

/// Cumulative leader gap for every lap of a race, as a single forward
/// running-sum pass.
pub fn gap_series(table: &LapTable, race_id: u32) -> Result<Vec<CumulativeGap>, AnalysisError> {
    let last = table.max_lap(race_id).unwrap_or(0);
    let mut out = Vec::with_capacity(last as usize);
    let mut total_ms = 0i64;
    for lap in 1..=last {
        total_ms += leader_interval(table, race_id, lap)?.delta_ms;
        out.push(CumulativeGap {
            race_id,
            lap,
            cumulative_ms: total_ms,
            display: format_delta(Some(total_ms)),
        });
    }
    Ok(out)
}

/// Cumulative leader gap from lap 1 through `lap` inclusive.
pub fn cumulative_gap(
    table: &LapTable,
    race_id: u32,
    lap: u32,
) -> Result<CumulativeGap, AnalysisError> {
    let mut total_ms = 0i64;
    for l in 1..=lap {
        total_ms += leader_interval(table, race_id, l)?.delta_ms;
    }
    Ok(CumulativeGap {
        race_id,
        lap,
        cumulative_ms: total_ms,
        display: format_delta(Some(total_ms)),
    })
}

/// How the per-lap averages of [`average_gap_series`] are built.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum SeriesVariant {
    /// Per lap, average the single-lap leader intervals across races
    /// (dropping entries with |ms| above the threshold), then accumulate
    /// the filtered averages into a running gap.
    FilteredIntervals { exclude_abs_ms_above: i64 },
    /// Per lap, average each race's already-cumulative gap. No filtering.
    CumulativeGaps,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SeriesReport {
    /// One point per distinct lap number, ascending.
    pub points: Vec<AveragePoint>,
    /// `(race, lap)` pairs left out because their computation failed.
    /// Failed pairs are never folded in as zero.
    pub excluded: Vec<(u32, u32)>,
}

/// Average the leader gap per lap number across all races in the table.
///
/// A lap whose every value was filtered out is omitted from the series.
/// In the cumulative variant an error at lap `k` poisons the running sum,
/// so that race is excluded from `k` onward.
pub fn average_gap_series(table: &LapTable, variant: SeriesVariant) -> SeriesReport {
    let mut by_lap: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut excluded = Vec::new();

    for race_id in table.races() {
        let last = table.max_lap(race_id).unwrap_or(0);
        let mut total_ms = 0i64;
        for lap in 1..=last {
            match leader_interval(table, race_id, lap) {
                Ok(iv) => {
                    total_ms += iv.delta_ms;
                    match variant {
                        SeriesVariant::FilteredIntervals {
                            exclude_abs_ms_above,
                        } => {
                            if iv.delta_ms.abs() <= exclude_abs_ms_above {
                                by_lap.entry(lap).or_default().push(iv.delta_ms as f64);
                            }
                        }
                        SeriesVariant::CumulativeGaps => {
                            by_lap.entry(lap).or_default().push(total_ms as f64);
                        }
                    }
                }
                Err(err) => {
                    warn!("race {race_id} lap {lap} skipped: {err}");
                    if matches!(variant, SeriesVariant::CumulativeGaps) {
                        for l in lap..=last {
                            excluded.push((race_id, l));
                        }
                        break;
                    }
                    excluded.push((race_id, lap));
                }
            }
        }
    }

    let mut points = Vec::with_capacity(by_lap.len());
    let mut running = 0.0f64;
    for (lap, values) in by_lap {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let average_ms = match variant {
            SeriesVariant::FilteredIntervals { .. } => {
                running += mean;
                running
            }
            SeriesVariant::CumulativeGaps => mean,
        };
        points.push(AveragePoint { lap, average_ms });
    }

    SeriesReport { points, excluded }
}

/// `(lap, seconds)` rows for the charting front end.
pub fn chart_rows(points: &[AveragePoint]) -> Value {
    let mut rows = Vec::with_capacity(points.len());
    for p in points {
        rows.push(json!({
            "lap": p.lap,
            "seconds": p.average_ms / 1000.0
        }));
    }
    Value::Array(rows)
}
