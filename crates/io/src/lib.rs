use analysis::SeriesReport;
use anyhow::{Context, Result};
use log::info;
use model::*;
use serde::Deserialize;
use std::{fs::File, io::BufWriter, path::Path};

/// Import the historical `lap_times.csv` table.
///
/// The source schema is `raceId,driverId,lap,position,time,milliseconds`.
/// `driverId` is irrelevant to gap analysis and the precomputed
/// `milliseconds` column is dropped on purpose: downstream code derives
/// its own milliseconds from `time`.
pub fn import_lap_times(path: &Path) -> Result<Vec<LapRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut records = Vec::new();
    for rec in rdr.deserialize() {
        let r: CsvRow = rec?;
        records.push(LapRecord {
            race_id: r.race_id,
            lap: r.lap,
            position: r.position,
            time: r.time,
        });
    }
    info!("imported {} lap records from {}", records.len(), path.display());
    Ok(records)
}

/// Write a series as JSON chart rows (`lap`, `seconds`).
pub fn export_series_json(report: &SeriesReport, path: &Path) -> Result<()> {
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let rows = analysis::chart_rows(&report.points);
    serde_json::to_writer_pretty(BufWriter::new(f), &rows)?;
    Ok(())
}

/// Write a series as a two-column `lap,seconds` CSV.
pub fn export_series_csv(report: &SeriesReport, path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record(["lap", "seconds"])?;
    for p in &report.points {
        w.write_record([p.lap.to_string(), format!("{:.3}", p.average_ms / 1000.0)])?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Deserialize)]
struct CsvRow {
    #[serde(rename = "raceId")]
    race_id: u32,
    #[serde(rename = "driverId")]
    #[allow(dead_code)]
    driver_id: u32,
    lap: u32,
    position: u32,
    time: String,
    #[serde(rename = "milliseconds")]
    #[allow(dead_code)]
    milliseconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("gridgap-io-{}-{}", std::process::id(), name));
        p
    }

    #[test]
    fn import_drops_ignored_columns() {
        let path = temp_path("lap_times.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "raceId,driverId,lap,position,time,milliseconds").unwrap();
        writeln!(f, "841,20,1,1,\"1:38.109\",98109").unwrap();
        writeln!(f, "841,30,1,2,\"1:40.573\",100573").unwrap();
        drop(f);

        let records = import_lap_times(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            records,
            vec![
                LapRecord {
                    race_id: 841,
                    lap: 1,
                    position: 1,
                    time: "1:38.109".to_string()
                },
                LapRecord {
                    race_id: 841,
                    lap: 1,
                    position: 2,
                    time: "1:40.573".to_string()
                },
            ]
        );
    }

    #[test]
    fn series_json_round_trips() {
        let report = SeriesReport {
            points: vec![
                AveragePoint {
                    lap: 1,
                    average_ms: 1500.0,
                },
                AveragePoint {
                    lap: 2,
                    average_ms: 4500.0,
                },
            ],
            excluded: vec![],
        };

        let path = temp_path("series.json");
        export_series_json(&report, &path).unwrap();
        let rows: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rows, analysis::chart_rows(&report.points));
    }
}
