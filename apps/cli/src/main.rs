//! Batch front end: load a historical `lap_times.csv`, build the averaged
//! leader-gap series and emit chart rows as JSON.

use analysis::{average_gap_series, SeriesVariant, DEFAULT_OUTLIER_MS};
use anyhow::{bail, Context, Result};
use model::LapTable;
use std::path::PathBuf;

const USAGE: &str = "usage: gridgap-cli <lap_times.csv> \
[--variant filtered|cumulative] [--threshold-ms N] [--out FILE.json]";

struct Options {
    input: PathBuf,
    variant: SeriesVariant,
    out: Option<PathBuf>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut input = None;
        let mut variant_name = "filtered".to_string();
        let mut threshold_ms = DEFAULT_OUTLIER_MS;
        let mut out = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--variant" => {
                    variant_name = args.next().context("--variant needs a value")?;
                }
                "--threshold-ms" => {
                    threshold_ms = args
                        .next()
                        .context("--threshold-ms needs a value")?
                        .parse()
                        .context("--threshold-ms must be an integer")?;
                }
                "--out" => {
                    out = Some(PathBuf::from(args.next().context("--out needs a value")?));
                }
                other if input.is_none() && !other.starts_with('-') => {
                    input = Some(PathBuf::from(other));
                }
                other => bail!("unexpected argument `{other}`\n{USAGE}"),
            }
        }

        let variant = match variant_name.as_str() {
            "filtered" => SeriesVariant::FilteredIntervals {
                exclude_abs_ms_above: threshold_ms,
            },
            "cumulative" => SeriesVariant::CumulativeGaps,
            other => bail!("unknown variant `{other}`\n{USAGE}"),
        };

        Ok(Self {
            input: input.with_context(|| format!("missing input file\n{USAGE}"))?,
            variant,
            out,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let opts = Options::parse(std::env::args().skip(1))?;

    let records = iox::import_lap_times(&opts.input)?;
    let table = LapTable::from_records(records);
    log::info!(
        "{} records across {} races",
        table.len(),
        table.races().len()
    );

    let report = average_gap_series(&table, opts.variant);
    for (race_id, lap) in &report.excluded {
        log::warn!("race {race_id} lap {lap} excluded from the averages");
    }

    match &opts.out {
        Some(path) => iox::export_series_json(&report, path)?,
        None => {
            let rows = analysis::chart_rows(&report.points);
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
