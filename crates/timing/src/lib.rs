//! Lap-time and gap string codec.
//!
//! The historical dataset stores every duration as a display string
//! (`1:30.500`, `+2.345`, `--:--`); canonical form everywhere else in the
//! workspace is signed integer milliseconds.

use thiserror::Error;

/// Display form of an absent duration (e.g. the leader has no gap).
pub const NO_TIME: &str = "--:--";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("duration `{0}` has too many `:` segments")]
    SegmentCount(String),
    #[error("non-numeric duration segment `{0}`")]
    BadSegment(String),
}

/// Parse a formatted duration or gap string into signed milliseconds.
///
/// Accepted shapes: the `--:--` sentinel (0 ms), `SS.sss`, `M:SS.sss` and
/// `H:M:SS.sss`, each with an optional leading `+` or `-`. An hour segment
/// may carry a day-count prefix (`1 day, 2`); only the token after the last
/// space counts.
pub fn parse_delta(delta: &str) -> Result<i64, FormatError> {
    if delta == NO_TIME {
        return Ok(0);
    }

    let (negative, rest) = match delta.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, delta.strip_prefix('+').unwrap_or(delta)),
    };

    let segments: Vec<&str> = rest.split(':').collect();
    let seconds = match segments.as_slice() {
        [s] => parse_segment(s)?,
        [m, s] => parse_segment(m)? * 60.0 + parse_segment(s)?,
        [h, m, s] => parse_hours(h)? * 3600.0 + parse_segment(m)? * 60.0 + parse_segment(s)?,
        _ => return Err(FormatError::SegmentCount(delta.to_string())),
    };

    // Truncate toward zero. The guard is far below any genuine
    // sub-millisecond digit but absorbs float representation error on
    // three-decimal strings, so formatter output parses back exactly.
    let ms = (seconds * 1000.0 + 1e-6) as i64;
    Ok(if negative { -ms } else { ms })
}

/// Render milliseconds as a display string; `None` maps to the sentinel.
///
/// Always renders the absolute value — the sign character is the caller's
/// concern. Hour and minute components are unpadded and seconds keep
/// exactly three decimals, matching the dataset's own formatting.
pub fn format_delta(ms: Option<i64>) -> String {
    let Some(ms) = ms else {
        return NO_TIME.to_string();
    };

    let v = (ms as f64 / 1000.0).abs();
    if v >= 3600.0 {
        let hours = (v / 3600.0) as u64;
        let minutes = ((v % 3600.0) / 60.0) as u64;
        format!("{}:{}:{:.3}", hours, minutes, v % 60.0)
    } else {
        format!("{}:{:.3}", (v / 60.0) as u64, v % 60.0)
    }
}

fn parse_segment(seg: &str) -> Result<f64, FormatError> {
    seg.parse::<f64>()
        .map_err(|_| FormatError::BadSegment(seg.to_string()))
}

fn parse_hours(seg: &str) -> Result<f64, FormatError> {
    if let Ok(v) = seg.parse::<f64>() {
        return Ok(v);
    }
    // Elapsed time rolling past a day shows up as e.g. "1 day, 2" in the
    // hour segment; the usable hour count is the last token.
    seg.split_whitespace()
        .last()
        .and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(|| FormatError::BadSegment(seg.to_string()))
}
