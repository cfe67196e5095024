//! Bar loading for the runner.
//!
//! Two sources:
//! 1. CSV files: `{data_dir}/{SYMBOL}.csv` with a
//!    `Date,Open,High,Low,Close,Volume,Adj Close` header
//! 2. Synthetic: a deterministic random walk, for development without data
//!
//! Either way the result is a per-symbol bar map ready for
//! [`HistoricBarFeed`](heartbeat_core::HistoricBarFeed).

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use heartbeat_core::{Bar, DataError, Timestamp};

/// One CSV row in the Yahoo-style layout.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
    /// Falls back to `Close` when the column is absent or empty.
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<f64>,
}

/// Path of a symbol's bar file.
pub fn csv_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{symbol}.csv"))
}

/// Parse a bar date: `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_timestamp(symbol: &str, value: &str) -> Result<Timestamp, DataError> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DataError::InvalidTimestamp {
            symbol: symbol.to_string(),
            value: value.to_string(),
        })
}

/// Load one symbol's bars from a CSV file, sorted by timestamp.
///
/// Rows strictly before `start` are dropped.
pub fn load_csv_bars(
    path: &Path,
    symbol: &str,
    start: Option<NaiveDate>,
) -> Result<Vec<Bar>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<CsvRow>() {
        let row = row.map_err(|e| DataError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let timestamp = parse_timestamp(symbol, &row.date)?;
        if start.is_some_and(|s| timestamp.date_naive() < s) {
            continue;
        }
        let bar = Bar {
            symbol: symbol.to_string(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.max(0.0).round() as u64,
            adj_close: row.adj_close.unwrap_or(row.close),
        };
        if !bar.is_sane() {
            skipped += 1;
            continue;
        }
        bars.push(bar);
    }
    if skipped > 0 {
        warn!(symbol, skipped, "dropped bars with inconsistent prices");
    }

    bars.sort_by_key(|bar| bar.timestamp);
    debug!(symbol, bars = bars.len(), path = %path.display(), "loaded CSV bars");
    Ok(bars)
}

/// Load every symbol's CSV from `data_dir`.
pub fn load_csv_dir(
    data_dir: &Path,
    symbols: &[String],
    start: Option<NaiveDate>,
) -> Result<HashMap<String, Vec<Bar>>, DataError> {
    let mut by_symbol = HashMap::with_capacity(symbols.len());
    for symbol in symbols {
        let bars = load_csv_bars(&csv_path(data_dir, symbol), symbol, start)?;
        by_symbol.insert(symbol.clone(), bars);
    }
    info!(symbols = symbols.len(), dir = %data_dir.display(), "loaded bar files");
    Ok(by_symbol)
}

/// Generate `count` synthetic daily bars from `start`, weekdays only.
///
/// A random walk from 100.0 seeded with the BLAKE3 hash of the symbol, so
/// the same symbol always produces the same series.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, count: usize) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut current = start;

    while bars.len() < count {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp: Utc.from_utc_datetime(&current.and_time(chrono::NaiveTime::MIN)),
            open,
            high,
            low,
            close,
            volume,
            adj_close: close,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Synthetic bars for every symbol.
pub fn synthetic_bars(
    symbols: &[String],
    start: NaiveDate,
    count: usize,
) -> HashMap<String, Vec<Bar>> {
    warn!(
        symbols = symbols.len(),
        bars = count,
        "generating synthetic data; results are not based on market prices"
    );
    symbols
        .iter()
        .map(|s| (s.clone(), generate_synthetic_bars(s, start, count)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, symbol: &str, body: &str) -> PathBuf {
        let path = csv_path(dir, symbol);
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_date_and_rfc3339() {
        let a = parse_timestamp("X", "2024-01-02").unwrap();
        assert_eq!(a, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        let b = parse_timestamp("X", "2024-01-02T15:30:00-05:00").unwrap();
        assert_eq!(b, Utc.with_ymd_and_hms(2024, 1, 2, 20, 30, 0).unwrap());
        assert!(matches!(
            parse_timestamp("X", "02/01/2024"),
            Err(DataError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn loads_sorted_bars_and_drops_early_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "SPY",
            "Date,Open,High,Low,Close,Volume,Adj Close\n\
             2024-01-04,101,103,100,102,1100,101.5\n\
             2023-12-29,98,99,97,98.5,900,98.0\n\
             2024-01-02,100,102,99,101,1000,100.5\n",
        );

        let bars =
            load_csv_bars(&path, "SPY", NaiveDate::from_ymd_opt(2024, 1, 1)).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 101.0);
        assert_eq!(bars[0].adj_close, 100.5);
        assert_eq!(bars[1].volume, 1100);
    }

    #[test]
    fn missing_adj_close_falls_back_to_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "QQQ",
            "Date,Open,High,Low,Close,Volume\n2024-01-02,10,11,9,10.5,100\n",
        );
        let bars = load_csv_bars(&path, "QQQ", None).unwrap();
        assert_eq!(bars[0].adj_close, 10.5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv_bars(&csv_path(dir.path(), "NOPE"), "NOPE", None).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "BAD",
            "Date,Open,High,Low,Close,Volume,Adj Close\n2024-01-02,abc,1,1,1,1,1\n",
        );
        assert!(matches!(
            load_csv_bars(&path, "BAD", None),
            Err(DataError::Csv { .. })
        ));
    }

    #[test]
    fn load_dir_reads_every_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let body = "Date,Open,High,Low,Close,Volume,Adj Close\n2024-01-02,1,1,1,1,1,1\n";
        write_csv(dir.path(), "A", body);
        write_csv(dir.path(), "B", body);
        let bars = load_csv_dir(dir.path(), &["A".into(), "B".into()], None).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars["B"][0].symbol, "B");
    }

    #[test]
    fn synthetic_is_deterministic_and_skips_weekends() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let a = generate_synthetic_bars("SPY", start, 30);
        let b = generate_synthetic_bars("SPY", start, 30);
        assert_eq!(a, b);
        assert_eq!(a.len(), 30);
        for bar in &a {
            let wd = bar.timestamp.weekday();
            assert!(wd != chrono::Weekday::Sat && wd != chrono::Weekday::Sun);
            assert!(bar.is_sane());
        }
        let c = generate_synthetic_bars("QQQ", start, 30);
        assert_ne!(a[5].close, c[5].close);
    }
}
