//! 종목별 CSV 저장.
//!
//! ## 파일 배치
//! - 일별 시세: `{historical_dir}/{SYMBOL}.csv`
//! - 실시간 시세: `{realtime_dir}/{SYMBOL}_realtime.csv`
//!
//! 일별 시세는 임시 파일에 쓴 뒤 rename하므로 중간에 실패해도 기존 파일이 깨지지 않습니다.
//! 실시간 시세는 추가 전용이며, 헤더는 파일이 새로 생기거나 비어 있을 때만 씁니다.

use crate::error::WriteError;
use chrono::SecondsFormat;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vnstock_core::{HistoricalBar, RealtimeQuote, Symbol};

/// 일별 시세 CSV 헤더.
pub const HISTORICAL_HEADER: [&str; 11] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
    "value",
    "deal_volume",
    "deal_value",
    "change",
];

/// 실시간 시세 CSV 헤더.
pub const REALTIME_HEADER: [&str; 8] = [
    "timestamp", "price", "open", "high", "low", "volume", "change", "source",
];

/// 일별 시세 파일이 이미 있을 때의 처리 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoricalWritePolicy {
    /// 이번 수집 결과로 교체
    #[default]
    Overwrite,
    /// 이번 수집 결과 + 기존 파일에만 있는 날짜 (같은 날짜는 새 값 우선)
    MergeByDate,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> WriteError + '_ {
    move |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> WriteError + '_ {
    move |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn bar_record(bar: &HistoricalBar) -> StringRecord {
    StringRecord::from(vec![
        bar.date.format("%Y-%m-%d").to_string(),
        bar.open.to_string(),
        bar.high.to_string(),
        bar.low.to_string(),
        bar.close.to_string(),
        bar.adj_close.to_string(),
        bar.volume.to_string(),
        bar.value.to_string(),
        bar.deal_volume.to_string(),
        bar.deal_value.to_string(),
        bar.change.to_string(),
    ])
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn quote_record(quote: &RealtimeQuote) -> StringRecord {
    StringRecord::from(vec![
        quote.captured_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        quote.price.to_string(),
        optional(quote.open),
        optional(quote.high),
        optional(quote.low),
        optional(quote.volume),
        optional(quote.change),
        quote.source.to_string(),
    ])
}

/// 종목별 CSV 파일 저장소.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    historical_dir: PathBuf,
    realtime_dir: PathBuf,
}

impl CsvStorage {
    /// 출력 디렉터리로 생성합니다. 디렉터리는 첫 쓰기 때 만들어집니다.
    pub fn new(historical_dir: impl Into<PathBuf>, realtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            historical_dir: historical_dir.into(),
            realtime_dir: realtime_dir.into(),
        }
    }

    /// 일별 시세 파일 경로.
    pub fn historical_path(&self, symbol: &Symbol) -> PathBuf {
        self.historical_dir.join(format!("{}.csv", symbol))
    }

    /// 실시간 시세 파일 경로.
    pub fn realtime_path(&self, symbol: &Symbol) -> PathBuf {
        self.realtime_dir.join(format!("{}_realtime.csv", symbol))
    }

    /// 일별 시세를 종목 파일에 씁니다. 행 순서는 입력 순서를 따릅니다.
    ///
    /// 한 파일 안에서 날짜는 유일합니다. 같은 날짜가 반복되면 처음 나온 행만 남깁니다.
    /// 실제로 기록된 행 수를 반환합니다 (병합 시 기존 행 포함).
    pub fn write_historical(
        &self,
        symbol: &Symbol,
        bars: &[HistoricalBar],
        policy: HistoricalWritePolicy,
    ) -> Result<usize, WriteError> {
        fs::create_dir_all(&self.historical_dir).map_err(io_error(&self.historical_dir))?;

        let path = self.historical_path(symbol);
        let mut records: Vec<StringRecord> = bars.iter().map(bar_record).collect();

        if policy == HistoricalWritePolicy::MergeByDate && path.exists() {
            let fresh_dates: HashSet<String> =
                records.iter().filter_map(|r| r.get(0).map(str::to_string)).collect();
            let retained: Vec<StringRecord> = read_records(&path)?
                .into_iter()
                .filter(|r| r.get(0).is_some_and(|date| !fresh_dates.contains(date)))
                .collect();
            debug!(symbol = %symbol, retained = retained.len(), "기존 행 병합");
            records.extend(retained);
        }
        let records = dedup_by_date(symbol, records);

        let tmp_path = path.with_extension("csv.tmp");
        {
            let mut wtr = WriterBuilder::new()
                .from_path(&tmp_path)
                .map_err(csv_error(&tmp_path))?;
            wtr.write_record(HISTORICAL_HEADER)
                .map_err(csv_error(&tmp_path))?;
            for record in &records {
                wtr.write_record(record).map_err(csv_error(&tmp_path))?;
            }
            wtr.flush().map_err(io_error(&tmp_path))?;
        }
        fs::rename(&tmp_path, &path).map_err(io_error(&path))?;

        info!(symbol = %symbol, rows = records.len(), path = %path.display(), "일별 시세 저장");
        Ok(records.len())
    }

    /// 실시간 시세 1행을 종목 파일 끝에 추가합니다.
    pub fn append_realtime(&self, quote: &RealtimeQuote) -> Result<(), WriteError> {
        fs::create_dir_all(&self.realtime_dir).map_err(io_error(&self.realtime_dir))?;

        let path = self.realtime_path(&quote.symbol);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error(&path))?;
        let needs_header = file.metadata().map_err(io_error(&path))?.len() == 0;

        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            wtr.write_record(REALTIME_HEADER).map_err(csv_error(&path))?;
        }
        wtr.write_record(&quote_record(quote))
            .map_err(csv_error(&path))?;
        wtr.flush().map_err(io_error(&path))?;

        debug!(symbol = %quote.symbol, source = %quote.source, "실시간 시세 추가");
        Ok(())
    }
}

/// 날짜(첫 열) 기준 중복 제거. 처음 나온 행 우선.
fn dedup_by_date(symbol: &Symbol, records: Vec<StringRecord>) -> Vec<StringRecord> {
    let mut seen = HashSet::new();
    let before = records.len();
    let unique: Vec<StringRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.get(0).unwrap_or_default().to_string()))
        .collect();
    if unique.len() < before {
        warn!(symbol = %symbol, dropped = before - unique.len(), "중복 날짜 행 제외");
    }
    unique
}

fn read_records(path: &Path) -> Result<Vec<StringRecord>, WriteError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_error(path))?;
    rdr.records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use vnstock_core::QuoteSource;

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    fn bar(day: u32, close: Decimal) -> HistoricalBar {
        HistoricalBar {
            symbol: sym("ACV"),
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            open: close,
            high: close + dec!(0.5),
            low: close - dec!(0.5),
            close,
            adj_close: close,
            volume: 120_000,
            value: dec!(10250000000),
            deal_volume: 0,
            deal_value: dec!(0),
            change: dec!(-1.38),
        }
    }

    fn storage(dir: &tempfile::TempDir) -> CsvStorage {
        CsvStorage::new(dir.path().join("historical"), dir.path().join("realtime"))
    }

    #[test]
    fn test_write_historical_layout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        let bars = vec![bar(16, dec!(86)), bar(15, dec!(85.8))];

        let rows = storage
            .write_historical(&sym("ACV"), &bars, HistoricalWritePolicy::Overwrite)
            .unwrap();
        assert_eq!(rows, 2);

        let content = fs::read_to_string(storage.historical_path(&sym("ACV"))).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "date,open,high,low,close,adj_close,volume,value,deal_volume,deal_value,change"
        );
        assert_eq!(lines[1], "2026-01-16,86,86.5,85.5,86,86,120000,10250000000,0,0,-1.38");
        assert!(lines[2].starts_with("2026-01-15,85.8,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_duplicate_dates_keep_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        let mut second = bar(16, dec!(87));
        second.volume = 2;
        let bars = vec![bar(16, dec!(86)), second, bar(15, dec!(85.8))];

        for policy in [HistoricalWritePolicy::Overwrite, HistoricalWritePolicy::MergeByDate] {
            let rows = storage.write_historical(&sym("ACV"), &bars, policy).unwrap();
            assert_eq!(rows, 2);

            let content = fs::read_to_string(storage.historical_path(&sym("ACV"))).unwrap();
            let lines: Vec<&str> = content.lines().skip(1).collect();
            assert_eq!(lines.len(), 2);
            assert!(lines[0].starts_with("2026-01-16,86,"));
            assert!(lines[1].starts_with("2026-01-15,"));
        }
    }

    #[test]
    fn test_overwrite_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        let bars = vec![bar(16, dec!(86)), bar(15, dec!(85.8))];
        let path = storage.historical_path(&sym("ACV"));

        storage
            .write_historical(&sym("ACV"), &bars, HistoricalWritePolicy::Overwrite)
            .unwrap();
        let first = fs::read(&path).unwrap();
        storage
            .write_historical(&sym("ACV"), &bars, HistoricalWritePolicy::Overwrite)
            .unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_merge_keeps_old_dates_and_prefers_fresh_rows() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        let symbol = sym("ACV");

        storage
            .write_historical(&symbol, &[bar(15, dec!(80)), bar(14, dec!(79))], HistoricalWritePolicy::Overwrite)
            .unwrap();
        let rows = storage
            .write_historical(&symbol, &[bar(16, dec!(86)), bar(15, dec!(85.8))], HistoricalWritePolicy::MergeByDate)
            .unwrap();
        assert_eq!(rows, 3);

        let content = fs::read_to_string(storage.historical_path(&symbol)).unwrap();
        let dates_and_close: Vec<(String, String)> = content
            .lines()
            .skip(1)
            .map(|line| {
                let cols: Vec<&str> = line.split(',').collect();
                (cols[0].to_string(), cols[4].to_string())
            })
            .collect();
        assert_eq!(
            dates_and_close,
            vec![
                ("2026-01-16".to_string(), "86".to_string()),
                ("2026-01-15".to_string(), "85.8".to_string()),
                ("2026-01-14".to_string(), "79".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_without_existing_file_writes_fresh_rows() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        let rows = storage
            .write_historical(&sym("VNM"), &[bar(16, dec!(61))], HistoricalWritePolicy::MergeByDate)
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_append_realtime_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        let quote = |minute: u32, price: Decimal, source: QuoteSource| RealtimeQuote {
            symbol: sym("VNM"),
            captured_at: Utc.with_ymd_and_hms(2026, 1, 16, 3, minute, 0).unwrap(),
            price,
            open: Some(dec!(61)),
            high: None,
            low: None,
            volume: Some(1_500),
            change: Some(dec!(0.33)),
            source,
        };

        storage.append_realtime(&quote(0, dec!(61.2), QuoteSource::Api)).unwrap();
        storage.append_realtime(&quote(1, dec!(61.3), QuoteSource::Page)).unwrap();

        let content = fs::read_to_string(storage.realtime_path(&sym("VNM"))).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,price,open,high,low,volume,change,source");
        assert_eq!(lines[1], "2026-01-16T03:00:00Z,61.2,61,,,1500,0.33,api");
        assert_eq!(lines[2], "2026-01-16T03:01:00Z,61.3,61,,,1500,0.33,page");
    }

    #[test]
    fn test_append_to_empty_existing_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        fs::create_dir_all(dir.path().join("realtime")).unwrap();
        fs::write(storage.realtime_path(&sym("FPT")), "").unwrap();

        let quote = RealtimeQuote {
            symbol: sym("FPT"),
            captured_at: Utc.with_ymd_and_hms(2026, 1, 16, 3, 0, 0).unwrap(),
            price: dec!(120.5),
            open: None,
            high: None,
            low: None,
            volume: None,
            change: None,
            source: QuoteSource::Api,
        };
        storage.append_realtime(&quote).unwrap();

        let content = fs::read_to_string(storage.realtime_path(&sym("FPT"))).unwrap();
        assert!(content.starts_with("timestamp,"));
        assert_eq!(content.lines().count(), 2);
    }
}
