//! 수집 결과 저장소.
//!
//! - `csv_writer`: 종목별 CSV 파일 (일별 시세 덮어쓰기/병합, 실시간 시세 추가)

pub mod csv_writer;

pub use csv_writer::{CsvStorage, HistoricalWritePolicy, HISTORICAL_HEADER, REALTIME_HEADER};
