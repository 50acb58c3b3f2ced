//! 데이터 수집 모듈.

pub mod historical_collect;
pub mod realtime_poll;
pub mod symbol_check;

pub use historical_collect::{collect_historical, HistoricalOptions};
pub use realtime_poll::{poll_realtime, RealtimeOptions};
pub use symbol_check::{load_symbols, render_symbols, SymbolSource};
