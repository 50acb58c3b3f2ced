//! 수집기 전반에서 사용되는 도메인 타입.

mod bar;
mod quote;
mod symbol;

pub use bar::*;
pub use quote::*;
pub use symbol::*;
