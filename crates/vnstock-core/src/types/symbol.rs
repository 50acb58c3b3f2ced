//! 종목 심볼.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 심볼 최대 길이 (ETF 코드 `E1VFVN30` 등 포함).
pub const MAX_SYMBOL_LEN: usize = 10;

/// 베트남 주식 종목 심볼 (예: `ACV`, `VIC`, `E1VFVN30`).
///
/// 항상 대문자 ASCII 영숫자이며, 문자열 자체가 식별자입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// 입력을 정리(trim, 대문자화)하고 검증하여 심볼을 생성합니다.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty()
            || normalized.len() > MAX_SYMBOL_LEN
            || !normalized.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(CoreError::InvalidSymbol(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// 심볼 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL 경로용 소문자 심볼 (cafef 페이지 주소 형식).
    pub fn to_lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
