//! 베트남식 숫자/날짜 문자열 파싱.
//!
//! cafef 페이지와 API는 같은 값을 여러 형식으로 표기합니다:
//! - 가격: `"85.5"`, `"85,500"`, `"1.234.567"`
//! - 등락: `"-1.2(-1.38 %)"`, `"+0.50 (+0.62%)"`
//! - 날짜: `"15/01/2026"`, `"2026-01-15"`
//!
//! 여기의 함수들은 두 경로(API, HTML)의 값을 같은 `Decimal` 표현으로 맞추는 데 사용됩니다.

use crate::error::{CoreError, CoreResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 숫자 문자열 파싱.
///
/// 공백, NBSP, `%`를 제거하고 천 단위 구분자를 정리합니다.
/// - 쉼표는 항상 천 단위 구분자로 취급합니다.
/// - 점이 하나면 소수점, 둘 이상이면 천 단위 구분자입니다.
///
/// 숫자가 없거나 `"-"`, `"--"` 같은 빈 표기는 `None`.
pub fn parse_vn_number(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != ',' && *c != '%')
        .map(|c| if c == '\u{2212}' || c == '\u{2013}' { '-' } else { c })
        .collect();

    let unsigned = cleaned.trim_start_matches(['+', '-']);
    if unsigned.is_empty() || !unsigned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if !unsigned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let negative = cleaned.starts_with('-');
    let digits = if unsigned.matches('.').count() > 1 {
        unsigned.replace('.', "")
    } else {
        unsigned.to_string()
    };

    let value = Decimal::from_str(&digits).ok()?;
    Some(if negative { -value } else { value })
}

/// 텍스트 앞부분의 숫자 토큰만 읽어 파싱합니다.
///
/// `"85.5 VND"` → `85.5`. 라벨 검색으로 얻은 꼬리 텍스트에 사용합니다.
pub fn parse_leading_number(text: &str) -> Option<Decimal> {
    let trimmed = text.trim_start_matches(|c: char| {
        c.is_whitespace() || c == ':' || c == '\u{a0}'
    });
    let token: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-' | '%'))
        .collect();
    parse_vn_number(&token)
}

/// 등락률(%) 파싱.
///
/// 괄호 안에 퍼센트가 있으면 그 값을, 없으면 전체를 숫자로 읽습니다.
/// `"-1.2(-1.38 %)"` → `-1.38`, `"0.62"` → `0.62`.
pub fn parse_change_percent(text: &str) -> CoreResult<Decimal> {
    let inner = match (text.find('('), text.rfind(')')) {
        (Some(open), Some(close)) if open < close => &text[open + 1..close],
        _ => text,
    };
    parse_vn_number(inner).ok_or_else(|| CoreError::InvalidNumber(text.to_string()))
}

/// 날짜 파싱 (`dd/mm/yyyy`, `d/m/yyyy`, `yyyy-mm-dd`).
pub fn parse_vn_date(text: &str) -> CoreResult<NaiveDate> {
    let s = text.trim();
    let parsed = if s.contains('/') {
        NaiveDate::parse_from_str(s, "%d/%m/%Y")
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
    };
    parsed.map_err(|_| CoreError::InvalidDate(text.to_string()))
}

/// 날짜처럼 보이는 셀인지 확인합니다 (HTML 표에서 데이터 행 판별용).
pub fn is_date_like(text: &str) -> bool {
    parse_vn_date(text).is_ok()
}

/// API 요청 파라미터용 날짜 형식 (`dd/mm/yyyy`).
pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
