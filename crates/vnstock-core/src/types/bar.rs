//! 일별 시세 (Bar).

use super::Symbol;
use crate::error::{CoreError, CoreResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 종목의 하루 거래 기록.
///
/// 가격 단위는 업스트림 표기(천 VND)를 그대로 따릅니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalBar {
    /// 종목
    pub symbol: Symbol,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
    /// 수정 종가
    pub adj_close: Decimal,
    /// 매칭 거래량
    pub volume: u64,
    /// 매칭 거래대금
    pub value: Decimal,
    /// 협상(블록딜) 거래량
    pub deal_volume: u64,
    /// 협상(블록딜) 거래대금
    pub deal_value: Decimal,
    /// 등락률 (%)
    pub change: Decimal,
}

impl HistoricalBar {
    /// 음수가 허용되지 않는 필드를 검사합니다.
    ///
    /// 등락률(`change`)만 음수가 될 수 있습니다.
    pub fn validate(&self) -> CoreResult<()> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("adj_close", self.adj_close),
            ("value", self.value),
            ("deal_value", self.deal_value),
        ];
        for (field, value) in prices {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(CoreError::InvalidValue {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::bar;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_accepts_negative_change() {
        let mut b = bar("ACV", NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), dec!(85.5));
        b.change = dec!(-2.1);
        assert!(b.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut b = bar("ACV", NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), dec!(85.5));
        b.low = dec!(-1);
        assert_eq!(
            b.validate(),
            Err(CoreError::InvalidValue {
                field: "low",
                value: "-1".to_string()
            })
        );
    }
}
