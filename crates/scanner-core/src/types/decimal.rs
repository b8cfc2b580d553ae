//! 정밀한 가격 계산을 위한 Decimal 유틸리티.
//!
//! 캔들 데이터는 Decimal로 보관하고, 지표 계산 경계에서 한 번만 f64로
//! 변환합니다. 지표/점수 출력 계약에는 Decimal이 노출되지 않습니다.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 거래량을 위한 타입.
pub type Quantity = Decimal;

/// Decimal을 유한한 f64로 변환합니다.
///
/// 변환이 불가능하거나 결과가 유한하지 않으면 None을 반환합니다.
pub fn to_finite_f64(value: Decimal) -> Option<f64> {
    value.to_f64().filter(|v| v.is_finite())
}

/// 소수점 둘째 자리로 반올림합니다.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_finite_f64() {
        assert_eq!(to_finite_f64(dec!(50000.5)), Some(50000.5));
        assert_eq!(to_finite_f64(Decimal::ZERO), Some(0.0));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.345), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(-0.005), -0.01);
        assert_eq!(round2(70.0), 70.0);
    }
}
