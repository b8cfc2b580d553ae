//! 거래량 지표.

/// 단순 이동평균 (SMA).
///
/// 최근 period개 값의 산술 평균. 값이 period개 미만이면 미정의입니다.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }

    let sum: f64 = values[values.len() - period..].iter().sum();
    Some(sum / period as f64)
}

/// 거래량 스파이크 배수.
///
/// `최근 거래량 / 거래량 SMA`. SMA가 미정의이거나 0이면 미정의입니다.
/// 기본값 1.0 같은 조용한 대체값은 사용하지 않습니다.
pub fn volume_spike(volumes: &[f64], volume_sma: Option<f64>) -> Option<f64> {
    let last = *volumes.last()?;
    match volume_sma {
        Some(avg) if avg > 0.0 => Some(last / avg),
        _ => None,
    }
}
