//! 가격 구조 지표.
//!
//! 고점/저점 구조, 돌파 거리, ATH 낙폭, 베이스(횡보) 안정성을 계산합니다.

/// 최근 구간 고가 비교 봉 수.
const RECENT_BARS: usize = 5;

/// 고점 갱신 여부.
///
/// 최근 5봉의 최고가가 직전 15봉(lookback - 5)의 최고가보다 높으면 true.
/// 캔들이 lookback개 미만이면 false입니다.
pub fn higher_high(highs: &[f64], lookback: usize) -> bool {
    let len = highs.len();
    if len < lookback || lookback <= RECENT_BARS {
        return false;
    }

    let recent_high = max_of(&highs[len - RECENT_BARS..]);
    let prior_high = max_of(&highs[len - lookback..len - RECENT_BARS]);

    recent_high > prior_high
}

/// 저점 상승 여부.
///
/// 최근 5봉의 최저가가 직전 15봉의 최저가보다 높으면 true.
/// 캔들이 lookback개 미만이면 false입니다.
pub fn higher_low(lows: &[f64], lookback: usize) -> bool {
    let len = lows.len();
    if len < lookback || lookback <= RECENT_BARS {
        return false;
    }

    let recent_low = min_of(&lows[len - RECENT_BARS..]);
    let prior_low = min_of(&lows[len - lookback..len - RECENT_BARS]);

    recent_low > prior_low
}

/// 최근 고점 대비 돌파 거리 (%).
///
/// `(close / max(highs[최근 lookback개]) - 1) × 100`.
/// 양수 = 고점 위, 음수 = 고점 아래. 캔들이 lookback개 미만이면
/// 미정의입니다.
pub fn breakout_distance(closes: &[f64], highs: &[f64], lookback: usize) -> Option<f64> {
    let len = highs.len();
    if lookback == 0 || len < lookback || closes.len() != len {
        return None;
    }

    let recent_high = max_of(&highs[len - lookback..]);
    if recent_high <= 0.0 {
        return None;
    }

    Some((closes[len - 1] / recent_high - 1.0) * 100.0)
}

/// 역대 최고 종가 대비 낙폭 (%).
///
/// `(close / max(전체 종가) - 1) × 100`. 구성상 항상 0 이하이며,
/// 마지막 종가가 최고 종가일 때 정확히 0입니다. 빈 시계열에서만
/// 미정의입니다.
pub fn drawdown_from_ath(closes: &[f64]) -> Option<f64> {
    if closes.is_empty() {
        return None;
    }

    let ath = max_of(closes);
    if ath <= 0.0 {
        return None;
    }

    Some((closes[closes.len() - 1] / ath - 1.0) * 100.0)
}

/// 베이스(횡보 조정) 안정성 점수 (0~100).
///
/// 30봉 조회 구간을 최근 1/3과 이전 2/3로 나눕니다:
/// - 최근 1/3의 최저가가 이전 2/3의 최저가 이상이면 "신저점 없음"
/// - 안정성 = `100 - 가격 범위 %` (0에서 하한), 범위 % = 최근 1/3 종가의
///   (최대 - 최소) / 평균 × 100
/// - 최종 값 = 신저점 없음이면 안정성, 아니면 안정성의 절반
///
/// 캔들이 lookback개 미만이면 미정의입니다.
pub fn base_stability(closes: &[f64], lows: &[f64], lookback: usize) -> Option<f64> {
    let len = closes.len();
    let recent_period = lookback / 3;
    if len < lookback || recent_period == 0 || lows.len() != len {
        return None;
    }

    let recent_low = min_of(&lows[len - recent_period..]);
    let prior_low = min_of(&lows[len - lookback..len - recent_period]);
    let no_new_lows = recent_low >= prior_low;

    let recent_closes = &closes[len - recent_period..];
    let mean: f64 = recent_closes.iter().sum::<f64>() / recent_period as f64;
    if mean <= 0.0 {
        return None;
    }

    let range_pct = (max_of(recent_closes) - min_of(recent_closes)) / mean * 100.0;
    let stability = (100.0 - range_pct).max(0.0);

    Some(if no_new_lows { stability } else { stability / 2.0 })
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
