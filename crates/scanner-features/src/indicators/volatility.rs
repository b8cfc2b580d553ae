//! 변동성 지표.

/// 현재가 대비 ATR 비율 (%).
///
/// 봉별 실제 범위 = `max(high - low, |high - prev_close|, |low - prev_close|)`,
/// ATR = 최근 period개 실제 범위의 평균, 결과 = `ATR / close × 100`.
///
/// 캔들이 period + 1개 미만이거나 종가가 0 이하이면 미정의입니다.
pub fn atr_pct(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let len = highs.len();
    if period == 0 || len < period + 1 || lows.len() != len || closes.len() != len {
        return None;
    }

    let last_close = closes[len - 1];
    if last_close <= 0.0 {
        return None;
    }

    // 최근 period개 봉의 실제 범위 합
    let mut tr_sum = 0.0;
    for i in len - period..len {
        let hl = highs[i] - lows[i];
        let hc = (highs[i] - closes[i - 1]).abs();
        let lc = (lows[i] - closes[i - 1]).abs();
        tr_sum += hl.max(hc).max(lc);
    }

    let atr = tr_sum / period as f64;
    Some(atr / last_close * 100.0)
}
