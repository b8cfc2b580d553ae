//! 피처 엔진 통합 테스트.
//!
//! 실제와 유사한 다심볼 OHLCV 배치를 구성하여 엔진의 출력 계약과
//! 실패 격리 동작을 검증합니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scanner_core::{Candle, CandlesByTimeframe, Timeframe};
use scanner_features::{FeatureEngine, MIN_CANDLES};
use std::collections::BTreeMap;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn daily_candle(day: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle::new(
        base_time() + Duration::days(day),
        Decimal::try_from(open).unwrap(),
        Decimal::try_from(high).unwrap(),
        Decimal::try_from(low).unwrap(),
        Decimal::try_from(close).unwrap(),
        Decimal::try_from(volume).unwrap(),
    )
}

fn h4_candle(step: i64, close: f64, volume: f64) -> Candle {
    Candle::new(
        base_time() + Duration::hours(step * 4),
        Decimal::try_from(close).unwrap(),
        Decimal::try_from(close + 1.0).unwrap(),
        Decimal::try_from(close - 1.0).unwrap(),
        Decimal::try_from(close).unwrap(),
        Decimal::try_from(volume).unwrap(),
    )
}

/// 선형 상승 일봉 시계열 (종가 100 + i).
fn linear_daily(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let price = 100.0 + i as f64;
            daily_candle(i as i64, price, price + 2.0, price - 2.0, price, 1000.0)
        })
        .collect()
}

/// 기하 상승 일봉 시계열 (일 3% 상승). 7일 수익률이 20%를 넘습니다.
fn geometric_daily(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let price = 100.0 * 1.03_f64.powi(i as i32);
            daily_candle(i as i64, price, price * 1.01, price * 0.99, price, 1000.0)
        })
        .collect()
}

#[test]
fn linear_rise_scenario() {
    let engine = FeatureEngine::new();

    let mut ohlcv = BTreeMap::new();
    let mut tf_data = CandlesByTimeframe::new();
    tf_data.insert(Timeframe::D1, linear_daily(60));
    tf_data.insert(
        Timeframe::H4,
        (0..100).map(|i| h4_candle(i, 100.0 + i as f64 * 0.1, 200.0)).collect(),
    );
    ohlcv.insert("BTCUSDT".to_string(), tf_data);

    let batch = engine.compute_all(&ohlcv);
    assert!(batch.failures.is_empty());

    let features = &batch.features["BTCUSDT"];
    let d1 = features.d1().unwrap();

    assert!(d1.r_7.unwrap() > 0.0);
    assert!(d1.hh_20);
    assert_eq!(d1.drawdown_from_ath, Some(0.0));

    // 4h에서는 베이스 신호가 항상 미정의
    let h4 = features.h4().unwrap();
    assert!(!h4.is_empty());
    assert_eq!(h4.base_signal, None);
}

#[test]
fn geometric_rise_clears_momentum_threshold() {
    let engine = FeatureEngine::new();
    let candles = geometric_daily(60);

    let set = engine
        .compute_timeframe("MOONUSDT", Timeframe::D1, &candles)
        .unwrap();

    // 1.03^7 - 1 ≈ 22.99% > 20%
    assert!(set.r_7.unwrap() >= 20.0);
    assert_eq!(set.drawdown_from_ath, Some(0.0));
}

#[test]
fn insufficient_history_markers() {
    let engine = FeatureEngine::new();

    // 정확히 MIN_CANDLES개: 처리되지만 일부 지표는 미정의로 남을 수 있음
    let candles = linear_daily(MIN_CANDLES);
    let set = engine
        .compute_timeframe("NEWUSDT", Timeframe::D1, &candles)
        .unwrap();

    assert!(!set.is_empty());
    // 50개로 EMA50은 정의됨, r_7도 정의됨
    assert!(set.ema_50.is_some());
    assert!(set.r_7.is_some());

    // MIN_CANDLES 미만: 빈 집합
    let short = linear_daily(MIN_CANDLES - 1);
    let empty = engine
        .compute_timeframe("NEWUSDT", Timeframe::D1, &short)
        .unwrap();
    assert!(empty.is_empty());
}

#[test]
fn mixed_batch_isolates_failures() {
    let engine = FeatureEngine::new();

    let mut ohlcv = BTreeMap::new();

    for (idx, symbol) in ["AAAUSDT", "BBBUSDT", "CCCUSDT"].iter().enumerate() {
        let mut candles = linear_daily(60);
        if idx == 1 {
            // BBBUSDT에 비정상 캔들 주입 (고가 < 저가)
            candles[5] = Candle::new(
                base_time() + Duration::days(5),
                dec!(100),
                dec!(90),
                dec!(110),
                dec!(100),
                dec!(1000),
            );
        }
        let mut tf_data = CandlesByTimeframe::new();
        tf_data.insert(Timeframe::D1, candles);
        ohlcv.insert(symbol.to_string(), tf_data);
    }

    let batch = engine.compute_all(&ohlcv);

    assert_eq!(batch.features.len(), 2);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].symbol, "BBBUSDT");
    assert!(batch.features.contains_key("AAAUSDT"));
    assert!(batch.features.contains_key("CCCUSDT"));
}

#[test]
fn batch_output_is_deterministic() {
    let engine = FeatureEngine::new();

    let mut ohlcv = BTreeMap::new();
    for symbol in ["ETHUSDT", "SOLUSDT", "ADAUSDT"] {
        let mut tf_data = CandlesByTimeframe::new();
        tf_data.insert(Timeframe::D1, geometric_daily(70));
        ohlcv.insert(symbol.to_string(), tf_data);
    }

    let first = engine.compute_all(&ohlcv);
    let second = engine.compute_all(&ohlcv);

    assert_eq!(first.features, second.features);
}
