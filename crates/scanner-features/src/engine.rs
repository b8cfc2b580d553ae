//! 피처 엔진 및 배치 드라이버.
//!
//! 심볼별 캔들 시퀀스를 지표 집합으로 변환합니다. 배치 처리 시 심볼
//! 하나의 실패(비정상 캔들)는 로그와 실패 레코드로 격리되며, 다른
//! 심볼 처리를 중단시키지 않습니다.

use crate::indicators::{returns, structure, trend, volatility, volume};
use scanner_core::{
    to_finite_f64, Candle, CandlesByTimeframe, FeatureMeta, IndicatorSet, ScanObserver, ScanStage,
    SymbolFailure, SymbolFeatures, Timeframe, TracingObserver,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// 타임프레임 처리에 필요한 최소 캔들 수.
///
/// 이보다 적으면 해당 타임프레임은 빈 지표 집합으로 건너뜁니다.
/// 퇴화된 지표를 조용히 만들어내지 않습니다.
pub const MIN_CANDLES: usize = 50;

/// 단기 EMA 기간.
const EMA_SHORT_PERIOD: usize = 20;
/// 장기 EMA 기간.
const EMA_LONG_PERIOD: usize = 50;
/// ATR 기간.
const ATR_PERIOD: usize = 14;
/// 거래량 SMA 기간.
const VOLUME_SMA_PERIOD: usize = 14;
/// 고점/저점 구조 조회 구간.
const STRUCTURE_LOOKBACK: usize = 20;
/// 단기 돌파 거리 조회 구간.
const BREAKOUT_LOOKBACK_SHORT: usize = 20;
/// 장기 돌파 거리 조회 구간.
const BREAKOUT_LOOKBACK_LONG: usize = 30;
/// 베이스 감지 조회 구간 (일봉 전용).
const BASE_LOOKBACK: usize = 30;

/// 피처 계산 오류.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// 비정상 캔들 데이터
    #[error("비정상 캔들 (index {index}): {reason}")]
    MalformedCandle { index: usize, reason: String },
}

/// 피처 계산 결과 타입.
pub type FeatureResult<T> = Result<T, FeatureError>;

/// 피처 배치 결과.
///
/// 성공한 심볼의 피처와 격리된 실패 레코드를 함께 담습니다. 실패한
/// 심볼 수는 `failures`로 관측 가능하며, 출력 개수 불일치로도
/// 드러납니다.
#[derive(Debug)]
pub struct FeatureBatch {
    /// 심볼 → 피처
    pub features: BTreeMap<String, SymbolFeatures>,
    /// 제외된 심볼과 사유
    pub failures: Vec<SymbolFailure>,
}

/// 피처 엔진.
///
/// 캔들 시퀀스에 대한 순수 함수로, I/O와 공유 상태가 없습니다. 같은
/// 입력에 대해 항상 비트 단위로 동일한 지표 집합을 생성합니다.
pub struct FeatureEngine {
    observer: Arc<dyn ScanObserver>,
}

impl FeatureEngine {
    /// 기본 관찰자(tracing)로 피처 엔진을 생성합니다.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// 주입된 관찰자로 피처 엔진을 생성합니다.
    pub fn with_observer(observer: Arc<dyn ScanObserver>) -> Self {
        Self { observer }
    }

    /// 전체 심볼의 피처를 계산합니다.
    ///
    /// 심볼 하나의 실패는 관찰자에 보고되고 실패 레코드로 집계되며,
    /// 나머지 심볼은 계속 처리됩니다.
    pub fn compute_all(&self, ohlcv: &BTreeMap<String, CandlesByTimeframe>) -> FeatureBatch {
        let total = ohlcv.len();
        tracing::info!(symbols = total, "피처 계산 시작");

        let mut features = BTreeMap::new();
        let mut failures = Vec::new();

        for (symbol, tf_data) in ohlcv {
            match self.compute_symbol(symbol, tf_data) {
                Ok(symbol_features) => {
                    features.insert(symbol.clone(), symbol_features);
                }
                Err(err) => {
                    let reason = err.to_string();
                    self.observer
                        .symbol_failed(ScanStage::Features, symbol, &reason);
                    failures.push(SymbolFailure {
                        symbol: symbol.clone(),
                        reason,
                    });
                }
            }
        }

        self.observer
            .batch_completed(ScanStage::Features, features.len(), failures.len());

        FeatureBatch { features, failures }
    }

    /// 한 심볼의 타임프레임별 피처를 계산합니다.
    pub fn compute_symbol(
        &self,
        symbol: &str,
        tf_data: &CandlesByTimeframe,
    ) -> FeatureResult<SymbolFeatures> {
        let mut timeframes = BTreeMap::new();

        for (timeframe, candles) in tf_data {
            let set = self.compute_timeframe(symbol, *timeframe, candles)?;
            timeframes.insert(*timeframe, set);
        }

        // 메타: 가장 최근 일봉 캔들의 시작 시간
        let last_update = tf_data
            .get(&Timeframe::D1)
            .and_then(|candles| candles.last())
            .map(|candle| candle.open_time);

        Ok(SymbolFeatures {
            timeframes,
            meta: FeatureMeta {
                symbol: symbol.to_string(),
                last_update,
            },
        })
    }

    /// 단일 타임프레임의 지표 집합을 계산합니다.
    ///
    /// 캔들이 [`MIN_CANDLES`]개 미만이면 빈 집합을 반환합니다. 비정상
    /// 캔들(고가 < 저가, 시간 역행 등)은 에러로 해당 심볼을 실패시킵니다.
    pub fn compute_timeframe(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> FeatureResult<IndicatorSet> {
        if candles.len() < MIN_CANDLES {
            self.observer
                .timeframe_skipped(symbol, timeframe, candles.len(), MIN_CANDLES);
            return Ok(IndicatorSet::default());
        }

        let series = extract_series(candles)?;
        let closes = &series.closes;
        let highs = &series.highs;
        let lows = &series.lows;
        let volumes = &series.volumes;

        let close = closes[closes.len() - 1];

        let ema_20 = trend::ema(closes, EMA_SHORT_PERIOD);
        let ema_50 = trend::ema(closes, EMA_LONG_PERIOD);

        let volume_sma_14 = volume::sma(volumes, VOLUME_SMA_PERIOD);

        // 베이스 감지는 일봉 전용. 4시간봉에서는 항상 미정의
        let base_signal = match timeframe {
            Timeframe::D1 => structure::base_stability(closes, lows, BASE_LOOKBACK),
            Timeframe::H4 => None,
        };

        Ok(IndicatorSet {
            close: Some(close),
            high: Some(highs[highs.len() - 1]),
            low: Some(lows[lows.len() - 1]),
            volume: Some(volumes[volumes.len() - 1]),
            r_1: returns::return_pct(closes, 1),
            r_3: returns::return_pct(closes, 3),
            r_7: returns::return_pct(closes, 7),
            ema_20,
            ema_50,
            dist_ema20_pct: ema_20.and_then(|ema| trend::dist_pct(close, ema)),
            dist_ema50_pct: ema_50.and_then(|ema| trend::dist_pct(close, ema)),
            atr_pct: volatility::atr_pct(highs, lows, closes, ATR_PERIOD),
            volume_sma_14,
            volume_spike: volume::volume_spike(volumes, volume_sma_14),
            hh_20: structure::higher_high(highs, STRUCTURE_LOOKBACK),
            hl_20: structure::higher_low(lows, STRUCTURE_LOOKBACK),
            breakout_dist_20: structure::breakout_distance(closes, highs, BREAKOUT_LOOKBACK_SHORT),
            breakout_dist_30: structure::breakout_distance(closes, highs, BREAKOUT_LOOKBACK_LONG),
            drawdown_from_ath: structure::drawdown_from_ath(closes),
            base_signal,
        })
    }
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 검증된 f64 OHLCV 시계열.
struct OhlcvSeries {
    closes: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    volumes: Vec<f64>,
}

/// 캔들 시퀀스를 검증하고 f64 시계열로 변환합니다.
fn extract_series(candles: &[Candle]) -> FeatureResult<OhlcvSeries> {
    let mut closes = Vec::with_capacity(candles.len());
    let mut highs = Vec::with_capacity(candles.len());
    let mut lows = Vec::with_capacity(candles.len());
    let mut volumes = Vec::with_capacity(candles.len());

    let mut prev_open_time = None;

    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_well_formed() {
            return Err(FeatureError::MalformedCandle {
                index,
                reason: "가격/거래량 필드가 유효하지 않습니다".to_string(),
            });
        }

        if let Some(prev) = prev_open_time {
            if candle.open_time <= prev {
                return Err(FeatureError::MalformedCandle {
                    index,
                    reason: "open_time이 오름차순이 아닙니다".to_string(),
                });
            }
        }
        prev_open_time = Some(candle.open_time);

        let (high, low, close, vol) = match (
            to_finite_f64(candle.high),
            to_finite_f64(candle.low),
            to_finite_f64(candle.close),
            to_finite_f64(candle.volume),
        ) {
            (Some(h), Some(l), Some(c), Some(v)) => (h, l, c, v),
            _ => {
                return Err(FeatureError::MalformedCandle {
                    index,
                    reason: "유한한 수치로 변환할 수 없습니다".to_string(),
                })
            }
        };

        highs.push(high);
        lows.push(low);
        closes.push(close);
        volumes.push(vol);
    }

    Ok(OhlcvSeries {
        closes,
        highs,
        lows,
        volumes,
    })
}
