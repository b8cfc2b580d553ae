//! 지표 집합 및 심볼 피처 구조체.
//!
//! 피처 엔진의 출력 계약입니다. 모든 수치 지표는 유한한 f64 또는 명시적
//! 미정의 마커(None) 중 하나이며, 내부 수치 타입(Decimal)은 노출되지
//! 않습니다.

use crate::types::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 단일 타임프레임의 기술적 지표 집합.
///
/// None은 "미정의"를 의미합니다: 이력 부족 또는 정의되지 않는 연산
/// (예: 0으로 나누기). 미정의 값은 하류 스코어러에서 해당 컴포넌트
/// 0점으로 처리되어야 하며, 0이라는 입력값으로 취급해서는 안 됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    /// 최근 종가
    pub close: Option<f64>,
    /// 최근 고가
    pub high: Option<f64>,
    /// 최근 저가
    pub low: Option<f64>,
    /// 최근 거래량
    pub volume: Option<f64>,
    /// 1기간 수익률 (%)
    pub r_1: Option<f64>,
    /// 3기간 수익률 (%)
    pub r_3: Option<f64>,
    /// 7기간 수익률 (%)
    pub r_7: Option<f64>,
    /// 20기간 지수 이동평균
    pub ema_20: Option<f64>,
    /// 50기간 지수 이동평균
    pub ema_50: Option<f64>,
    /// EMA20 대비 종가 이격도 (%)
    pub dist_ema20_pct: Option<f64>,
    /// EMA50 대비 종가 이격도 (%)
    pub dist_ema50_pct: Option<f64>,
    /// ATR(14) / 종가 비율 (%)
    pub atr_pct: Option<f64>,
    /// 14기간 거래량 단순 이동평균
    pub volume_sma_14: Option<f64>,
    /// 최근 거래량 / 거래량 SMA 비율
    pub volume_spike: Option<f64>,
    /// 고점 갱신 여부 (최근 5봉 고가 > 직전 15봉 고가)
    pub hh_20: bool,
    /// 저점 상승 여부 (최근 5봉 저가 > 직전 15봉 저가)
    pub hl_20: bool,
    /// 20봉 최고가 대비 돌파 거리 (%)
    pub breakout_dist_20: Option<f64>,
    /// 30봉 최고가 대비 돌파 거리 (%)
    pub breakout_dist_30: Option<f64>,
    /// 역대 최고 종가 대비 낙폭 (%, 항상 ≤ 0)
    pub drawdown_from_ath: Option<f64>,
    /// 베이스(횡보) 안정성 점수 (0~100, 일봉 전용)
    pub base_signal: Option<f64>,
}

impl IndicatorSet {
    /// 지표가 전혀 계산되지 않은 빈 집합인지 확인합니다.
    ///
    /// 타임프레임의 캔들이 최소 개수 미만일 때 빈 집합이 생성됩니다.
    pub fn is_empty(&self) -> bool {
        self.close.is_none()
    }
}

/// 심볼 피처의 메타 정보.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMeta {
    /// 심볼 식별자 (거래쌍 문자열)
    pub symbol: String,
    /// 사용된 가장 최근 일봉 캔들의 시작 시간
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

/// 한 심볼의 타임프레임별 지표 집합.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFeatures {
    /// 타임프레임 → 지표 집합
    pub timeframes: BTreeMap<Timeframe, IndicatorSet>,
    /// 메타 정보
    pub meta: FeatureMeta,
}

impl SymbolFeatures {
    /// 지정한 타임프레임의 지표 집합을 반환합니다.
    pub fn timeframe(&self, timeframe: Timeframe) -> Option<&IndicatorSet> {
        self.timeframes.get(&timeframe)
    }

    /// 일봉 지표 집합을 반환합니다.
    pub fn d1(&self) -> Option<&IndicatorSet> {
        self.timeframe(Timeframe::D1)
    }

    /// 4시간봉 지표 집합을 반환합니다.
    pub fn h4(&self) -> Option<&IndicatorSet> {
        self.timeframe(Timeframe::H4)
    }
}

/// 배치 처리 중 격리된 심볼별 실패 기록.
///
/// 심볼 하나의 실패는 배치를 중단시키지 않고 이 레코드로 집계됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFailure {
    /// 실패한 심볼
    pub symbol: String,
    /// 실패 사유
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_set_empty() {
        let set = IndicatorSet::default();
        assert!(set.is_empty());

        let filled = IndicatorSet {
            close: Some(100.0),
            ..Default::default()
        };
        assert!(!filled.is_empty());
    }

    #[test]
    fn test_symbol_features_lookup() {
        let mut timeframes = BTreeMap::new();
        timeframes.insert(
            Timeframe::D1,
            IndicatorSet {
                close: Some(50000.0),
                ..Default::default()
            },
        );

        let features = SymbolFeatures {
            timeframes,
            meta: FeatureMeta {
                symbol: "BTCUSDT".to_string(),
                last_update: None,
            },
        };

        assert!(features.d1().is_some());
        assert!(features.h4().is_none());
    }

    #[test]
    fn test_symbol_features_serde_roundtrip() {
        let mut timeframes = BTreeMap::new();
        timeframes.insert(
            Timeframe::D1,
            IndicatorSet {
                close: Some(50000.0),
                r_7: Some(4.6),
                hh_20: true,
                ..Default::default()
            },
        );
        timeframes.insert(Timeframe::H4, IndicatorSet::default());

        let features = SymbolFeatures {
            timeframes,
            meta: FeatureMeta {
                symbol: "BTCUSDT".to_string(),
                last_update: None,
            },
        };

        let json = serde_json::to_string(&features).unwrap();
        // 타임프레임 태그가 맵 키로 나타남
        assert!(json.contains("\"1d\""));
        assert!(json.contains("\"4h\""));

        let parsed: SymbolFeatures = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, features);
    }
}
