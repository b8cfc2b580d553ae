//! 눌림목 셋업 스코어러.
//!
//! 되돌림 후 추세 지속(지지선 눌림목)을 식별합니다.
//!
//! # 컴포넌트
//!
//! 1. **trend** (0.30) - 확립된 상승 추세 (EMA50 위)
//! 2. **pullback** (0.25) - EMA20/50 지지선까지의 건강한 되돌림
//! 3. **rebound** (0.25) - 눌림 저점에서의 회복
//! 4. **volume** (0.20) - 반등 시 거래량 확대
//!
//! # 페널티
//!
//! - broken_trend: EMA50 아래 → ×0.5
//! - low_liquidity: 24시간 거래대금 < 50만 → ×0.8

use crate::scorer::{
    apply_penalties, max_volume_spike, ScoringResult, SetupScorer, LOW_LIQUIDITY_FACTOR,
    LOW_LIQUIDITY_FLOOR,
};
use crate::ScoringError;
use scanner_core::{
    round2, IndicatorSet, Penalty, PullbackConfig, ScoreResult, SetupKind, SymbolFeatures,
};
use std::collections::BTreeMap;

/// 추세 붕괴 페널티 계수.
const BROKEN_TREND_FACTOR: f64 = 0.5;

/// 눌림목 셋업 스코어러.
pub struct PullbackScorer {
    config: PullbackConfig,
}

impl PullbackScorer {
    /// 검증된 설정으로 스코어러를 생성합니다.
    pub fn new(config: PullbackConfig) -> ScoringResult<Self> {
        config.validate().map_err(ScoringError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// 기본 설정으로 스코어러를 생성합니다.
    pub fn with_defaults() -> Self {
        Self {
            config: PullbackConfig::default(),
        }
    }

    /// 추세 강도 컴포넌트 (0~100).
    ///
    /// EMA50 위에 있어야 하며, 이격도 크기에 따라 구간 점수를 주고
    /// 고점 갱신 시 보너스를 더합니다.
    fn score_trend(&self, d1: &IndicatorSet) -> f64 {
        let Some(dist_ema50) = d1.dist_ema50_pct else {
            return 0.0;
        };
        if dist_ema50 <= 0.0 {
            return 0.0;
        }

        let mut score: f64 = if dist_ema50 >= 15.0 {
            60.0
        } else if dist_ema50 >= 10.0 {
            50.0
        } else if dist_ema50 >= self.config.min_trend_strength {
            40.0
        } else {
            20.0
        };

        if d1.hh_20 {
            score += 40.0;
        }

        score.min(100.0)
    }

    /// 눌림 깊이 컴포넌트 (0~100).
    ///
    /// 이상적인 눌림은 EMA20/50 지지선 부근입니다.
    fn score_pullback(&self, d1: &IndicatorSet) -> f64 {
        let (Some(dist_ema20), Some(dist_ema50)) = (d1.dist_ema20_pct, d1.dist_ema50_pct) else {
            return 0.0;
        };

        // EMA20 ±2% 이내 (이상적 눌림 수준)
        if (-2.0..=2.0).contains(&dist_ema20) {
            return 100.0;
        }

        // EMA50 ±2% 이내 (깊은 눌림)
        if (-2.0..=2.0).contains(&dist_ema50) {
            return 80.0;
        }

        // 두 EMA 사이 (건강한 눌림)
        if dist_ema20 < 0.0 && dist_ema50 > 0.0 {
            return 60.0;
        }

        // 두 EMA 위 (아직 눌림 없음)
        if dist_ema20 > 5.0 {
            return 20.0;
        }

        // 두 EMA 아래 (너무 깊음)
        if dist_ema50 < -5.0 {
            return 10.0;
        }

        40.0
    }

    /// 반등 강도 컴포넌트 (0~100).
    ///
    /// 일봉과 4시간봉의 3기간 수익률 구간 점수 합산.
    fn score_rebound(&self, d1: &IndicatorSet, h4: &IndicatorSet) -> f64 {
        let mut score: f64 = 0.0;

        if let Some(r3) = d1.r_3 {
            if r3 >= 10.0 {
                score += 50.0;
            } else if r3 >= self.config.min_rebound {
                score += 30.0;
            } else if r3 > 0.0 {
                score += 10.0;
            }
        }

        if let Some(r3) = h4.r_3 {
            if r3 >= 5.0 {
                score += 50.0;
            } else if r3 >= 2.0 {
                score += 30.0;
            } else if r3 > 0.0 {
                score += 10.0;
            }
        }

        score.min(100.0)
    }

    /// 거래량 패턴 컴포넌트 (0~100).
    fn score_volume(&self, d1: &IndicatorSet, h4: &IndicatorSet) -> f64 {
        let Some(spike) = max_volume_spike(d1, h4) else {
            return 0.0;
        };

        if spike < self.config.min_volume_spike {
            return 0.0;
        }
        if spike >= 2.5 {
            return 100.0;
        }
        if spike >= 2.0 {
            return 80.0;
        }

        let ratio = (spike - self.config.min_volume_spike) / (2.0 - self.config.min_volume_spike);
        ratio * 70.0
    }

    /// 사람이 읽을 수 있는 근거를 생성합니다.
    fn build_reasons(
        &self,
        trend_score: f64,
        pullback_score: f64,
        rebound_score: f64,
        volume_score: f64,
        d1: &IndicatorSet,
        h4: &IndicatorSet,
        flags: &[String],
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        let dist_ema50 = d1.dist_ema50_pct.unwrap_or(0.0);
        if trend_score > 70.0 {
            reasons.push(format!("Strong uptrend ({:.1}% above EMA50)", dist_ema50));
        } else if trend_score > 30.0 {
            reasons.push(format!("Moderate uptrend ({:.1}% above EMA50)", dist_ema50));
        } else {
            reasons.push("Weak/no uptrend".to_string());
        }

        let dist_ema20 = d1.dist_ema20_pct.unwrap_or(0.0);
        if pullback_score > 70.0 {
            reasons.push(format!("At support level ({:.1}% from EMA20)", dist_ema20));
        } else if pullback_score > 40.0 {
            reasons.push("Healthy pullback depth".to_string());
        } else {
            reasons.push("No clear pullback".to_string());
        }

        let r3 = d1.r_3.unwrap_or(0.0);
        if rebound_score > 60.0 {
            reasons.push(format!("Strong rebound ({:.1}% in 3d)", r3));
        } else if rebound_score > 30.0 {
            reasons.push("Moderate rebound".to_string());
        } else {
            reasons.push("No rebound yet".to_string());
        }

        let spike = max_volume_spike(d1, h4).unwrap_or(0.0);
        if volume_score > 60.0 {
            reasons.push(format!("Strong volume ({:.1}x)", spike));
        } else if volume_score > 30.0 {
            reasons.push(format!("Moderate volume ({:.1}x)", spike));
        }

        if flags.iter().any(|f| f == "broken_trend") {
            reasons.push("⚠️ Below EMA50 (trend broken)".to_string());
        }
        if flags.iter().any(|f| f == "low_liquidity") {
            reasons.push("⚠️ Low liquidity".to_string());
        }

        reasons
    }
}

impl SetupScorer for PullbackScorer {
    fn kind(&self) -> SetupKind {
        SetupKind::Pullback
    }

    fn score(&self, features: &SymbolFeatures, quote_volume_24h: f64) -> ScoreResult {
        let empty = IndicatorSet::default();
        let d1 = features.d1().unwrap_or(&empty);
        let h4 = features.h4().unwrap_or(&empty);

        let trend_score = self.score_trend(d1);
        let pullback_score = self.score_pullback(d1);
        let rebound_score = self.score_rebound(d1, h4);
        let volume_score = self.score_volume(d1, h4);

        let weights = &self.config.weights;
        let raw_score = trend_score * weights.trend
            + pullback_score * weights.pullback
            + rebound_score * weights.rebound
            + volume_score * weights.volume;

        let mut penalties = Vec::new();
        let mut flags = Vec::new();

        if let Some(dist_ema50) = d1.dist_ema50_pct {
            if dist_ema50 < 0.0 {
                penalties.push(Penalty::new("broken_trend", BROKEN_TREND_FACTOR));
                flags.push("broken_trend".to_string());
            }
        }

        if quote_volume_24h < LOW_LIQUIDITY_FLOOR {
            penalties.push(Penalty::new("low_liquidity", LOW_LIQUIDITY_FACTOR));
            flags.push("low_liquidity".to_string());
        }

        let final_score = apply_penalties(raw_score, &penalties);

        let reasons = self.build_reasons(
            trend_score,
            pullback_score,
            rebound_score,
            volume_score,
            d1,
            h4,
            &flags,
        );

        let mut components = BTreeMap::new();
        components.insert("trend".to_string(), round2(trend_score));
        components.insert("pullback".to_string(), round2(pullback_score));
        components.insert("rebound".to_string(), round2(rebound_score));
        components.insert("volume".to_string(), round2(volume_score));

        ScoreResult {
            score: round2(final_score),
            components,
            penalties,
            flags,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner_core::{FeatureMeta, Timeframe};

    fn features_with(d1: IndicatorSet, h4: IndicatorSet) -> SymbolFeatures {
        let mut timeframes = BTreeMap::new();
        timeframes.insert(Timeframe::D1, d1);
        timeframes.insert(Timeframe::H4, h4);
        SymbolFeatures {
            timeframes,
            meta: FeatureMeta {
                symbol: "TESTUSDT".to_string(),
                last_update: None,
            },
        }
    }

    /// 이상적 눌림목: EMA20 부근 + 강한 추세 + 반등 + 거래량.
    fn perfect_pullback() -> SymbolFeatures {
        let d1 = IndicatorSet {
            close: Some(1.0),
            dist_ema20_pct: Some(1.0),
            dist_ema50_pct: Some(10.0),
            hh_20: true,
            r_3: Some(8.0),
            volume_spike: Some(2.2),
            ..Default::default()
        };
        let h4 = IndicatorSet {
            r_3: Some(4.0),
            volume_spike: Some(2.5),
            ..Default::default()
        };
        features_with(d1, h4)
    }

    #[test]
    fn test_perfect_pullback_scores_high() {
        let scorer = PullbackScorer::with_defaults();
        let result = scorer.score(&perfect_pullback(), 2_000_000.0);

        // trend: 50 + 40 = 90, pullback: 100, rebound: 30 + 30 = 60, volume: 100
        assert_eq!(result.components["trend"], 90.0);
        assert_eq!(result.components["pullback"], 100.0);
        assert_eq!(result.components["rebound"], 60.0);
        assert_eq!(result.components["volume"], 100.0);
        assert!(result.penalties.is_empty());

        // 90×0.30 + 100×0.25 + 60×0.25 + 100×0.20 = 87
        assert!((result.score - 87.0).abs() < 1e-9);
    }

    #[test]
    fn test_broken_trend_penalty() {
        let scorer = PullbackScorer::with_defaults();

        let d1 = IndicatorSet {
            close: Some(1.0),
            dist_ema20_pct: Some(-5.0),
            dist_ema50_pct: Some(-3.0),
            hh_20: false,
            r_3: Some(2.0),
            volume_spike: Some(1.5),
            ..Default::default()
        };
        let h4 = IndicatorSet {
            r_3: Some(1.0),
            volume_spike: Some(1.4),
            ..Default::default()
        };

        let result = scorer.score(&features_with(d1, h4), 800_000.0);

        assert!(result.has_flag("broken_trend"));
        assert_eq!(result.penalties[0].name, "broken_trend");
        assert_eq!(result.penalties[0].factor, 0.5);
        // EMA50 아래이므로 추세 컴포넌트는 0
        assert_eq!(result.components["trend"], 0.0);
    }

    #[test]
    fn test_trend_zero_at_ema50() {
        let scorer = PullbackScorer::with_defaults();

        // 정확히 EMA50 위치 (이격도 0)는 추세로 인정하지 않음
        let d1 = IndicatorSet {
            dist_ema50_pct: Some(0.0),
            ..Default::default()
        };
        assert_eq!(scorer.score_trend(&d1), 0.0);

        // 미정의도 0
        assert_eq!(scorer.score_trend(&IndicatorSet::default()), 0.0);
    }

    #[test]
    fn test_pullback_band_classification() {
        let scorer = PullbackScorer::with_defaults();

        let at = |d20: f64, d50: f64| {
            let d1 = IndicatorSet {
                dist_ema20_pct: Some(d20),
                dist_ema50_pct: Some(d50),
                ..Default::default()
            };
            scorer.score_pullback(&d1)
        };

        assert_eq!(at(1.0, 10.0), 100.0); // EMA20 부근
        assert_eq!(at(6.0, 1.5), 80.0); // EMA50 부근
        assert_eq!(at(-3.0, 4.0), 60.0); // EMA 사이
        assert_eq!(at(15.0, 20.0), 20.0); // 눌림 없음
        assert_eq!(at(-8.0, -6.0), 10.0); // 너무 깊음
        assert_eq!(at(3.0, 8.0), 40.0); // 그 외
    }

    #[test]
    fn test_undefined_emas_pullback_zero() {
        let scorer = PullbackScorer::with_defaults();
        assert_eq!(scorer.score_pullback(&IndicatorSet::default()), 0.0);
    }

    #[test]
    fn test_volume_bands() {
        let scorer = PullbackScorer::with_defaults();

        let with_spike = |spike: f64| {
            let d1 = IndicatorSet {
                volume_spike: Some(spike),
                ..Default::default()
            };
            scorer.score_volume(&d1, &IndicatorSet::default())
        };

        assert_eq!(with_spike(1.0), 0.0);
        assert_eq!(with_spike(2.6), 100.0);
        assert_eq!(with_spike(2.1), 80.0);
        // 1.3~2.0 선형: (1.65 - 1.3) / 0.7 × 70 = 35
        assert!((with_spike(1.65) - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_liquidity_penalty_exact() {
        let scorer = PullbackScorer::with_defaults();
        let features = perfect_pullback();

        let liquid = scorer.score(&features, 2_000_000.0);
        let illiquid = scorer.score(&features, 100_000.0);

        assert!(illiquid.has_flag("low_liquidity"));
        assert!((illiquid.score - round2(liquid.score * 0.8)).abs() < 0.01);
    }
}
