//! 돌파 셋업 스코어러.
//!
//! 거래량이 동반된 박스권 돌파를 식별합니다.
//!
//! # 컴포넌트
//!
//! 1. **breakout** (0.35) - 최근 고점 대비 돌파 거리
//! 2. **volume** (0.30) - 돌파 시 거래량 스파이크
//! 3. **trend** (0.20) - 상승 추세 맥락 (EMA 위)
//! 4. **momentum** (0.15) - 최근 7일 가격 강도
//!
//! # 페널티
//!
//! - overextension: 돌파 거리 > max_breakout_pct → ×0.6
//! - low_liquidity: 24시간 거래대금 < 50만 → ×0.8

use crate::scorer::{
    apply_penalties, max_volume_spike, ScoringResult, SetupScorer, LOW_LIQUIDITY_FACTOR,
    LOW_LIQUIDITY_FLOOR,
};
use crate::ScoringError;
use scanner_core::{
    round2, BreakoutConfig, IndicatorSet, Penalty, ScoreResult, SetupKind, SymbolFeatures,
};
use std::collections::BTreeMap;

/// 과확장 페널티 계수.
const OVEREXTENSION_FACTOR: f64 = 0.6;

/// 돌파 셋업 스코어러.
pub struct BreakoutScorer {
    config: BreakoutConfig,
}

impl BreakoutScorer {
    /// 검증된 설정으로 스코어러를 생성합니다.
    pub fn new(config: BreakoutConfig) -> ScoringResult<Self> {
        config.validate().map_err(ScoringError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// 기본 설정으로 스코어러를 생성합니다.
    pub fn with_defaults() -> Self {
        Self {
            config: BreakoutConfig::default(),
        }
    }

    /// 돌파 거리 컴포넌트 (0~100).
    ///
    /// 돌파 거리(-5% … +3%)를 구간별로 점수화합니다:
    /// - -5% 이하: 돌파 압력 없음 (0)
    /// - -5 … 0%: 돌파 전 압축 (0→70 상승)
    /// - 0 … +1%: 돌파 확인 (70→100)
    /// - +1 … +3%: 약한 감쇠 (90→70)
    /// - 그 이상: 과확장 (60 고정)
    fn score_breakout(&self, d1: &IndicatorSet) -> f64 {
        let Some(dist) = d1.breakout_dist_20 else {
            return 0.0;
        };

        if dist <= -5.0 {
            return 0.0;
        }
        if dist < 0.0 {
            return 70.0 * (1.0 + dist / 5.0);
        }
        if dist <= 1.0 {
            return 70.0 + 30.0 * dist;
        }
        if dist <= 3.0 {
            return (90.0 - (dist - 1.0) * 10.0).max(70.0);
        }

        60.0
    }

    /// 거래량 확인 컴포넌트 (0~100).
    fn score_volume(&self, d1: &IndicatorSet, h4: &IndicatorSet) -> f64 {
        let Some(spike) = max_volume_spike(d1, h4) else {
            return 0.0;
        };

        if spike < self.config.min_volume_spike {
            return 0.0;
        }
        if spike >= self.config.ideal_volume_spike {
            return 100.0;
        }

        let ratio = (spike - self.config.min_volume_spike)
            / (self.config.ideal_volume_spike - self.config.min_volume_spike);
        ratio * 100.0
    }

    /// 추세 맥락 컴포넌트 (0~100).
    ///
    /// 이미 상승 추세(EMA 위)에 있으면 유리합니다.
    fn score_trend(&self, d1: &IndicatorSet) -> f64 {
        let mut score: f64 = 0.0;

        if let Some(dist) = d1.dist_ema20_pct {
            if dist > 0.0 {
                score += 40.0;
                if dist > 5.0 {
                    score += 10.0;
                }
            }
        }

        if let Some(dist) = d1.dist_ema50_pct {
            if dist > 0.0 {
                score += 40.0;
                if dist > 5.0 {
                    score += 10.0;
                }
            }
        }

        score.min(100.0)
    }

    /// 모멘텀 컴포넌트 (0~100).
    ///
    /// 7일 수익률 0~20% 구간을 선형 매핑합니다.
    fn score_momentum(&self, d1: &IndicatorSet) -> f64 {
        let Some(r7) = d1.r_7 else {
            return 0.0;
        };

        if r7 <= 0.0 {
            return 0.0;
        }
        if r7 >= 20.0 {
            return 100.0;
        }

        r7 / 20.0 * 100.0
    }

    /// 사람이 읽을 수 있는 근거를 생성합니다.
    fn build_reasons(
        &self,
        breakout_score: f64,
        volume_score: f64,
        trend_score: f64,
        d1: &IndicatorSet,
        h4: &IndicatorSet,
        flags: &[String],
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        let dist = d1.breakout_dist_20.unwrap_or(0.0);
        if breakout_score > 70.0 {
            reasons.push(format!("Strong breakout ({:.1}% above 20d high)", dist));
        } else if breakout_score > 30.0 {
            reasons.push(format!("Moderate breakout ({:.1}% above high)", dist));
        } else if dist > 0.0 {
            reasons.push(format!("Early breakout ({:.1}% above high)", dist));
        } else {
            reasons.push("No breakout (below recent high)".to_string());
        }

        let spike = max_volume_spike(d1, h4).unwrap_or(0.0);
        if volume_score > 70.0 {
            reasons.push(format!("Strong volume ({:.1}x average)", spike));
        } else if volume_score > 30.0 {
            reasons.push(format!("Moderate volume ({:.1}x)", spike));
        } else {
            reasons.push("Low volume (no confirmation)".to_string());
        }

        if trend_score > 70.0 {
            reasons.push("In uptrend (above EMAs)".to_string());
        } else if trend_score > 30.0 {
            reasons.push("Neutral trend".to_string());
        } else {
            reasons.push("In downtrend (below EMAs)".to_string());
        }

        if flags.iter().any(|f| f == "overextended") {
            reasons.push(format!("⚠️ Overextended ({:.1}% above high)", dist));
        }
        if flags.iter().any(|f| f == "low_liquidity") {
            reasons.push("⚠️ Low liquidity".to_string());
        }

        reasons
    }
}

impl SetupScorer for BreakoutScorer {
    fn kind(&self) -> SetupKind {
        SetupKind::Breakout
    }

    fn score(&self, features: &SymbolFeatures, quote_volume_24h: f64) -> ScoreResult {
        let empty = IndicatorSet::default();
        let d1 = features.d1().unwrap_or(&empty);
        let h4 = features.h4().unwrap_or(&empty);

        let breakout_score = self.score_breakout(d1);
        let volume_score = self.score_volume(d1, h4);
        let trend_score = self.score_trend(d1);
        let momentum_score = self.score_momentum(d1);

        let weights = &self.config.weights;
        let raw_score = breakout_score * weights.breakout
            + volume_score * weights.volume
            + trend_score * weights.trend
            + momentum_score * weights.momentum;

        // 페널티는 가중 점수가 아닌 원시 지표값에 대해 평가
        let mut penalties = Vec::new();
        let mut flags = Vec::new();

        if let Some(dist) = d1.breakout_dist_20 {
            if dist > self.config.max_breakout_pct {
                penalties.push(Penalty::new("overextension", OVEREXTENSION_FACTOR));
                flags.push("overextended".to_string());
            }
        }

        if quote_volume_24h < LOW_LIQUIDITY_FLOOR {
            penalties.push(Penalty::new("low_liquidity", LOW_LIQUIDITY_FACTOR));
            flags.push("low_liquidity".to_string());
        }

        let final_score = apply_penalties(raw_score, &penalties);

        let reasons =
            self.build_reasons(breakout_score, volume_score, trend_score, d1, h4, &flags);

        let mut components = BTreeMap::new();
        components.insert("breakout".to_string(), round2(breakout_score));
        components.insert("volume".to_string(), round2(volume_score));
        components.insert("trend".to_string(), round2(trend_score));
        components.insert("momentum".to_string(), round2(momentum_score));

        ScoreResult {
            score: round2(final_score),
            components,
            penalties,
            flags,
            reasons,
        }
    }
}
