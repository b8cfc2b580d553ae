//! 반전 셋업 스코어러.
//!
//! 하락 추세 → 베이스 → 회복 셋업을 식별합니다.
//!
//! # 컴포넌트
//!
//! 1. **drawdown** (0.30) - ATH 대비 충분히 깊은 낙폭
//! 2. **base** (0.25) - 신저점 없는 횡보 조정
//! 3. **reclaim** (0.25) - 모멘텀을 동반한 EMA 회복
//! 4. **volume** (0.20) - 회복 시 거래량 확대
//!
//! # 페널티
//!
//! - overextension: EMA50 이격도 > overextension_threshold → ×0.7
//! - low_liquidity: 24시간 거래대금 < 50만 → ×0.8

use crate::scorer::{
    apply_penalties, max_volume_spike, ScoringResult, SetupScorer, LOW_LIQUIDITY_FACTOR,
    LOW_LIQUIDITY_FLOOR,
};
use crate::ScoringError;
use scanner_core::{
    round2, IndicatorSet, Penalty, ReversalConfig, ScoreResult, SetupKind, SymbolFeatures,
};
use std::collections::BTreeMap;

/// 과확장 페널티 계수.
const OVEREXTENSION_FACTOR: f64 = 0.7;

/// 베이스 인정 기준 안정성 점수.
///
/// 연속 베이스 신호(0~100)에서 85 초과는 "신저점 없음 + 범위 < 15%"와
/// 동치입니다 (신저점이 있으면 신호가 절반으로 깎여 50 이하가 되므로
/// 이 기준을 넘을 수 없습니다).
const BASE_DETECTION_THRESHOLD: f64 = 85.0;

/// 낙폭 초과분 20%p당 최대 감점 비율.
const EXCESS_DRAWDOWN_PENALTY_CAP: f64 = 0.5;

/// 반전 셋업 스코어러.
pub struct ReversalScorer {
    config: ReversalConfig,
}

impl ReversalScorer {
    /// 검증된 설정으로 스코어러를 생성합니다.
    pub fn new(config: ReversalConfig) -> ScoringResult<Self> {
        config.validate().map_err(ScoringError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// 기본 설정으로 스코어러를 생성합니다.
    pub fn with_defaults() -> Self {
        Self {
            config: ReversalConfig::default(),
        }
    }

    /// 낙폭 맥락 컴포넌트 (0~100).
    ///
    /// 이상적: ATH 대비 50~80% 낙폭. 이상 구간 아래는 선형 상승,
    /// 위는 초과분에 비례한 감점 (최대 50%).
    fn score_drawdown(&self, d1: &IndicatorSet) -> f64 {
        let Some(drawdown) = d1.drawdown_from_ath else {
            return 0.0;
        };
        if drawdown >= 0.0 {
            return 0.0;
        }

        let dd_pct = drawdown.abs();

        if dd_pct < self.config.min_drawdown_pct {
            return 0.0;
        }

        if dd_pct >= self.config.ideal_drawdown_min && dd_pct <= self.config.ideal_drawdown_max {
            return 100.0;
        }

        if dd_pct < self.config.ideal_drawdown_min {
            let ratio = (dd_pct - self.config.min_drawdown_pct)
                / (self.config.ideal_drawdown_min - self.config.min_drawdown_pct);
            return 50.0 + ratio * 50.0;
        }

        // 이상 구간 초과: 체감 감점
        let excess = dd_pct - self.config.ideal_drawdown_max;
        let penalty = (excess / 20.0).min(EXCESS_DRAWDOWN_PENALTY_CAP);
        100.0 * (1.0 - penalty)
    }

    /// 베이스 품질 컴포넌트 (0~100).
    ///
    /// 베이스가 감지되면 ATR% 구간으로 품질을 매깁니다:
    /// 타이트한 베이스(<5%)일수록 높은 점수.
    fn score_base(&self, d1: &IndicatorSet) -> f64 {
        let Some(signal) = d1.base_signal else {
            return 0.0;
        };

        if signal <= BASE_DETECTION_THRESHOLD {
            return 0.0;
        }

        match d1.atr_pct {
            Some(atr) if atr < 5.0 => 100.0,
            Some(atr) if atr < 10.0 => 80.0,
            _ => 60.0,
        }
    }

    /// 회복 강도 컴포넌트 (0~100).
    ///
    /// EMA20/50 회복, 고점 갱신, 7일 모멘텀을 합산합니다.
    fn score_reclaim(&self, d1: &IndicatorSet) -> f64 {
        let mut score: f64 = 0.0;

        if let Some(dist) = d1.dist_ema20_pct {
            if dist > 0.0 {
                score += 30.0;
            }
        }
        if let Some(dist) = d1.dist_ema50_pct {
            if dist > 0.0 {
                score += 30.0;
            }
        }

        if d1.hh_20 {
            score += 20.0;
        }

        if let Some(r7) = d1.r_7 {
            if r7 > 10.0 {
                score += 20.0;
            } else if r7 > 5.0 {
                score += 10.0;
            }
        }

        score.min(100.0)
    }

    /// 거래량 확인 컴포넌트 (0~100).
    ///
    /// 최소 스파이크부터 3배까지 선형 매핑.
    fn score_volume(&self, d1: &IndicatorSet, h4: &IndicatorSet) -> f64 {
        let Some(spike) = max_volume_spike(d1, h4) else {
            return 0.0;
        };

        if spike < self.config.min_volume_spike {
            return 0.0;
        }
        if spike >= 3.0 {
            return 100.0;
        }

        let ratio = (spike - self.config.min_volume_spike) / (3.0 - self.config.min_volume_spike);
        ratio * 100.0
    }

    /// 사람이 읽을 수 있는 근거를 생성합니다.
    fn build_reasons(
        &self,
        drawdown_score: f64,
        base_score: f64,
        reclaim_score: f64,
        volume_score: f64,
        d1: &IndicatorSet,
        h4: &IndicatorSet,
        flags: &[String],
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        if let Some(drawdown) = d1.drawdown_from_ath {
            if drawdown < 0.0 {
                let dd_pct = drawdown.abs();
                if drawdown_score > 70.0 {
                    reasons.push(format!("Strong drawdown setup ({:.1}% from ATH)", dd_pct));
                } else if drawdown_score > 30.0 {
                    reasons.push(format!("Moderate drawdown ({:.1}% from ATH)", dd_pct));
                }
            }
        }

        if base_score > 60.0 {
            reasons.push("Clean base formation detected".to_string());
        } else if base_score == 0.0 {
            reasons.push("No base detected (still declining)".to_string());
        }

        let dist_ema50 = d1.dist_ema50_pct.unwrap_or(0.0);
        if reclaim_score > 60.0 {
            reasons.push(format!("Reclaimed EMAs ({:.1}% above EMA50)", dist_ema50));
        } else if reclaim_score > 30.0 {
            reasons.push("Partial reclaim in progress".to_string());
        } else {
            reasons.push("Below EMAs (no reclaim yet)".to_string());
        }

        let spike = max_volume_spike(d1, h4).unwrap_or(0.0);
        if volume_score > 60.0 {
            reasons.push(format!("Strong volume ({:.1}x average)", spike));
        } else if volume_score > 30.0 {
            reasons.push(format!("Moderate volume ({:.1}x)", spike));
        }

        if flags.iter().any(|f| f == "overextended") {
            reasons.push(format!("⚠️ Overextended ({:.1}% above EMA50)", dist_ema50));
        }
        if flags.iter().any(|f| f == "low_liquidity") {
            reasons.push("⚠️ Low liquidity".to_string());
        }

        reasons
    }
}

impl SetupScorer for ReversalScorer {
    fn kind(&self) -> SetupKind {
        SetupKind::Reversal
    }

    fn score(&self, features: &SymbolFeatures, quote_volume_24h: f64) -> ScoreResult {
        let empty = IndicatorSet::default();
        let d1 = features.d1().unwrap_or(&empty);
        let h4 = features.h4().unwrap_or(&empty);

        let drawdown_score = self.score_drawdown(d1);
        let base_score = self.score_base(d1);
        let reclaim_score = self.score_reclaim(d1);
        let volume_score = self.score_volume(d1, h4);

        let weights = &self.config.weights;
        let raw_score = drawdown_score * weights.drawdown
            + base_score * weights.base
            + reclaim_score * weights.reclaim
            + volume_score * weights.volume;

        let mut penalties = Vec::new();
        let mut flags = Vec::new();

        if let Some(dist_ema50) = d1.dist_ema50_pct {
            if dist_ema50 > self.config.overextension_threshold {
                penalties.push(Penalty::new("overextension", OVEREXTENSION_FACTOR));
                flags.push("overextended".to_string());
            }
        }

        if quote_volume_24h < LOW_LIQUIDITY_FLOOR {
            penalties.push(Penalty::new("low_liquidity", LOW_LIQUIDITY_FACTOR));
            flags.push("low_liquidity".to_string());
        }

        let final_score = apply_penalties(raw_score, &penalties);

        let reasons = self.build_reasons(
            drawdown_score,
            base_score,
            reclaim_score,
            volume_score,
            d1,
            h4,
            &flags,
        );

        let mut components = BTreeMap::new();
        components.insert("drawdown".to_string(), round2(drawdown_score));
        components.insert("base".to_string(), round2(base_score));
        components.insert("reclaim".to_string(), round2(reclaim_score));
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
