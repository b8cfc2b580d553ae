//! 셋업 스코어러 공통 계약.

use scanner_core::{IndicatorSet, Penalty, ScoreResult, SetupKind, SymbolFeatures};
use thiserror::Error;

/// 저유동성 페널티 기준 (24시간 거래대금, USDT).
pub const LOW_LIQUIDITY_FLOOR: f64 = 500_000.0;

/// 저유동성 페널티 계수.
pub const LOW_LIQUIDITY_FACTOR: f64 = 0.8;

/// 채점 오류.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// 잘못된 채점 설정
    #[error("채점 설정 오류: {0}")]
    InvalidConfig(String),
}

/// 채점 결과 타입.
pub type ScoringResult<T> = Result<T, ScoringError>;

/// 셋업 스코어러 계약.
///
/// 구현체는 순수 함수여야 합니다: 같은 피처와 거래대금에 대해 항상
/// 같은 결과를 생성하며, I/O와 공유 상태가 없습니다.
pub trait SetupScorer: Send + Sync {
    /// 이 스코어러의 셋업 아키타입.
    fn kind(&self) -> SetupKind;

    /// 한 심볼을 채점합니다.
    ///
    /// 타임프레임이 없거나 지표가 미정의인 경우에도 에러 없이 해당
    /// 컴포넌트를 0점 처리합니다.
    fn score(&self, features: &SymbolFeatures, quote_volume_24h: f64) -> ScoreResult;
}

/// 일봉/4시간봉 거래량 스파이크 중 큰 값.
///
/// 둘 다 미정의면 미정의입니다.
pub(crate) fn max_volume_spike(d1: &IndicatorSet, h4: &IndicatorSet) -> Option<f64> {
    match (d1.volume_spike, h4.volume_spike) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// 페널티를 감지 순서대로 곱셈 적용합니다.
pub(crate) fn apply_penalties(raw_score: f64, penalties: &[Penalty]) -> f64 {
    penalties.iter().fold(raw_score, |score, p| score * p.factor)
}
