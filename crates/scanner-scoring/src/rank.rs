//! 배치 채점 및 랭킹 드라이버.
//!
//! 피처 배치 전체를 한 스코어러로 채점하여 점수 내림차순 목록을
//! 생성합니다. 정렬은 안정 정렬이며, 동점 심볼은 입력 순회 순서를
//! 유지합니다. 스냅샷은 이 순서에 의존합니다.

use crate::scorer::SetupScorer;
use scanner_core::{ScanObserver, ScanStage, ScoredSymbol, SetupKind, SymbolFailure, SymbolFeatures};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// 한 아키타입의 랭킹 결과.
#[derive(Debug)]
pub struct RankedSetups {
    /// 셋업 아키타입
    pub kind: SetupKind,
    /// 점수 내림차순 레코드
    pub entries: Vec<ScoredSymbol>,
    /// 제외된 심볼과 사유
    pub failures: Vec<SymbolFailure>,
}

/// 전체 심볼을 채점하고 랭킹 목록을 생성합니다.
///
/// 거래대금 정보가 없는 심볼은 0으로 처리합니다 (저유동성 페널티
/// 대상). 심볼 하나의 채점 실패는 관찰자에 보고되고 해당 아키타입의
/// 출력에서만 제외되며, 나머지 심볼은 계속 처리됩니다.
pub fn rank_all(
    scorer: &dyn SetupScorer,
    features: &BTreeMap<String, SymbolFeatures>,
    volumes: &BTreeMap<String, f64>,
    observer: &dyn ScanObserver,
) -> RankedSetups {
    let kind = scorer.kind();
    tracing::info!(kind = %kind, symbols = features.len(), "셋업 채점 시작");

    let mut entries = Vec::with_capacity(features.len());
    let mut failures = Vec::new();

    for (symbol, symbol_features) in features {
        let quote_volume = volumes.get(symbol).copied().unwrap_or(0.0);
        let result = scorer.score(symbol_features, quote_volume);

        if result.score.is_finite() {
            entries.push(ScoredSymbol::new(symbol.clone(), result));
        } else {
            let reason = "점수가 유한한 값이 아닙니다".to_string();
            observer.symbol_failed(ScanStage::Scoring(kind), symbol, &reason);
            failures.push(SymbolFailure {
                symbol: symbol.clone(),
                reason,
            });
        }
    }

    // 점수 내림차순 안정 정렬. 동점은 입력 순서 유지
    entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    observer.batch_completed(ScanStage::Scoring(kind), entries.len(), failures.len());

    RankedSetups {
        kind,
        entries,
        failures,
    }
}
