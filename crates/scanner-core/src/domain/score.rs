//! 셋업 점수 결과 구조체.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 셋업 아키타입.
///
/// 세 개의 독립적인 분류기가 동일한 피처 데이터를 병렬로 채점합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupKind {
    /// 박스권 돌파
    Breakout,
    /// 추세 눌림목
    Pullback,
    /// 하락 추세 반전
    Reversal,
}

impl fmt::Display for SetupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupKind::Breakout => write!(f, "breakout"),
            SetupKind::Pullback => write!(f, "pullback"),
            SetupKind::Reversal => write!(f, "reversal"),
        }
    }
}

/// 점수에 곱해지는 페널티 항목.
///
/// 감지된 순서대로 보관되며, 같은 순서로 곱셈 적용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalty {
    /// 페널티 이름 (예: "overextension", "low_liquidity")
    pub name: String,
    /// 곱셈 계수 (0 < factor ≤ 1)
    pub factor: f64,
}

impl Penalty {
    /// 새 페널티를 생성합니다.
    pub fn new(name: impl Into<String>, factor: f64) -> Self {
        Self {
            name: name.into(),
            factor,
        }
    }
}

/// 단일 심볼의 셋업 점수 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// 최종 점수 (0~100에 페널티 곱 적용, 소수 둘째 자리 반올림)
    pub score: f64,
    /// 컴포넌트별 점수 (각 0~100)
    pub components: BTreeMap<String, f64>,
    /// 적용된 페널티 (감지 순서)
    pub penalties: Vec<Penalty>,
    /// 조건 플래그 태그
    pub flags: Vec<String>,
    /// 사람이 읽을 수 있는 근거 (랭킹 의미 없음, 설명 전용)
    pub reasons: Vec<String>,
}

impl ScoreResult {
    /// 지정한 플래그가 설정되어 있는지 확인합니다.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }
}

/// 랭킹 출력 레코드 (심볼 + 점수 결과).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSymbol {
    /// 심볼 식별자
    pub symbol: String,
    /// 최종 점수
    pub score: f64,
    /// 컴포넌트별 점수
    pub components: BTreeMap<String, f64>,
    /// 적용된 페널티
    pub penalties: Vec<Penalty>,
    /// 조건 플래그
    pub flags: Vec<String>,
    /// 근거
    pub reasons: Vec<String>,
}

impl ScoredSymbol {
    /// 점수 결과로부터 랭킹 레코드를 생성합니다.
    pub fn new(symbol: impl Into<String>, result: ScoreResult) -> Self {
        Self {
            symbol: symbol.into(),
            score: result.score,
            components: result.components,
            penalties: result.penalties,
            flags: result.flags,
            reasons: result.reasons,
        }
    }

    /// 지정한 플래그가 설정되어 있는지 확인합니다.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }
}
