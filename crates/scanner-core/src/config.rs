//! 설정 관리.
//!
//! 스캐너의 모든 설정을 명시적으로 열거된 구조체로 정의합니다.
//! 임계값/가중치는 로드 시점에 한 번 검증되며, 채점 시점의 동적 조회는
//! 없습니다.

use crate::error::{ScannerError, ScannerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 가중치 합 검증 허용 오차.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// 파이프라인 실행 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// 전체 파이프라인 (기본)
    #[default]
    Standard,
    /// 캐시 우선 빠른 실행
    Fast,
    /// 네트워크 없이 스냅샷 기반 실행
    Offline,
    /// 백테스트 재생
    Backtest,
}

/// 일반 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 실행 모드
    pub run_mode: RunMode,
    /// 기준 타임존
    pub timezone: String,
    /// 쇼트리스트 크기
    pub shortlist_size: usize,
    /// 일봉 조회 기간 (일)
    pub lookback_days_1d: u32,
    /// 4시간봉 조회 기간 (일)
    pub lookback_days_4h: u32,
    /// 일봉 최소 이력 (일)
    pub min_history_days_1d: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Standard,
            timezone: "UTC".to_string(),
            shortlist_size: 100,
            lookback_days_1d: 120,
            lookback_days_4h: 30,
            min_history_days_1d: 60,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 유니버스 필터 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// 시가총액 하한 (USD)
    pub market_cap_min: f64,
    /// 시가총액 상한 (USD)
    pub market_cap_max: f64,
    /// 24시간 거래대금 하한 (USDT)
    pub min_quote_volume_24h: f64,
    /// 기준 자산 제외 패턴 (스테이블코인, 래핑/레버리지 토큰)
    pub exclusion_patterns: Vec<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            market_cap_min: 100_000_000.0,
            market_cap_max: 3_000_000_000.0,
            min_quote_volume_24h: 1_000_000.0,
            exclusion_patterns: [
                "USD", "USDT", "USDC", "BUSD", "DAI", "TUSD", // 스테이블코인
                "WBTC", "WETH", "WBNB", // 래핑 토큰
                "UP", "DOWN", "BULL", "BEAR", // 레버리지 토큰
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

// ================================================================================================
// 아키타입별 채점 설정
// ================================================================================================

/// 돌파 스코어러 컴포넌트 가중치 (합계 = 1.0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutWeights {
    /// 돌파 거리
    pub breakout: f64,
    /// 거래량 확인
    pub volume: f64,
    /// 추세 맥락
    pub trend: f64,
    /// 모멘텀
    pub momentum: f64,
}

impl Default for BreakoutWeights {
    fn default() -> Self {
        Self {
            breakout: 0.35,
            volume: 0.30,
            trend: 0.20,
            momentum: 0.15,
        }
    }
}

impl BreakoutWeights {
    fn values(&self) -> [f64; 4] {
        [self.breakout, self.volume, self.trend, self.momentum]
    }
}

/// 돌파 스코어러 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutConfig {
    /// 유효 돌파 최소 거리 (%)
    pub min_breakout_pct: f64,
    /// 이상적 돌파 거리 (%)
    pub ideal_breakout_pct: f64,
    /// 과확장 기준 거리 (%), 초과 시 페널티
    pub max_breakout_pct: f64,
    /// 최소 거래량 스파이크 배수
    pub min_volume_spike: f64,
    /// 이상적 거래량 스파이크 배수
    pub ideal_volume_spike: f64,
    /// 컴포넌트 가중치
    pub weights: BreakoutWeights,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            min_breakout_pct: 2.0,
            ideal_breakout_pct: 5.0,
            max_breakout_pct: 20.0,
            min_volume_spike: 1.5,
            ideal_volume_spike: 2.5,
            weights: BreakoutWeights::default(),
        }
    }
}

impl BreakoutConfig {
    /// 설정 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        validate_weights("breakout", &self.weights.values())?;
        if self.min_volume_spike >= self.ideal_volume_spike {
            return Err(format!(
                "breakout: min_volume_spike({})는 ideal_volume_spike({})보다 작아야 합니다",
                self.min_volume_spike, self.ideal_volume_spike
            ));
        }
        if self.max_breakout_pct <= 0.0 {
            return Err("breakout: max_breakout_pct는 양수여야 합니다".to_string());
        }
        Ok(())
    }
}

/// 눌림목 스코어러 컴포넌트 가중치 (합계 = 1.0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PullbackWeights {
    /// 추세 강도
    pub trend: f64,
    /// 눌림 깊이
    pub pullback: f64,
    /// 반등 강도
    pub rebound: f64,
    /// 거래량 패턴
    pub volume: f64,
}

impl Default for PullbackWeights {
    fn default() -> Self {
        Self {
            trend: 0.30,
            pullback: 0.25,
            rebound: 0.25,
            volume: 0.20,
        }
    }
}

impl PullbackWeights {
    fn values(&self) -> [f64; 4] {
        [self.trend, self.pullback, self.rebound, self.volume]
    }
}

/// 눌림목 스코어러 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PullbackConfig {
    /// 추세 인정 최소 EMA50 이격도 (%)
    pub min_trend_strength: f64,
    /// 이상적 눌림 깊이 (%)
    pub ideal_pullback_depth: f64,
    /// 최대 눌림 깊이 (%)
    pub max_pullback_depth: f64,
    /// 최소 반등률 (3일, %)
    pub min_rebound: f64,
    /// 최소 거래량 스파이크 배수
    pub min_volume_spike: f64,
    /// 컴포넌트 가중치
    pub weights: PullbackWeights,
}

impl Default for PullbackConfig {
    fn default() -> Self {
        Self {
            min_trend_strength: 5.0,
            ideal_pullback_depth: 5.0,
            max_pullback_depth: 15.0,
            min_rebound: 3.0,
            min_volume_spike: 1.3,
            weights: PullbackWeights::default(),
        }
    }
}

impl PullbackConfig {
    /// 설정 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        validate_weights("pullback", &self.weights.values())?;
        if self.ideal_pullback_depth >= self.max_pullback_depth {
            return Err(format!(
                "pullback: ideal_pullback_depth({})는 max_pullback_depth({})보다 작아야 합니다",
                self.ideal_pullback_depth, self.max_pullback_depth
            ));
        }
        if self.min_volume_spike <= 0.0 {
            return Err("pullback: min_volume_spike는 양수여야 합니다".to_string());
        }
        Ok(())
    }
}

/// 반전 스코어러 컴포넌트 가중치 (합계 = 1.0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversalWeights {
    /// 낙폭 맥락
    pub drawdown: f64,
    /// 베이스 품질
    pub base: f64,
    /// 회복 강도
    pub reclaim: f64,
    /// 거래량 확인
    pub volume: f64,
}

impl Default for ReversalWeights {
    fn default() -> Self {
        Self {
            drawdown: 0.30,
            base: 0.25,
            reclaim: 0.25,
            volume: 0.20,
        }
    }
}

impl ReversalWeights {
    fn values(&self) -> [f64; 4] {
        [self.drawdown, self.base, self.reclaim, self.volume]
    }
}

/// 반전 스코어러 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReversalConfig {
    /// 최소 낙폭 (%)
    pub min_drawdown_pct: f64,
    /// 이상적 낙폭 하한 (%)
    pub ideal_drawdown_min: f64,
    /// 이상적 낙폭 상한 (%)
    pub ideal_drawdown_max: f64,
    /// 최소 베이스 기간 (일)
    pub min_base_days: u32,
    /// 최소 거래량 스파이크 배수
    pub min_volume_spike: f64,
    /// 과확장 기준 EMA50 이격도 (%)
    pub overextension_threshold: f64,
    /// 컴포넌트 가중치
    pub weights: ReversalWeights,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self {
            min_drawdown_pct: 40.0,
            ideal_drawdown_min: 50.0,
            ideal_drawdown_max: 80.0,
            min_base_days: 10,
            min_volume_spike: 1.5,
            overextension_threshold: 15.0,
            weights: ReversalWeights::default(),
        }
    }
}

impl ReversalConfig {
    /// 설정 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), String> {
        validate_weights("reversal", &self.weights.values())?;
        if self.min_drawdown_pct > self.ideal_drawdown_min {
            return Err(format!(
                "reversal: min_drawdown_pct({})는 ideal_drawdown_min({}) 이하여야 합니다",
                self.min_drawdown_pct, self.ideal_drawdown_min
            ));
        }
        if self.ideal_drawdown_min >= self.ideal_drawdown_max {
            return Err(format!(
                "reversal: ideal_drawdown_min({})는 ideal_drawdown_max({})보다 작아야 합니다",
                self.ideal_drawdown_min, self.ideal_drawdown_max
            ));
        }
        Ok(())
    }
}

/// 아키타입별 채점 설정.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// 돌파 설정
    pub breakout: BreakoutConfig,
    /// 눌림목 설정
    pub pullback: PullbackConfig,
    /// 반전 설정
    pub reversal: ReversalConfig,
}

/// 스캐너 전체 설정.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 일반 설정
    pub general: GeneralConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 유니버스 필터 설정
    pub universe: UniverseConfig,
    /// 채점 설정
    pub scoring: ScoringConfig,
}

impl ScannerConfig {
    /// 설정 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 우선순위: 기본값 < 파일 < `SCANNER_` 접두사 환경 변수.
    /// 로드 직후 전체 검증을 수행하며, 문제가 있으면 실패합니다.
    pub fn load(path: impl AsRef<Path>) -> ScannerResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("SCANNER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ScannerError::Config(e.to_string()))?;

        let cfg: ScannerConfig = settings
            .try_deserialize()
            .map_err(|e| ScannerError::Config(e.to_string()))?;

        let problems = cfg.validate();
        if !problems.is_empty() {
            return Err(ScannerError::Config(problems.join("; ")));
        }

        Ok(cfg)
    }

    /// 설정 전체를 검증하고 발견된 문제 목록을 반환합니다.
    ///
    /// 빈 목록이면 유효한 설정입니다.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.general.shortlist_size == 0 {
            problems.push("general: shortlist_size는 0보다 커야 합니다".to_string());
        }

        if self.universe.market_cap_min >= self.universe.market_cap_max {
            problems.push(format!(
                "universe: market_cap_min({})은 market_cap_max({})보다 작아야 합니다",
                self.universe.market_cap_min, self.universe.market_cap_max
            ));
        }

        if let Err(e) = self.scoring.breakout.validate() {
            problems.push(e);
        }
        if let Err(e) = self.scoring.pullback.validate() {
            problems.push(e);
        }
        if let Err(e) = self.scoring.reversal.validate() {
            problems.push(e);
        }

        problems
    }
}

/// 가중치가 모두 양수이고 합이 1.0인지 검증합니다.
fn validate_weights(name: &str, weights: &[f64]) -> Result<(), String> {
    if weights.iter().any(|w| *w <= 0.0) {
        return Err(format!("{}: 모든 가중치는 양수여야 합니다", name));
    }

    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(format!("{}: 가중치 합이 1.0이 아닙니다 (합: {})", name, sum));
    }

    Ok(())
}
