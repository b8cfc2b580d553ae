//! 유니버스 필터링.
//!
//! 거래소 유니버스를 거래 가능한 미드캡 집합으로 줄입니다:
//! 1. 시가총액 필터 (기본 1억 ~ 30억 USD)
//! 2. 유동성 필터 (24시간 거래대금 하한)
//! 3. 제외 필터 (스테이블코인, 래핑/레버리지 토큰)

use scanner_core::{Symbol, UniverseConfig};
use serde::{Deserialize, Serialize};

/// 유니버스 항목.
///
/// 필터/쇼트리스트 단계에서 사용하는 저비용 심볼 정보입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseEntry {
    /// 거래쌍 문자열 (예: "BTCUSDT")
    pub symbol: String,
    /// 기준 자산 (예: "BTC")
    pub base: String,
    /// 24시간 거래대금 (USDT)
    pub quote_volume_24h: f64,
    /// 시가총액 (USD). 매핑 실패 시 없음
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl UniverseEntry {
    /// 심볼로부터 유니버스 항목을 생성합니다.
    pub fn from_symbol(symbol: &Symbol, quote_volume_24h: f64, market_cap: Option<f64>) -> Self {
        Self {
            symbol: symbol.to_pair_string(),
            base: symbol.base.clone(),
            quote_volume_24h,
            market_cap,
        }
    }
}

/// 필터 단계별 통계.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStats {
    /// 입력 심볼 수
    pub total_input: usize,
    /// 시가총액 필터 통과 수
    pub mcap_pass: usize,
    /// 유동성 필터 통과 수
    pub liquidity_pass: usize,
    /// 제외 필터 통과 수
    pub exclusion_pass: usize,
    /// 전체 파이프라인 통과 수
    pub final_pass: usize,
}

impl FilterStats {
    /// 최종 통과율 (%).
    pub fn filter_rate(&self) -> f64 {
        if self.total_input == 0 {
            return 0.0;
        }
        self.final_pass as f64 / self.total_input as f64 * 100.0
    }
}

/// 유니버스 필터.
pub struct UniverseFilters {
    config: UniverseConfig,
}

impl UniverseFilters {
    /// 설정으로 필터를 생성합니다.
    pub fn new(config: UniverseConfig) -> Self {
        tracing::info!(
            mcap_min = config.market_cap_min,
            mcap_max = config.market_cap_max,
            min_volume = config.min_quote_volume_24h,
            "유니버스 필터 초기화"
        );
        Self { config }
    }

    /// 모든 필터를 순서대로 적용합니다.
    pub fn apply_all(&self, entries: &[UniverseEntry]) -> Vec<UniverseEntry> {
        let original_count = entries.len();
        tracing::info!(symbols = original_count, "필터링 시작");

        let filtered = self.filter_mcap(entries);
        tracing::info!(symbols = filtered.len(), "시가총액 필터 통과");

        let filtered = self.filter_liquidity(&filtered);
        tracing::info!(symbols = filtered.len(), "유동성 필터 통과");

        let filtered = self.filter_exclusions(&filtered);
        tracing::info!(
            symbols = filtered.len(),
            excluded = original_count - filtered.len(),
            "최종 유니버스 확정"
        );

        filtered
    }

    /// 시가총액 범위 필터.
    ///
    /// 시가총액 정보가 없는 심볼은 탈락합니다.
    fn filter_mcap(&self, entries: &[UniverseEntry]) -> Vec<UniverseEntry> {
        entries
            .iter()
            .filter(|entry| {
                entry.market_cap.is_some_and(|mcap| {
                    mcap >= self.config.market_cap_min && mcap <= self.config.market_cap_max
                })
            })
            .cloned()
            .collect()
    }

    /// 24시간 거래대금 하한 필터.
    fn filter_liquidity(&self, entries: &[UniverseEntry]) -> Vec<UniverseEntry> {
        entries
            .iter()
            .filter(|entry| entry.quote_volume_24h >= self.config.min_quote_volume_24h)
            .cloned()
            .collect()
    }

    /// 제외 패턴 필터.
    ///
    /// 기준 자산에 제외 패턴이 포함된 심볼을 탈락시킵니다.
    fn filter_exclusions(&self, entries: &[UniverseEntry]) -> Vec<UniverseEntry> {
        entries
            .iter()
            .filter(|entry| {
                let base = entry.base.to_uppercase();
                !self
                    .config
                    .exclusion_patterns
                    .iter()
                    .any(|pattern| base.contains(pattern))
            })
            .cloned()
            .collect()
    }

    /// 각 필터의 통과 통계를 계산합니다.
    pub fn filter_stats(&self, entries: &[UniverseEntry]) -> FilterStats {
        FilterStats {
            total_input: entries.len(),
            mcap_pass: self.filter_mcap(entries).len(),
            liquidity_pass: self.filter_liquidity(entries).len(),
            exclusion_pass: self.filter_exclusions(entries).len(),
            final_pass: self.apply_all(entries).len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, base: &str, volume: f64, mcap: Option<f64>) -> UniverseEntry {
        UniverseEntry {
            symbol: symbol.to_string(),
            base: base.to_string(),
            quote_volume_24h: volume,
            market_cap: mcap,
        }
    }

    fn sample_universe() -> Vec<UniverseEntry> {
        vec![
            entry("GOODUSDT", "GOOD", 5_000_000.0, Some(500_000_000.0)),
            entry("TINYUSDT", "TINY", 5_000_000.0, Some(50_000_000.0)), // 시총 미달
            entry("MEGAUSDT", "MEGA", 5_000_000.0, Some(10_000_000_000.0)), // 시총 초과
            entry("THINUSDT", "THIN", 200_000.0, Some(500_000_000.0)), // 유동성 미달
            entry("USDCUSDT", "USDC", 50_000_000.0, Some(500_000_000.0)), // 스테이블코인
            entry("BTCUPUSDT", "BTCUP", 5_000_000.0, Some(500_000_000.0)), // 레버리지 토큰
            entry("NOCAPUSDT", "NOCAP", 5_000_000.0, None), // 시총 정보 없음
        ]
    }

    #[test]
    fn test_apply_all() {
        let filters = UniverseFilters::new(UniverseConfig::default());
        let filtered = filters.apply_all(&sample_universe());

        let symbols: Vec<&str> = filtered.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["GOODUSDT"]);
    }

    #[test]
    fn test_mcap_filter_drops_missing() {
        let filters = UniverseFilters::new(UniverseConfig::default());
        let universe = sample_universe();

        let filtered = filters.filter_mcap(&universe);
        assert!(!filtered.iter().any(|e| e.symbol == "NOCAPUSDT"));
        assert!(!filtered.iter().any(|e| e.symbol == "TINYUSDT"));
        assert!(!filtered.iter().any(|e| e.symbol == "MEGAUSDT"));
    }

    #[test]
    fn test_exclusion_patterns() {
        let filters = UniverseFilters::new(UniverseConfig::default());
        let universe = sample_universe();

        let filtered = filters.filter_exclusions(&universe);
        assert!(!filtered.iter().any(|e| e.symbol == "USDCUSDT"));
        assert!(!filtered.iter().any(|e| e.symbol == "BTCUPUSDT"));
        assert!(filtered.iter().any(|e| e.symbol == "GOODUSDT"));
    }

    #[test]
    fn test_filter_stats() {
        let filters = UniverseFilters::new(UniverseConfig::default());
        let stats = filters.filter_stats(&sample_universe());

        assert_eq!(stats.total_input, 7);
        assert_eq!(stats.mcap_pass, 4);
        assert_eq!(stats.liquidity_pass, 6);
        assert_eq!(stats.exclusion_pass, 5);
        assert_eq!(stats.final_pass, 1);
        assert!((stats.filter_rate() - 100.0 / 7.0).abs() < 1e-9);
    }
}
