//! 쇼트리스트 선택 (저비용 패스).
//!
//! 필터링된 유니버스에서 고비용 패스(OHLCV 수집 + 피처 + 채점) 대상
//! 심볼을 선별합니다. 저비용 정보(24시간 거래대금)만 사용하며,
//! 결과 크기는 설정을 따릅니다.

use crate::filters::UniverseEntry;
use std::cmp::Ordering;

/// 쇼트리스트 선택기.
pub struct ShortlistSelector {
    size: usize,
}

impl ShortlistSelector {
    /// 목표 크기로 선택기를 생성합니다.
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// 24시간 거래대금 내림차순 상위 N개를 선택합니다.
    ///
    /// 안정 정렬이므로 동일 거래대금 심볼은 입력 순서를 유지합니다.
    pub fn select(&self, entries: &[UniverseEntry]) -> Vec<UniverseEntry> {
        let mut shortlist: Vec<UniverseEntry> = entries.to_vec();
        shortlist.sort_by(|a, b| {
            b.quote_volume_24h
                .partial_cmp(&a.quote_volume_24h)
                .unwrap_or(Ordering::Equal)
        });
        shortlist.truncate(self.size);

        tracing::info!(
            input = entries.len(),
            selected = shortlist.len(),
            "쇼트리스트 선택 완료"
        );

        shortlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(base: &str, volume: f64) -> UniverseEntry {
        let symbol = scanner_core::Symbol::new(base, "USDT");
        UniverseEntry::from_symbol(&symbol, volume, Some(500_000_000.0))
    }

    #[test]
    fn test_select_top_by_volume() {
        let selector = ShortlistSelector::new(2);
        let entries = vec![
            entry("AAA", 1_000_000.0),
            entry("BBB", 9_000_000.0),
            entry("CCC", 4_000_000.0),
        ];

        let shortlist = selector.select(&entries);

        let symbols: Vec<&str> = shortlist.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBBUSDT", "CCCUSDT"]);
    }

    #[test]
    fn test_select_fewer_than_size() {
        let selector = ShortlistSelector::new(10);
        let entries = vec![entry("AAA", 1_000_000.0)];

        assert_eq!(selector.select(&entries).len(), 1);
    }

    #[test]
    fn test_ties_retain_input_order() {
        let selector = ShortlistSelector::new(3);
        let entries = vec![
            entry("AAA", 2_000_000.0),
            entry("BBB", 2_000_000.0),
            entry("CCC", 2_000_000.0),
        ];

        let shortlist = selector.select(&entries);
        let symbols: Vec<&str> = shortlist.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAAUSDT", "BBBUSDT", "CCCUSDT"]);
    }
}
