//! 스냅샷 시스템.
//!
//! 백테스트와 재현성을 위한 일자별 결정적 스냅샷을 생성합니다.
//! 스냅샷은 특정 시점의 파이프라인 데이터 전체(유니버스, 피처,
//! 아키타입별 랭킹)를 담습니다.

use crate::filters::UniverseEntry;
use chrono::{DateTime, Utc};
use scanner_core::{ScannerError, ScannerResult, ScoredSymbol, SymbolFeatures};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// 스냅샷 형식 버전.
const SNAPSHOT_VERSION: &str = "1.0";

/// 스냅샷 메타 정보.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// 실행 일자 (YYYY-MM-DD)
    pub date: String,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 스냅샷 형식 버전
    pub version: String,
}

/// 파이프라인 단계별 개수.
///
/// 단계 간 개수 차이로 격리된 실패를 관측할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCounts {
    /// 전체 유니버스 수
    pub universe_count: usize,
    /// 필터 통과 수
    pub filtered_count: usize,
    /// 쇼트리스트 수
    pub shortlist_count: usize,
    /// 피처 계산 성공 수
    pub features_count: usize,
}

/// 파이프라인 데이터 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    /// 전체 유니버스
    pub universe: Vec<UniverseEntry>,
    /// 필터 통과 유니버스
    pub filtered: Vec<UniverseEntry>,
    /// 쇼트리스트
    pub shortlist: Vec<UniverseEntry>,
    /// 심볼별 피처
    pub features: BTreeMap<String, SymbolFeatures>,
}

/// 아키타입별 랭킹 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotScoring {
    /// 돌파 랭킹
    pub breakouts: Vec<ScoredSymbol>,
    /// 눌림목 랭킹
    pub pullbacks: Vec<ScoredSymbol>,
    /// 반전 랭킹
    pub reversals: Vec<ScoredSymbol>,
}

/// 파이프라인 실행 스냅샷.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// 메타 정보
    pub meta: SnapshotMeta,
    /// 단계별 개수
    pub pipeline: PipelineCounts,
    /// 데이터 본문
    pub data: SnapshotData,
    /// 랭킹 결과
    pub scoring: SnapshotScoring,
}

impl Snapshot {
    /// 파이프라인 실행 결과로부터 스냅샷을 구성합니다.
    ///
    /// 단계별 개수는 데이터에서 자동으로 채워집니다.
    pub fn new(run_date: impl Into<String>, data: SnapshotData, scoring: SnapshotScoring) -> Self {
        let pipeline = PipelineCounts {
            universe_count: data.universe.len(),
            filtered_count: data.filtered.len(),
            shortlist_count: data.shortlist.len(),
            features_count: data.features.len(),
        };

        Self {
            meta: SnapshotMeta {
                date: run_date.into(),
                created_at: Utc::now(),
                version: SNAPSHOT_VERSION.to_string(),
            },
            pipeline,
            data,
            scoring,
        }
    }
}

/// 스냅샷 요약 통계.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotStats {
    /// 실행 일자
    pub date: String,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 단계별 개수
    pub pipeline: PipelineCounts,
    /// 돌파 랭킹 수
    pub breakout_count: usize,
    /// 눌림목 랭킹 수
    pub pullback_count: usize,
    /// 반전 랭킹 수
    pub reversal_count: usize,
}

/// 일자별 스냅샷 관리자.
pub struct SnapshotManager {
    snapshots_dir: PathBuf,
}

impl SnapshotManager {
    /// 스냅샷 디렉터리로 관리자를 생성합니다.
    ///
    /// 디렉터리가 없으면 생성합니다.
    pub fn new(snapshots_dir: impl Into<PathBuf>) -> ScannerResult<Self> {
        let snapshots_dir = snapshots_dir.into();
        fs::create_dir_all(&snapshots_dir)?;

        tracing::info!(dir = %snapshots_dir.display(), "스냅샷 관리자 초기화");

        Ok(Self { snapshots_dir })
    }

    /// 스냅샷을 저장하고 파일 경로를 반환합니다.
    pub fn create(&self, snapshot: &Snapshot) -> ScannerResult<PathBuf> {
        let path = self.snapshot_path(&snapshot.meta.date);

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| ScannerError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;

        tracing::info!(
            date = %snapshot.meta.date,
            path = %path.display(),
            "스냅샷 저장 완료"
        );

        Ok(path)
    }

    /// 일자로 스냅샷을 로드합니다.
    pub fn load(&self, run_date: &str) -> ScannerResult<Snapshot> {
        let path = self.snapshot_path(run_date);

        if !path.exists() {
            return Err(ScannerError::NotFound(format!(
                "스냅샷이 없습니다: {}",
                path.display()
            )));
        }

        let json = fs::read_to_string(&path)?;
        serde_json::from_str(&json).map_err(|e| ScannerError::Serialization(e.to_string()))
    }

    /// 저장된 스냅샷 일자 목록을 오름차순으로 반환합니다.
    pub fn list(&self) -> ScannerResult<Vec<String>> {
        let mut dates = Vec::new();

        for entry in fs::read_dir(&self.snapshots_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    dates.push(stem.to_string());
                }
            }
        }

        dates.sort();
        Ok(dates)
    }

    /// 전체 데이터를 노출하지 않고 스냅샷 요약 통계를 반환합니다.
    pub fn stats(&self, run_date: &str) -> ScannerResult<SnapshotStats> {
        let snapshot = self.load(run_date)?;

        Ok(SnapshotStats {
            date: snapshot.meta.date,
            created_at: snapshot.meta.created_at,
            pipeline: snapshot.pipeline,
            breakout_count: snapshot.scoring.breakouts.len(),
            pullback_count: snapshot.scoring.pullbacks.len(),
            reversal_count: snapshot.scoring.reversals.len(),
        })
    }

    fn snapshot_path(&self, run_date: &str) -> PathBuf {
        self.snapshots_dir.join(format!("{}.json", run_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scanner-snapshots-{}-{}", tag, std::process::id()))
    }

    fn sample_entry(symbol: &str) -> UniverseEntry {
        UniverseEntry {
            symbol: symbol.to_string(),
            base: symbol.trim_end_matches("USDT").to_string(),
            quote_volume_24h: 2_000_000.0,
            market_cap: Some(500_000_000.0),
        }
    }

    fn sample_snapshot() -> Snapshot {
        let universe = vec![sample_entry("BTCUSDT"), sample_entry("ETHUSDT")];
        let data = SnapshotData {
            filtered: universe.clone(),
            shortlist: vec![sample_entry("BTCUSDT")],
            universe,
            features: BTreeMap::new(),
        };
        let scoring = SnapshotScoring {
            breakouts: vec![],
            pullbacks: vec![],
            reversals: vec![],
        };
        Snapshot::new("2024-06-01", data, scoring)
    }

    #[test]
    fn test_create_and_load_roundtrip() {
        let dir = temp_dir("roundtrip");
        let manager = SnapshotManager::new(&dir).unwrap();

        let snapshot = sample_snapshot();
        let path = manager.create(&snapshot).unwrap();
        assert!(path.exists());

        let loaded = manager.load("2024-06-01").unwrap();
        assert_eq!(loaded.meta.date, "2024-06-01");
        assert_eq!(loaded.pipeline.universe_count, 2);
        assert_eq!(loaded.pipeline.shortlist_count, 1);
        assert_eq!(loaded.data.universe, snapshot.data.universe);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_snapshot() {
        let dir = temp_dir("missing");
        let manager = SnapshotManager::new(&dir).unwrap();

        let result = manager.load("1999-01-01");
        assert!(matches!(result, Err(ScannerError::NotFound(_))));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_list_sorted() {
        let dir = temp_dir("list");
        let manager = SnapshotManager::new(&dir).unwrap();

        for date in ["2024-06-03", "2024-06-01", "2024-06-02"] {
            let mut snapshot = sample_snapshot();
            snapshot.meta.date = date.to_string();
            manager.create(&snapshot).unwrap();
        }

        let dates = manager.list().unwrap();
        assert_eq!(dates, vec!["2024-06-01", "2024-06-02", "2024-06-03"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_stats() {
        let dir = temp_dir("stats");
        let manager = SnapshotManager::new(&dir).unwrap();

        manager.create(&sample_snapshot()).unwrap();

        let stats = manager.stats("2024-06-01").unwrap();
        assert_eq!(stats.date, "2024-06-01");
        assert_eq!(stats.pipeline.universe_count, 2);
        assert_eq!(stats.breakout_count, 0);

        fs::remove_dir_all(&dir).unwrap();
    }
}
