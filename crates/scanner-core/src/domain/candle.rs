//! OHLCV 캔들 데이터 구조체.

use crate::types::{Price, Quantity, Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OHLCV 캔들스틱 데이터.
///
/// 캔들 시퀀스는 open_time 오름차순으로 정렬되며, 생성 이후 변경되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량 (기준 자산 단위)
    pub volume: Quantity,
    /// 거래대금 (호가 자산 단위)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<Decimal>,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(
        open_time: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Quantity,
    ) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            quote_volume: None,
        }
    }

    /// 캔들이 구조적으로 유효한지 확인합니다.
    ///
    /// 고가 ≥ 저가, 모든 가격 양수, 거래량 비음수를 요구합니다.
    pub fn is_well_formed(&self) -> bool {
        self.high >= self.low
            && self.low > Decimal::ZERO
            && self.open > Decimal::ZERO
            && self.close > Decimal::ZERO
            && self.volume >= Decimal::ZERO
    }
}

/// 타임프레임별 캔들 시퀀스.
pub type CandlesByTimeframe = BTreeMap<Timeframe, Vec<Candle>>;
