//! 시간 인덱스 캔들 저장소.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use quant_core::{Candle, CANDLE_STEP_SECS};

use crate::error::DataError;

/// 고정 간격 캔들의 시간 인덱스 저장소.
///
/// 키는 유닉스 초 단위 타임스탬프이며 `step_secs` 간격으로 연속이어야
/// 합니다. [`CandleStore::slice`]가 연속성을 검증하고, 누락 키는
/// 치명적인 [`DataError::Gap`]입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleStore {
    /// 캔들 간격 (초)
    step_secs: i64,
    /// open time(유닉스 초) → 캔들
    candles: BTreeMap<i64, Candle>,
}

impl CandleStore {
    /// 60초 간격의 빈 저장소.
    pub fn new() -> Self {
        Self::with_step(CANDLE_STEP_SECS)
    }

    /// 지정 간격의 빈 저장소.
    pub fn with_step(step_secs: i64) -> Self {
        Self {
            step_secs,
            candles: BTreeMap::new(),
        }
    }

    pub fn step_secs(&self) -> i64 {
        self.step_secs
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// 캔들을 추가합니다. 같은 키가 있으면 덮어씁니다.
    pub fn insert(&mut self, timestamp: i64, candle: Candle) {
        self.candles.insert(timestamp, candle);
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.candles.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.candles.keys().next_back().copied()
    }

    /// 지정 시각의 캔들. 없으면 [`DataError::Gap`].
    pub fn get_at(&self, time: DateTime<Utc>) -> Result<Candle, DataError> {
        self.candles
            .get(&time.timestamp())
            .copied()
            .ok_or(DataError::Gap { time })
    }

    /// 시간순 반복자.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, Candle)> + '_ {
        self.candles
            .iter()
            .filter_map(|(ts, candle)| DateTime::from_timestamp(*ts, 0).map(|t| (t, *candle)))
    }

    /// `[start, end]` 구간을 잘라 새 저장소로 반환합니다.
    ///
    /// 구간 내 모든 스텝이 존재해야 하며, 하나라도 비면
    /// [`DataError::Gap`]으로 실패합니다.
    pub fn slice(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleStore, DataError> {
        if end < start {
            return Err(DataError::Empty);
        }

        let mut sliced = CandleStore::with_step(self.step_secs);
        let mut ts = start.timestamp();
        let end_ts = end.timestamp();
        while ts <= end_ts {
            let time = DateTime::from_timestamp(ts, 0).ok_or(DataError::Empty)?;
            let candle = self.get_at(time)?;
            sliced.insert(ts, candle);
            ts += self.step_secs;
        }
        Ok(sliced)
    }

    /// 1스텝 캔들을 `factor`배 간격으로 접어 리샘플합니다.
    ///
    /// 버킷은 간격 경계에 정렬되며, 시가는 버킷의 첫 캔들,
    /// 종가는 마지막 캔들, 고가/저가는 버킷 극값입니다.
    pub fn resample(&self, factor: u32) -> CandleStore {
        if factor <= 1 {
            return self.clone();
        }
        let interval = self.step_secs * i64::from(factor);
        let mut resampled = CandleStore::with_step(interval);

        for (&ts, candle) in &self.candles {
            let bucket = ts - ts.rem_euclid(interval);
            match resampled.candles.get_mut(&bucket) {
                None => {
                    resampled.candles.insert(bucket, *candle);
                }
                Some(merged) => {
                    merged.high = merged.high.max(candle.high);
                    merged.low = merged.low.min(candle.low);
                    merged.close = candle.close;
                }
            }
        }
        resampled
    }

    /// JSON 파일에서 로드합니다.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let store: CandleStore = quant_core::load_json(path)?;
        debug!(candles = store.len(), path = %path.display(), "캔들 저장소 로드");
        Ok(store)
    }

    /// JSON 파일로 저장합니다 (전체 쓰기).
    pub fn save(&self, path: &Path) -> Result<(), DataError> {
        quant_core::dump_json(self, path)?;
        Ok(())
    }
}

impl Default for CandleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const BASE: i64 = 1_700_000_040; // 60초 경계에 정렬

    fn flat(price: Decimal) -> Candle {
        Candle {
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    fn store_of(prices: &[Decimal]) -> CandleStore {
        let mut store = CandleStore::new();
        for (i, p) in prices.iter().enumerate() {
            store.insert(BASE + i as i64 * 60, flat(*p));
        }
        store
    }

    fn at(offset: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(BASE + offset * 60, 0).unwrap()
    }

    #[test]
    fn slice_returns_contiguous_range() {
        let store = store_of(&[dec!(1), dec!(2), dec!(3), dec!(4)]);
        let sliced = store.slice(at(1), at(2)).unwrap();
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.get_at(at(1)).unwrap().close, dec!(2));
    }

    #[test]
    fn slice_fails_on_gap() {
        let mut store = store_of(&[dec!(1), dec!(2), dec!(3)]);
        store.candles.remove(&(BASE + 60));
        assert!(matches!(
            store.slice(at(0), at(2)),
            Err(DataError::Gap { .. })
        ));
    }

    #[test]
    fn resample_folds_ohlc() {
        let mut store = CandleStore::new();
        // 3분 버킷 하나에 들어가는 3개 캔들
        let bucket = 1_700_000_100 - 1_700_000_100 % 180;
        store.insert(bucket, Candle::new(dec!(10), dec!(12), dec!(9), dec!(11)).unwrap());
        store.insert(bucket + 60, Candle::new(dec!(11), dec!(15), dec!(10), dec!(14)).unwrap());
        store.insert(bucket + 120, Candle::new(dec!(14), dec!(14), dec!(8), dec!(9)).unwrap());

        let resampled = store.resample(3);
        assert_eq!(resampled.len(), 1);
        let merged = resampled
            .get_at(DateTime::from_timestamp(bucket, 0).unwrap())
            .unwrap();
        assert_eq!(merged.open, dec!(10));
        assert_eq!(merged.high, dec!(15));
        assert_eq!(merged.low, dec!(8));
        assert_eq!(merged.close, dec!(9));
    }

    #[test]
    fn save_and_load_round_trips() {
        let store = store_of(&[dec!(5), dec!(6)]);
        let path = std::env::temp_dir().join("quant-data-store-test/prices.json");
        store.save(&path).unwrap();
        let loaded = CandleStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get_at(at(1)).unwrap().close, dec!(6));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
