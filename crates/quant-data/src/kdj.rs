//! KDJ 오실레이터 사전 계산.
//!
//! 9기간 윈도우의 RSV를 1/3 가중 재귀식으로 평활한 K/D와
//! `J = 3K - 2D`를 캔들 저장소 전체에 대해 미리 계산합니다.
//! 계산 결과는 전략이 읽기 전용으로 소비합니다.
//!
//! 첫 값은 윈도우가 가득 찬 시점(워밍업 오프셋 이후)에 50으로
//! 시드됩니다. 재현 가능한 백테스트를 위해 재귀식의 형태와 0 분모
//! 가드(0.001)는 바꾸지 않습니다.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DataError;
use crate::store::CandleStore;

/// 기본 KDJ 윈도우 길이.
pub const KDJ_PERIOD: usize = 9;

/// 평활 K/D와 파생 J 값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kdj {
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "D")]
    pub d: f64,
    #[serde(rename = "J")]
    pub j: f64,
}

/// KDJ 계산기.
#[derive(Debug, Clone)]
pub struct KdjCalculator {
    period: usize,
}

impl KdjCalculator {
    pub fn new() -> Self {
        Self { period: KDJ_PERIOD }
    }

    pub fn with_period(period: usize) -> Self {
        Self { period }
    }

    /// 저장소 전체에 대한 지표 시리즈를 계산합니다.
    ///
    /// 처음 `period - 1` 스텝은 워밍업으로 건너뜁니다.
    pub fn calculate(&self, store: &CandleStore) -> IndicatorSeries {
        let mut highs: VecDeque<f64> = VecDeque::with_capacity(self.period);
        let mut lows: VecDeque<f64> = VecDeque::with_capacity(self.period);
        let mut values = BTreeMap::new();
        let mut prev: Option<(f64, f64)> = None;

        for (time, candle) in store.iter() {
            if highs.len() == self.period {
                highs.pop_front();
                lows.pop_front();
            }
            highs.push_back(candle.high.to_f64().unwrap_or(0.0));
            lows.push_back(candle.low.to_f64().unwrap_or(0.0));
            if highs.len() < self.period {
                continue;
            }

            let highest = highs.iter().copied().fold(f64::MIN, f64::max);
            let lowest = lows.iter().copied().fold(f64::MAX, f64::min);
            let denominator = if highest - lowest != 0.0 {
                highest - lowest
            } else {
                0.001
            };
            let close = candle.close.to_f64().unwrap_or(0.0);
            let rsv = (close - lowest) / denominator * 100.0;

            let (k, d) = match prev {
                None => (50.0, 50.0),
                Some((k_prev, d_prev)) => {
                    let k = (2.0 / 3.0) * k_prev + (1.0 / 3.0) * rsv;
                    let d = (2.0 / 3.0) * d_prev + (1.0 / 3.0) * k;
                    (k, d)
                }
            };
            prev = Some((k, d));

            values.insert(
                time.timestamp(),
                Kdj {
                    k,
                    d,
                    j: 3.0 * k - 2.0 * d,
                },
            );
        }

        debug!(points = values.len(), period = self.period, "KDJ 계산 완료");
        IndicatorSeries {
            interval_secs: store.step_secs(),
            values,
        }
    }
}

impl Default for KdjCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// 고정 간격으로 키잉된 KDJ 시리즈.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSeries {
    /// 시리즈 간격 (초)
    interval_secs: i64,
    /// open time(유닉스 초) → KDJ
    values: BTreeMap<i64, Kdj>,
}

impl IndicatorSeries {
    /// 미리 계산된 값으로 시리즈를 만듭니다.
    pub fn from_values(interval_secs: i64, values: BTreeMap<i64, Kdj>) -> Self {
        Self {
            interval_secs,
            values,
        }
    }

    pub fn interval_secs(&self) -> i64 {
        self.interval_secs
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 워밍업 이후 첫 값의 시각.
    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.values
            .keys()
            .next()
            .and_then(|ts| DateTime::from_timestamp(*ts, 0))
    }

    /// 지정 시각의 값. 없으면 [`DataError::IndicatorGap`].
    pub fn get_at(&self, time: DateTime<Utc>) -> Result<Kdj, DataError> {
        self.values
            .get(&time.timestamp())
            .copied()
            .ok_or(DataError::IndicatorGap { time })
    }

    /// `time`이 속한 간격 버킷의 한 스텝 전 값.
    ///
    /// 1분 간격에서는 정확히 `time - 60초`의 값입니다. 워밍업 이후에
    /// 값이 없으면 치명적 공백입니다.
    pub fn lookback(&self, time: DateTime<Utc>) -> Result<Kdj, DataError> {
        let ts = time.timestamp();
        let aligned = ts - ts.rem_euclid(self.interval_secs);
        let target = aligned - self.interval_secs;
        self.values
            .get(&target)
            .copied()
            .ok_or(DataError::IndicatorGap { time })
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        Ok(quant_core::load_json(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), DataError> {
        quant_core::dump_json(self, path)?;
        Ok(())
    }
}
