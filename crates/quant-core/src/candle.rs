//! 분봉 캔들(KLine) 타입.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 캔들 검증 오류.
#[derive(Debug, Error)]
pub enum CandleError {
    /// 0 이하의 가격이 포함됨
    #[error("캔들 가격은 0보다 커야 합니다: {0:?}")]
    NonPositive(Candle),

    /// high/low가 open/close를 감싸지 않음
    #[error("캔들 고가/저가가 시가/종가와 모순됩니다: {0:?}")]
    Inconsistent(Candle),
}

/// 고정 60초 간격의 OHLC 캔들.
///
/// 한 번 생성되면 불변이며, 캔들 저장소에서 단조 증가하는
/// 타임스탬프를 키로 관리됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 시가
    pub open: Decimal,
    /// 고가
    pub high: Decimal,
    /// 저가
    pub low: Decimal,
    /// 종가
    pub close: Decimal,
}

impl Candle {
    /// 검증을 거쳐 캔들을 생성합니다.
    pub fn new(
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Result<Self, CandleError> {
        let candle = Self {
            open,
            high,
            low,
            close,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// `high ≥ max(open, close) ≥ min(open, close) ≥ low > 0` 검증.
    pub fn validate(&self) -> Result<(), CandleError> {
        if self.low <= Decimal::ZERO {
            return Err(CandleError::NonPositive(*self));
        }
        let body_high = self.open.max(self.close);
        let body_low = self.open.min(self.close);
        if self.high < body_high || self.low > body_low {
            return Err(CandleError::Inconsistent(*self));
        }
        Ok(())
    }

    /// 캔들 범위가 `[lowest, highest]` 구간과 겹치는지 여부.
    pub fn intersects(&self, lowest: Decimal, highest: Decimal) -> bool {
        self.low.max(lowest) <= self.high.min(highest)
    }

    /// 종가가 시가 이상인지 (캔들 내 상승 경로로 근사).
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }
}
