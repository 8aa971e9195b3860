//! 그리드 트레이딩 변형.
//!
//! `[lowest, highest]` 대역을 `num_interval`개의 고정 폭 레벨로 나누고,
//! 캔들의 저가/고가가 레벨을 지날 때마다 한 레벨당 한 건씩 매수/매도를
//! 냅니다. OHLC만으로 캔들 내 경로를 근사하기 위해 양봉이면 매수측을
//! 먼저, 음봉이면 매도측을 먼저 비웁니다. 이 순서는 재현 가능한
//! 백테스트를 위해 바꾸지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quant_core::{Candle, Side, Transaction};

use crate::error::StrategyError;

/// 그리드 전략 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// 운용 예산
    pub budget: Decimal,

    /// 레버리지
    #[serde(default = "default_leverage")]
    pub leverage: u32,

    /// 대역 상한
    #[serde(default = "default_highest")]
    pub highest: Decimal,

    /// 대역 하한
    #[serde(default = "default_lowest")]
    pub lowest: Decimal,

    /// 레벨 수
    #[serde(default = "default_num_interval")]
    pub num_interval: u32,

    /// 레벨당 거래 수량
    #[serde(default = "default_amount")]
    pub amount: Decimal,

    /// 레벨 이동용 상대 스텝.
    ///
    /// 한 레벨을 비운 뒤 다음 트리거 가격을 찾을 때
    /// `price * step_ratio` 만큼 비껴 내리거나 올립니다.
    #[serde(default = "default_step_ratio")]
    pub step_ratio: Decimal,
}

fn default_leverage() -> u32 {
    1
}

fn default_highest() -> Decimal {
    dec!(75000)
}

fn default_lowest() -> Decimal {
    dec!(60000)
}

fn default_num_interval() -> u32 {
    20
}

fn default_amount() -> Decimal {
    dec!(0.003)
}

fn default_step_ratio() -> Decimal {
    dec!(0.001)
}

impl GridConfig {
    /// 설정 검증.
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.budget <= Decimal::ZERO {
            return Err(StrategyError::Config("예산은 0보다 커야 합니다".into()));
        }
        if self.highest <= self.lowest {
            return Err(StrategyError::Config(
                "대역 상한은 하한보다 커야 합니다".into(),
            ));
        }
        if self.num_interval == 0 || self.amount <= Decimal::ZERO {
            return Err(StrategyError::Config(
                "레벨 수와 수량은 0보다 커야 합니다".into(),
            ));
        }
        let interval = ((self.highest - self.lowest) / Decimal::from(self.num_interval)).floor();
        if interval <= Decimal::ZERO {
            return Err(StrategyError::Config(
                "레벨 간격이 1 미만입니다: 대역을 넓히거나 레벨 수를 줄이세요".into(),
            ));
        }
        // 스텝이 한 번에 두 레벨 이상을 건너뛰면 레벨 드레인이 깨진다
        if self.step_ratio <= Decimal::ZERO || self.highest * self.step_ratio >= interval {
            return Err(StrategyError::Config(format!(
                "step_ratio {}가 레벨 간격 {}에 비해 유효하지 않습니다",
                self.step_ratio, interval
            )));
        }
        Ok(())
    }
}

/// 그리드 변형 상태.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDecision {
    highest: Decimal,
    lowest: Decimal,
    interval: Decimal,
    amount: Decimal,
    step_ratio: Decimal,
    /// 현재 매수 트리거 (첫 대역 진입 시 초기화)
    buy_price: Option<Decimal>,
    /// 현재 매도 트리거
    sell_price: Option<Decimal>,
}

impl GridDecision {
    pub fn new(config: &GridConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            highest: config.highest,
            lowest: config.lowest,
            interval: ((config.highest - config.lowest) / Decimal::from(config.num_interval))
                .floor(),
            amount: config.amount,
            step_ratio: config.step_ratio,
            buy_price: None,
            sell_price: None,
        })
    }

    /// 현재 매수/매도 트리거 (검사용).
    pub fn band(&self) -> (Option<Decimal>, Option<Decimal>) {
        (self.buy_price, self.sell_price)
    }

    /// `price` 이하에서 가장 가까운 그리드 레벨.
    fn closest_lower_bound(&self, price: Decimal) -> Decimal {
        self.lowest + ((price - self.lowest) / self.interval).floor() * self.interval
    }

    /// `price` 초과에서 가장 가까운 그리드 레벨.
    fn closest_upper_bound(&self, price: Decimal) -> Decimal {
        self.closest_lower_bound(price) + self.interval
    }

    fn nudge(&self, price: Decimal) -> Decimal {
        price * self.step_ratio
    }

    /// 저가가 지나간 매수 레벨을 전부 비웁니다.
    ///
    /// 드레인이 끝나면 매도 트리거를 마지막 매수 레벨의 두 레벨 위로
    /// 재중심하여 한 방향 폭주를 막습니다.
    fn drain_buys(
        &self,
        buy: &mut Decimal,
        sell: &mut Decimal,
        time: DateTime<Utc>,
        candle: &Candle,
        out: &mut Vec<Transaction>,
    ) {
        while candle.low <= *buy {
            out.push(Transaction::new(Side::Buy, *buy, self.amount, time));
            *buy = self.closest_lower_bound(*buy - self.nudge(*buy));
        }
        *sell = self.closest_upper_bound(*buy + dec!(2) * self.interval - self.nudge(*buy));
    }

    /// 고가가 지나간 매도 레벨을 전부 비웁니다.
    fn drain_sells(
        &self,
        buy: &mut Decimal,
        sell: &mut Decimal,
        time: DateTime<Utc>,
        candle: &Candle,
        out: &mut Vec<Transaction>,
    ) {
        while candle.high >= *sell {
            out.push(Transaction::new(Side::Sell, *sell, self.amount, time));
            *sell = self.closest_upper_bound(*sell + self.nudge(*sell));
        }
        *buy = self.closest_lower_bound(*sell - dec!(2) * self.interval + self.nudge(*sell));
    }

    /// 한 캔들에 대한 그리드 의사결정.
    pub fn decide(&mut self, time: DateTime<Utc>, candle: &Candle) -> Vec<Transaction> {
        if !candle.intersects(self.lowest, self.highest) {
            return Vec::new();
        }

        // 대역에 처음 들어온 캔들의 종가에 대역을 중심 맞춤
        if self.buy_price.is_none() && self.sell_price.is_none() {
            let buy = self.closest_lower_bound(candle.close);
            let sell = self.closest_upper_bound(candle.close) + self.interval;
            debug!(%buy, %sell, "그리드 트리거 초기화");
            self.buy_price = Some(buy);
            self.sell_price = Some(sell);
        }
        let (Some(mut buy), Some(mut sell)) = (self.buy_price, self.sell_price) else {
            return Vec::new();
        };

        let mut transactions = Vec::new();
        if candle.is_rising() {
            // 양봉: 저가로 먼저 내려갔다 올라온 경로로 근사
            if candle.low <= buy {
                self.drain_buys(&mut buy, &mut sell, time, candle, &mut transactions);
            }
            if candle.high >= sell {
                self.drain_sells(&mut buy, &mut sell, time, candle, &mut transactions);
            }
        } else {
            if candle.high >= sell {
                self.drain_sells(&mut buy, &mut sell, time, candle, &mut transactions);
            }
            if candle.low <= buy {
                self.drain_buys(&mut buy, &mut sell, time, candle, &mut transactions);
            }
        }

        self.buy_price = Some(buy);
        self.sell_price = Some(sell);
        transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> GridConfig {
        GridConfig {
            budget: dec!(200),
            leverage: 1,
            highest: dec!(75000),
            lowest: dec!(60000),
            num_interval: 20,
            amount: dec!(0.003),
            step_ratio: dec!(0.001),
        }
    }

    fn at(offset: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset * 60, 0).unwrap()
    }

    #[test]
    fn rejects_degenerate_band() {
        let mut cfg = config();
        cfg.highest = dec!(60000);
        assert!(matches!(
            GridDecision::new(&cfg),
            Err(StrategyError::Config(_))
        ));
    }

    #[test]
    fn rejects_step_ratio_wider_than_level() {
        let mut cfg = config();
        cfg.step_ratio = dec!(0.02); // 75000 * 0.02 = 1500 > interval 750
        assert!(GridDecision::new(&cfg).is_err());
    }

    #[test]
    fn out_of_band_candle_is_ignored() {
        let mut grid = GridDecision::new(&config()).unwrap();
        let candle = Candle::new(dec!(80000), dec!(80500), dec!(79500), dec!(80200)).unwrap();
        assert!(grid.decide(at(0), &candle).is_empty());
        assert_eq!(grid.band(), (None, None));
    }

    proptest! {
        /// 어떤 캔들을 처리하든 드레인 후 buy < sell 이 유지된다.
        #[test]
        fn buy_stays_below_sell(
            close_offset in 0u32..15_000,
            spread in 0u32..3_000,
        ) {
            let mut grid = GridDecision::new(&config()).unwrap();
            let close = dec!(60000) + Decimal::from(close_offset);
            let candle = Candle::new(
                close,
                close + Decimal::from(spread),
                (close - Decimal::from(spread)).max(dec!(1)),
                close,
            ).unwrap();
            grid.decide(at(0), &candle);

            if let (Some(buy), Some(sell)) = grid.band() {
                prop_assert!(buy < sell);
            }
        }
    }
}
