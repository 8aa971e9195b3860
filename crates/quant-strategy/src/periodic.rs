//! 주기 적립 변형 (DCA / 공매도 적립).
//!
//! 기록된 거래가 아직 없거나 마지막 거래 이후 설정 간격이 지났을 때
//! 고정 명목가(`amount_in_usd / close`) 거래 한 건을 냅니다.
//! `dca`는 매수 방향, `going_short`는 매도 방향입니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use quant_core::{Candle, Side, Transaction};

use crate::decision::SessionView;
use crate::error::StrategyError;

/// 주기 적립 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicConfig {
    /// 운용 예산
    pub budget: Decimal,

    /// 레버리지
    #[serde(default = "default_leverage")]
    pub leverage: u32,

    /// 거래 간격 (초)
    #[serde(default = "default_time_interval")]
    pub time_interval: i64,

    /// 1회 거래 명목가 (USD)
    #[serde(default = "default_amount_in_usd")]
    pub amount_in_usd: Decimal,
}

fn default_leverage() -> u32 {
    1
}

fn default_time_interval() -> i64 {
    86_400
}

fn default_amount_in_usd() -> Decimal {
    dec!(100)
}

impl PeriodicConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if self.budget <= Decimal::ZERO {
            return Err(StrategyError::Config("예산은 0보다 커야 합니다".into()));
        }
        if self.time_interval <= 0 || self.amount_in_usd <= Decimal::ZERO {
            return Err(StrategyError::Config(
                "거래 간격과 명목가는 0보다 커야 합니다".into(),
            ));
        }
        Ok(())
    }
}

/// 주기 적립 변형 상태.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicDecision {
    side: Side,
    interval_secs: i64,
    notional: Decimal,
}

impl PeriodicDecision {
    pub fn new(side: Side, config: &PeriodicConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            side,
            interval_secs: config.time_interval,
            notional: config.amount_in_usd,
        })
    }

    pub fn decide(
        &mut self,
        view: &SessionView<'_>,
        time: DateTime<Utc>,
        candle: &Candle,
    ) -> Vec<Transaction> {
        let due = match view.last_trade_time {
            None => true,
            Some(last) => (time - last).num_seconds() >= self.interval_secs,
        };
        if !due {
            return Vec::new();
        }

        let amount = self.notional / candle.close;
        vec![Transaction::new(self.side, candle.close, amount, time)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quant_core::TransactionFlow;

    fn at(offset: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset, 0).unwrap()
    }

    fn candle(close: Decimal) -> Candle {
        Candle {
            open: close,
            high: close,
            low: close,
            close,
        }
    }

    fn view(flow: &TransactionFlow, last: Option<DateTime<Utc>>) -> SessionView<'_> {
        SessionView {
            flow,
            leverage: 1,
            last_trade_time: last,
        }
    }

    #[test]
    fn first_candle_always_trades() {
        let flow = TransactionFlow::new();
        let mut periodic = PeriodicDecision::new(
            Side::Buy,
            &PeriodicConfig {
                budget: dec!(1000),
                leverage: 1,
                time_interval: 3600,
                amount_in_usd: dec!(100),
            },
        )
        .unwrap();

        let txs = periodic.decide(&view(&flow, None), at(0), &candle(dec!(50)));
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].side, Side::Buy);
        assert_eq!(txs[0].amount, dec!(2));
    }

    #[test]
    fn waits_for_interval_since_last_trade() {
        let flow = TransactionFlow::new();
        let mut periodic = PeriodicDecision::new(
            Side::Sell,
            &PeriodicConfig {
                budget: dec!(1000),
                leverage: 1,
                time_interval: 3600,
                amount_in_usd: dec!(100),
            },
        )
        .unwrap();

        assert!(periodic
            .decide(&view(&flow, Some(at(0))), at(3599), &candle(dec!(50)))
            .is_empty());
        let txs = periodic.decide(&view(&flow, Some(at(0))), at(3600), &candle(dec!(50)));
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].side, Side::Sell);
    }
}
