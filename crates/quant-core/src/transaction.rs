//! 거래(Transaction) 및 방향(Side) 타입.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 기본 수수료율 (0.02%).
pub const DEFAULT_FEE_RATIO: Decimal = dec!(0.0002);

/// 거래 방향.
///
/// 내부 부호 규약: `mode_value()`는 BUY = -1, SELL = +1 이며,
/// 순증가량은 `-amount * mode_value` 로 계산됩니다.
/// 즉 BUY는 포지션을 `+amount`, SELL은 `-amount` 만큼 움직입니다.
/// 이 규약은 순자산/손익 수식 전반에서 일관되게 사용되므로
/// 뒤집지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 내부 부호 규약 값 (BUY = -1, SELL = +1).
    pub fn mode_value(self) -> i64 {
        match self {
            Side::Buy => -1,
            Side::Sell => 1,
        }
    }

    /// 반대 방향.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 단일 거래.
///
/// 생성 이후 불변입니다. 레버리지는 전략이 거래를 확정하는 시점
/// (백테스트: 커밋 시, 실거래: 체결 확인 시)에 정확히 한 번
/// `amount`에 곱해집니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// 거래 방향
    pub side: Side,
    /// 체결 가격
    pub price: Decimal,
    /// 수량 (항상 0 이상)
    pub amount: Decimal,
    /// 거래 시각
    pub time: DateTime<Utc>,
    /// 수수료율
    #[serde(default = "default_fee_ratio")]
    pub fee_ratio: Decimal,
}

fn default_fee_ratio() -> Decimal {
    DEFAULT_FEE_RATIO
}

impl Transaction {
    /// 기본 수수료율로 거래를 생성합니다.
    pub fn new(side: Side, price: Decimal, amount: Decimal, time: DateTime<Utc>) -> Self {
        Self {
            side,
            price,
            amount,
            time,
            fee_ratio: DEFAULT_FEE_RATIO,
        }
    }

    /// 부호화된 수량. BUY는 `+amount`, SELL은 `-amount`.
    pub fn signed_amount(&self) -> Decimal {
        -self.amount * Decimal::from(self.side.mode_value())
    }

    /// 거래 수수료 (항상 비용, 양수).
    pub fn fee(&self) -> Decimal {
        (self.price * self.amount * self.fee_ratio).abs()
    }

    /// 레버리지를 적용한 사본을 반환합니다.
    pub fn with_leverage(mut self, leverage: u32) -> Self {
        self.amount *= Decimal::from(leverage);
        self
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction(<{}> {:.4} @ {:.4})",
            self.side, self.amount, self.price
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn signed_amount_follows_convention() {
        let buy = Transaction::new(Side::Buy, dec!(100), dec!(2), t0());
        let sell = Transaction::new(Side::Sell, dec!(100), dec!(2), t0());
        assert_eq!(buy.signed_amount(), dec!(2));
        assert_eq!(sell.signed_amount(), dec!(-2));
    }

    #[test]
    fn fee_is_always_a_cost() {
        let sell = Transaction::new(Side::Sell, dec!(100), dec!(2), t0());
        assert_eq!(sell.fee(), dec!(0.04));
    }

    #[test]
    fn serde_uses_uppercase_side_names() {
        let buy = Transaction::new(Side::Buy, dec!(100), dec!(2), t0());
        let json = serde_json::to_string(&buy).unwrap();
        assert!(json.contains("\"BUY\""));
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, buy);
    }
}
