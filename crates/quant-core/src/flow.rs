//! 포지션 원장(TransactionFlow).
//!
//! 거래를 시간순으로 병합하여 보유 수량, 평균 단가, 실현 손익을
//! 추적하는 순수 값 타입입니다.
//!
//! # 불변 조건
//!
//! - `amount == 0` 이면 반드시 `average_price == 0`.
//! - 반대 방향 거래는 겹치는 수량에 대해서만 손익을 실현하고
//!   (실현 → 재가중 순서 고정), 포지션이 완전히 뒤집히면 평균 단가가
//!   거래 가격으로 바뀝니다. 부분 청산은 평균 단가를 유지합니다.
//! - 세 필드 모두 병합마다 소수점 [`LEDGER_SCALE`] 자리로 반올림하여
//!   수천 번의 병합에서도 부동소수 드리프트가 누적되지 않습니다.
//! - 병합은 시간순 적용 전제에서 결합적입니다. 시간 역순 병합은
//!   정의되지 않으며 [`TransactionFlow::from_transactions`]가 거부합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transaction::Transaction;

/// 원장 필드 반올림 자릿수.
pub const LEDGER_SCALE: u32 = 10;

/// 원장 병합 오류.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 시간 역순 거래 병합 시도
    #[error("거래가 시간순이 아닙니다: {prev} 이후에 {next}")]
    OutOfOrder {
        prev: chrono::DateTime<chrono::Utc>,
        next: chrono::DateTime<chrono::Utc>,
    },
}

/// 포지션 원장.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFlow {
    /// 부호화된 보유 수량 (양수 = 롱, 음수 = 숏)
    pub amount: Decimal,
    /// 평균 단가 (포지션이 없으면 0)
    pub average_price: Decimal,
    /// 실현 손익 (수수료 차감 누적)
    pub realized_profit: Decimal,
}

impl TransactionFlow {
    /// 빈 원장.
    pub fn new() -> Self {
        Self::default()
    }

    /// 거래 하나를 병합한 새 원장을 반환합니다.
    ///
    /// 반대 방향 거래는 `min(|보유|, |거래|)` 만큼만 손익을 실현한 뒤
    /// 평균 단가를 갱신합니다. 같은 방향 거래는 부호화 수량 가중
    /// 평균으로 평균 단가를 다시 계산합니다. 수수료는 항상 실현
    /// 손익에서 차감됩니다.
    pub fn merge(&self, tx: &Transaction) -> Self {
        let signed = tx.signed_amount();
        let new_amount = self.amount + signed;
        let mut realized = self.realized_profit;
        let average_price;

        if self.amount * signed < Decimal::ZERO {
            // 실현 → 재가중 순서 고정. 숏 포지션 청산에서는 방향 부호가
            // (평단 - 체결가) * 수량 형태로 뒤집힌다.
            let overlap = self.amount.abs().min(signed.abs());
            let direction = if self.amount > Decimal::ZERO {
                Decimal::ONE
            } else {
                -Decimal::ONE
            };
            realized += (tx.price - self.average_price) * overlap * direction;

            average_price = if new_amount.is_zero() {
                Decimal::ZERO
            } else if signed.abs() > self.amount.abs() {
                // 완전 역전: 초과분이 새 포지션이 되므로 평단은 거래 가격
                tx.price
            } else {
                self.average_price
            };
        } else {
            // 같은 방향(또는 무포지션): 부호화 수량 가중 평균.
            // 수량 0 거래만으로는 평단이 생기지 않는다.
            average_price = if new_amount.is_zero() {
                Decimal::ZERO
            } else {
                (self.average_price * self.amount + tx.price * signed) / new_amount
            };
        }

        realized -= tx.fee();

        Self {
            amount: new_amount.round_dp(LEDGER_SCALE),
            average_price: average_price.round_dp(LEDGER_SCALE),
            realized_profit: realized.round_dp(LEDGER_SCALE),
        }
    }

    /// 시간순으로 정렬된 거래 목록을 순차 병합합니다.
    ///
    /// 역순 거래가 발견되면 [`LedgerError::OutOfOrder`]를 반환합니다.
    pub fn from_transactions<'a, I>(transactions: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut flow = Self::new();
        let mut last_time = None;
        for tx in transactions {
            if let Some(prev) = last_time {
                if tx.time < prev {
                    return Err(LedgerError::OutOfOrder {
                        prev,
                        next: tx.time,
                    });
                }
            }
            last_time = Some(tx.time);
            flow = flow.merge(tx);
        }
        Ok(flow)
    }

    /// 평가 손익. 포지션이 없으면 0.
    pub fn unrealized_profit(&self, mark_price: Decimal) -> Decimal {
        if self.amount.is_zero() {
            Decimal::ZERO
        } else {
            (mark_price - self.average_price) * self.amount
        }
    }

    /// 순손익 = 평가 손익 + 실현 손익.
    pub fn net_profit(&self, mark_price: Decimal) -> Decimal {
        self.unrealized_profit(mark_price) + self.realized_profit
    }

    /// 외부 펀딩 조정을 더한 순손익.
    pub fn net_profit_with_funding(&self, mark_price: Decimal, funding: Decimal) -> Decimal {
        self.net_profit(mark_price) + funding
    }

    /// 현재 시세 기준 원장 덤프를 만듭니다.
    pub fn dump(&self, mark_price: Decimal) -> FlowDump {
        FlowDump {
            amount: self.amount,
            average_price: self.average_price,
            realized_profit: self.realized_profit,
            unrealized_profit: self.unrealized_profit(mark_price),
            net_profit: self.net_profit(mark_price),
        }
    }
}

/// 기록용 원장 덤프.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowDump {
    pub amount: Decimal,
    pub average_price: Decimal,
    pub realized_profit: Decimal,
    pub unrealized_profit: Decimal,
    pub net_profit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Side;
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn at(offset: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset * 60, 0).unwrap()
    }

    fn tx(side: Side, price: Decimal, amount: Decimal, offset: i64) -> Transaction {
        Transaction::new(side, price, amount, at(offset))
    }

    #[test]
    fn partial_close_realizes_overlap_and_keeps_average() {
        let flow = TransactionFlow::new()
            .merge(&tx(Side::Buy, dec!(100), dec!(1), 0))
            .merge(&tx(Side::Sell, dec!(110), dec!(0.5), 1));

        // 0.5 * (110 - 100) - 수수료(0.02 + 0.011)
        assert_eq!(flow.amount, dec!(0.5));
        assert_eq!(flow.average_price, dec!(100));
        assert_eq!(flow.realized_profit, dec!(5) - dec!(0.02) - dec!(0.011));
    }

    #[test]
    fn full_close_resets_average_price() {
        let flow = TransactionFlow::new()
            .merge(&tx(Side::Buy, dec!(100), dec!(1), 0))
            .merge(&tx(Side::Sell, dec!(90), dec!(1), 1));

        assert_eq!(flow.amount, Decimal::ZERO);
        assert_eq!(flow.average_price, Decimal::ZERO);
        assert_eq!(flow.realized_profit, dec!(-10) - dec!(0.02) - dec!(0.018));
    }

    #[test]
    fn reversal_flips_average_to_trade_price() {
        let flow = TransactionFlow::new()
            .merge(&tx(Side::Buy, dec!(100), dec!(1), 0))
            .merge(&tx(Side::Sell, dec!(110), dec!(3), 1));

        // 겹치는 1 만큼만 실현, 남은 -2는 110이 새 평단
        assert_eq!(flow.amount, dec!(-2));
        assert_eq!(flow.average_price, dec!(110));
        assert_eq!(flow.realized_profit, dec!(10) - dec!(0.02) - dec!(0.066));
    }

    #[test]
    fn short_position_profits_when_price_falls() {
        let flow = TransactionFlow::new()
            .merge(&tx(Side::Sell, dec!(100), dec!(1), 0))
            .merge(&tx(Side::Buy, dec!(80), dec!(1), 1));

        assert_eq!(flow.amount, Decimal::ZERO);
        assert_eq!(flow.realized_profit, dec!(20) - dec!(0.02) - dec!(0.016));
    }

    #[test]
    fn same_side_reweights_average() {
        let flow = TransactionFlow::new()
            .merge(&tx(Side::Buy, dec!(100), dec!(1), 0))
            .merge(&tx(Side::Buy, dec!(130), dec!(2), 1));

        assert_eq!(flow.amount, dec!(3));
        assert_eq!(flow.average_price, dec!(120));
    }

    #[test]
    fn unrealized_profit_is_zero_when_flat() {
        let flow = TransactionFlow::new();
        assert_eq!(flow.unrealized_profit(dec!(12345)), Decimal::ZERO);
    }

    #[test]
    fn rejects_out_of_order_merge() {
        let txs = [
            tx(Side::Buy, dec!(100), dec!(1), 5),
            tx(Side::Sell, dec!(110), dec!(1), 3),
        ];
        assert!(matches!(
            TransactionFlow::from_transactions(txs.iter()),
            Err(LedgerError::OutOfOrder { .. })
        ));
    }

    proptest! {
        /// 순차 병합과 일괄 병합이 같은 결과를 내고,
        /// 모든 도달 가능한 상태에서 amount == 0 ⇔ average_price == 0.
        #[test]
        fn sequential_merge_matches_batch_and_keeps_invariant(
            trades in proptest::collection::vec(
                (any::<bool>(), 1u32..100_000, 0u32..500),
                1..40,
            )
        ) {
            let txs: Vec<Transaction> = trades
                .iter()
                .enumerate()
                .map(|(i, (is_buy, price_cents, amount_milli))| {
                    let side = if *is_buy { Side::Buy } else { Side::Sell };
                    Transaction::new(
                        side,
                        Decimal::new(*price_cents as i64, 2),
                        Decimal::new(*amount_milli as i64, 3),
                        at(i as i64),
                    )
                })
                .collect();

            let mut sequential = TransactionFlow::new();
            for tx in &txs {
                sequential = sequential.merge(tx);
                if sequential.amount.is_zero() {
                    prop_assert_eq!(sequential.average_price, Decimal::ZERO);
                }
            }

            let batch = TransactionFlow::from_transactions(txs.iter()).unwrap();
            prop_assert_eq!(sequential, batch);
        }
    }
}
