//! 거래 스냅샷과 순손익 이력 레코드.
//!
//! 둘 다 추가 전용(append-only) 기록이며, 생성 이후에는 보고/시각화
//! 용도로만 읽습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::flow::{FlowDump, TransactionFlow};
use crate::transaction::Transaction;

/// 확정된 거래 1건(또는 구간 종료 시점)의 원장 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    /// 기록 시각
    pub time: DateTime<Utc>,
    /// 확정된 거래 (구간 종료 스냅샷에는 없음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
    /// 거래 없이 기록된 경우의 기준 시세
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Decimal>,
    /// 기록 시점 원장 덤프
    pub transaction_flow: FlowDump,
}

impl TransactionSnapshot {
    /// 거래 확정 시점의 스냅샷.
    pub fn with_trade(
        time: DateTime<Utc>,
        mark_price: Decimal,
        transaction: Transaction,
        flow: &TransactionFlow,
    ) -> Self {
        Self {
            time,
            transaction: Some(transaction),
            current_price: None,
            transaction_flow: flow.dump(mark_price),
        }
    }

    /// 거래 없이 시세만 기록하는 스냅샷 (구간 종료 등).
    pub fn mark(time: DateTime<Utc>, mark_price: Decimal, flow: &TransactionFlow) -> Self {
        Self {
            time,
            transaction: None,
            current_price: Some(mark_price),
            transaction_flow: flow.dump(mark_price),
        }
    }
}

/// 백테스트 한 스텝의 순손익 이력 엔트리.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitPoint {
    /// 캔들 시각
    pub time: DateTime<Utc>,
    /// 종가
    pub price: Decimal,
    /// 평균 단가
    pub average_price: Decimal,
    /// 순손익
    pub net_profit: Decimal,
}
