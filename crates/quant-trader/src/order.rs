//! 주문/Action 생애주기 타입.
//!
//! 상태 전이: 제출 시 NEW로 생성 → 상태 조회 응답으로만 갱신 →
//! 종결 상태는 FILLED(원장에 1회 반영 후 불변) 또는 CANCELED
//! (원장에 반영 없이 폐기). FILLED에 도달한 Action은 다시 조회되지
//! 않으므로 중복 반영이 구조적으로 불가능합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quant_core::Transaction;
use quant_exchange::{OrderAck, OrderStatus};

/// 체결을 기다리는 최대 시간 (초). 초과 시 취소 후 치명적 종료.
pub const ORDER_TIMEOUT_SECS: i64 = 50;

/// 거래소에 제출된 대기 주문.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// 주문 접수 시각 (거래소 기준)
    pub order_time: DateTime<Utc>,
    /// 거래소 주문 id
    pub order_id: i64,
    /// 마지막으로 조회된 상태
    pub status: OrderStatus,
    /// 체결 시 원장에 반영할 기대 거래
    pub expected_transaction: Transaction,
}

impl Order {
    /// 제출 응답과 기대 거래로 주문을 만듭니다.
    pub fn from_ack(ack: OrderAck, expected_transaction: Transaction) -> Self {
        Self {
            order_time: ack.order_time,
            order_id: ack.order_id,
            status: ack.status,
            expected_transaction,
        }
    }

    /// 상태 조회 응답을 반영합니다.
    pub fn update_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    pub fn is_filled(&self) -> bool {
        self.status.is_filled()
    }
}

/// 한 번의 의사결정 단위.
///
/// 거래 의도가 없으면 `order`가 비어 있고, 그 Action은 즉시 종료로
/// 간주됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// 의사결정 시각
    pub decision_time: DateTime<Utc>,
    /// 제출된 주문 (의도가 없으면 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

impl Action {
    pub fn new(decision_time: DateTime<Utc>) -> Self {
        Self {
            decision_time,
            order: None,
        }
    }

    pub fn has_order(&self) -> bool {
        self.order.is_some()
    }

    /// 주문이 체결 종결 상태인지.
    pub fn is_success(&self) -> bool {
        self.order.as_ref().is_some_and(Order::is_filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quant_core::Side;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn order(status: OrderStatus) -> Order {
        Order {
            order_time: t0(),
            order_id: 7,
            status,
            expected_transaction: Transaction::new(Side::Buy, dec!(65000), dec!(0.003), t0()),
        }
    }

    #[test]
    fn action_without_order_is_not_success() {
        let action = Action::new(t0());
        assert!(!action.has_order());
        assert!(!action.is_success());
    }

    #[test]
    fn filled_order_marks_action_success() {
        let mut action = Action::new(t0());
        action.order = Some(order(OrderStatus::New));
        assert!(!action.is_success());

        action.order.as_mut().unwrap().update_status(OrderStatus::Filled);
        assert!(action.is_success());
    }

    #[test]
    fn serde_round_trips_pending_action() {
        let mut action = Action::new(t0());
        action.order = Some(order(OrderStatus::New));
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
