//! 거래소 중립 클라이언트 trait과 주문 타입.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use quant_core::{Candle, Side};

use crate::error::ExchangeError;

/// 주문 상태.
///
/// 생애주기: `NEW → {FILLED, CANCELED, ...}`. FILLED에 도달한 주문의
/// 거래는 원장에 정확히 한 번 반영되고, CANCELED는 반영 없이
/// 폐기됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    /// 거래소가 추가한 비표준 상태
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// 더 이상 변하지 않는 상태인지.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }

    pub fn is_filled(self) -> bool {
        self == OrderStatus::Filled
    }
}

/// 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
}

/// 주문 요청.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
}

/// 주문 제출 응답.
#[derive(Debug, Clone)]
pub struct OrderAck {
    pub order_id: i64,
    pub order_time: DateTime<Utc>,
    pub status: OrderStatus,
}

/// 주문 상태 조회 응답.
#[derive(Debug, Clone)]
pub struct OrderUpdate {
    pub status: OrderStatus,
    /// 주문/체결 가격
    pub price: Decimal,
}

/// 코어가 의존하는 좁은 거래소 능력 집합.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// 거래소 서버 시각.
    async fn server_time(&self) -> Result<DateTime<Utc>, ExchangeError>;

    /// 가장 최근 1분 캔들.
    async fn recent_candle(&self, symbol: &str) -> Result<(DateTime<Utc>, Candle), ExchangeError>;

    /// 주문 제출.
    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, ExchangeError>;

    /// 주문 상태 조회.
    async fn query_order(&self, symbol: &str, order_id: i64)
        -> Result<OrderUpdate, ExchangeError>;

    /// 주문 취소.
    async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<(), ExchangeError>;

    /// 심볼 레버리지 변경.
    async fn change_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError>;
}
