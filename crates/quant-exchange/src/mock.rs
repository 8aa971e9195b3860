//! 테스트용 가상 거래소.
//!
//! 실제 거래소와 동일한 [`ExchangeClient`] 인터페이스를 제공하며,
//! 체결 시점(N번째 조회 후 체결 / 영원히 미체결)을 스크립트로
//! 지정할 수 있습니다. 주문 생애주기 테스트의 기반입니다.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use quant_core::Candle;

use crate::client::{ExchangeClient, OrderAck, OrderRequest, OrderStatus, OrderUpdate};
use crate::error::ExchangeError;

#[derive(Debug)]
struct MockState {
    now: DateTime<Utc>,
    candle: Candle,
    polls: u32,
    placed: Vec<OrderRequest>,
    cancelled: Vec<i64>,
    next_order_id: i64,
}

/// 스크립트 가능한 가상 거래소.
///
/// `Clone`은 같은 상태를 공유하므로, 트레이더에 넘긴 뒤에도 사본으로
/// 제출/취소 이력을 검사할 수 있습니다.
#[derive(Clone)]
pub struct MockExchange {
    /// `server_time` 호출마다 흐르는 시간
    time_step_secs: i64,
    /// 이 횟수만큼 조회된 뒤 체결. `None`이면 영원히 NEW.
    fill_after_polls: Option<u32>,
    /// 체결 가격 (미지정 시 주문 가격)
    fill_price: Option<Decimal>,
    state: Arc<Mutex<MockState>>,
}

impl MockExchange {
    pub fn new(now: DateTime<Utc>, candle: Candle) -> Self {
        Self {
            time_step_secs: 0,
            fill_after_polls: Some(1),
            fill_price: None,
            state: Arc::new(Mutex::new(MockState {
                now,
                candle,
                polls: 0,
                placed: Vec::new(),
                cancelled: Vec::new(),
                next_order_id: 1000,
            })),
        }
    }

    /// `server_time` 호출마다 시간을 `secs`초 전진시킵니다.
    pub fn with_time_step(mut self, secs: i64) -> Self {
        self.time_step_secs = secs;
        self
    }

    /// N번째 상태 조회에서 체결되도록 합니다. `None`이면 미체결 유지.
    pub fn with_fill_after_polls(mut self, polls: Option<u32>) -> Self {
        self.fill_after_polls = polls;
        self
    }

    /// 체결 가격을 주문 가격과 다르게 지정합니다.
    pub fn with_fill_price(mut self, price: Decimal) -> Self {
        self.fill_price = Some(price);
        self
    }

    /// 지금까지 제출된 주문.
    pub async fn placed_orders(&self) -> Vec<OrderRequest> {
        self.state.lock().await.placed.clone()
    }

    /// 지금까지 취소된 주문 id.
    pub async fn cancelled_orders(&self) -> Vec<i64> {
        self.state.lock().await.cancelled.clone()
    }

    /// 상태 조회 횟수.
    pub async fn poll_count(&self) -> u32 {
        self.state.lock().await.polls
    }
}

#[async_trait]
impl ExchangeClient for MockExchange {
    async fn server_time(&self) -> Result<DateTime<Utc>, ExchangeError> {
        let mut state = self.state.lock().await;
        let now = state.now;
        state.now += Duration::seconds(self.time_step_secs);
        Ok(now)
    }

    async fn recent_candle(&self, _symbol: &str) -> Result<(DateTime<Utc>, Candle), ExchangeError> {
        let state = self.state.lock().await;
        Ok((state.now, state.candle))
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let mut state = self.state.lock().await;
        state.next_order_id += 1;
        let order_id = state.next_order_id;
        state.placed.push(request.clone());
        Ok(OrderAck {
            order_id,
            order_time: state.now,
            status: OrderStatus::New,
        })
    }

    async fn query_order(
        &self,
        _symbol: &str,
        order_id: i64,
    ) -> Result<OrderUpdate, ExchangeError> {
        let mut state = self.state.lock().await;
        let request = state
            .placed
            .last()
            .cloned()
            .ok_or(ExchangeError::UnknownOrder { order_id })?;
        state.polls += 1;

        let filled = self
            .fill_after_polls
            .is_some_and(|after| state.polls >= after);
        Ok(OrderUpdate {
            status: if filled {
                OrderStatus::Filled
            } else {
                OrderStatus::New
            },
            price: self.fill_price.unwrap_or(request.price),
        })
    }

    async fn cancel_order(&self, _symbol: &str, order_id: i64) -> Result<(), ExchangeError> {
        self.state.lock().await.cancelled.push(order_id);
        Ok(())
    }

    async fn change_leverage(&self, _symbol: &str, _leverage: u32) -> Result<(), ExchangeError> {
        Ok(())
    }
}
