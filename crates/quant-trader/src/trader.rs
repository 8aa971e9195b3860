//! 실거래 폴링 루프.
//!
//! 단일 스레드 폴링 루프가 한 번의 의사결정(Action)을 끝까지
//! 책임집니다: 의사결정 → 주문 제출 → 상태 폴링 → 체결 반영 또는
//! 타임아웃 취소. 거래소 조회 오류는 이 루프 안에서 재시도하지 않고
//! 그대로 전파되어 실행을 멈춥니다.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use quant_core::format_datetime;
use quant_exchange::{ExchangeClient, ExchangeError, OrderRequest, OrderType};
use quant_notification::SlackNotifier;
use quant_strategy::{Strategy, StrategyError};

use crate::order::{Action, Order, ORDER_TIMEOUT_SECS};

/// 새 의사결정 사이의 최소 간격 (초).
const DECISION_INTERVAL_SECS: i64 = 60;

/// 실거래 오류.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 주문이 제한 시간 안에 체결되지 않음. 취소 후 치명적 종료.
    ///
    /// 부분 체결 이후의 취소를 보상할 방법이 없으므로 자동 재시작은
    /// 정의되지 않습니다. 저장된 전략 상태로 운영자가 복구합니다.
    #[error("주문 시간 초과 (order_id {order_id}): 취소 후 종료")]
    OrderTimeout { order_id: i64 },

    /// 거래소 조회/제출 실패 (재시도 없음)
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// 전략 실행 오류
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// 상태/결과 저장 실패
    #[error(transparent)]
    Json(#[from] quant_core::JsonError),
}

/// 영속 파일 경로 묶음.
#[derive(Debug, Clone)]
pub struct TraderPaths {
    /// 마지막 Action (크래시 복구용)
    pub action_path: PathBuf,
    /// 거래 스냅샷 로그
    pub results_path: PathBuf,
    /// 전략 상태
    pub state_path: PathBuf,
}

/// 실거래 실행기.
///
/// 한 번의 [`Trader::run`]은 Action 하나를 끝까지 처리하고
/// 종료합니다. 바깥 스케줄러가 프로세스를 재기동하는 구조입니다.
pub struct Trader<C: ExchangeClient> {
    strategy: Strategy,
    symbol: String,
    client: C,
    notifier: Option<SlackNotifier>,
    paths: TraderPaths,
    last_action: Option<Action>,
    current_action: Option<Action>,
    poll_interval: Duration,
}

impl<C: ExchangeClient> Trader<C> {
    /// 트레이더를 만들고 저장된 마지막 Action을 복원합니다.
    pub fn new(
        strategy: Strategy,
        symbol: String,
        client: C,
        notifier: Option<SlackNotifier>,
        paths: TraderPaths,
    ) -> Self {
        let last_action = paths
            .action_path
            .exists()
            .then(|| quant_core::load_json::<Action>(&paths.action_path).ok())
            .flatten();
        if let Some(action) = &last_action {
            info!(decision_time = %action.decision_time, "마지막 Action 복원");
        }

        Self {
            strategy,
            symbol,
            client,
            notifier,
            paths,
            last_action,
            current_action: None,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// 폴링 간격 조정 (테스트용).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Action 하나를 끝까지 처리합니다.
    pub async fn run(&mut self) -> Result<(), TraderError> {
        loop {
            let now = self.client.server_time().await?;

            if self.current_action.is_none() && self.decision_due(now) {
                self.current_action = Some(Action::new(now));
                self.trade(now).await?;
            }

            if self.current_action.is_some() && self.poll_once(now).await? {
                self.strategy.save(&self.paths.state_path)?;
                info!("Action 종결, 전략 상태 저장 후 종료");
                return Ok(());
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 마지막 의사결정 이후 충분한 시간이 지났는지.
    fn decision_due(&self, now: DateTime<Utc>) -> bool {
        match &self.last_action {
            None => true,
            Some(last) => (now - last.decision_time).num_seconds() >= DECISION_INTERVAL_SECS,
        }
    }

    /// 의사결정: 최근 캔들로 전략을 돌려 첫 거래 의도를 주문으로 제출합니다.
    async fn trade(&mut self, now: DateTime<Utc>) -> Result<(), TraderError> {
        let (_, candle) = self.client.recent_candle(&self.symbol).await?;
        let transaction = self.strategy.propose(now, &candle)?.into_iter().next();

        if let Some(tx) = transaction {
            let request = OrderRequest {
                symbol: self.symbol.clone(),
                side: tx.side,
                order_type: OrderType::Limit,
                quantity: tx.amount * Decimal::from(self.strategy.leverage()),
                price: tx.price,
            };
            let ack = self.client.place_order(&request).await?;
            info!(order_id = ack.order_id, %tx, "주문 제출 완료");

            if let Some(notifier) = &self.notifier {
                notifier
                    .notify(&[
                        ("Time", format_datetime(now, quant_core::time::default_timezone())),
                        ("Transaction", tx.to_string()),
                    ])
                    .await;
            }

            if let Some(action) = self.current_action.as_mut() {
                action.order = Some(Order::from_ack(ack, tx));
            }
        }

        if let Some(action) = &self.current_action {
            quant_core::dump_json(action, &self.paths.action_path)?;
        }
        Ok(())
    }

    /// 현재 Action을 한 번 대사합니다. 종결이면 `true`.
    ///
    /// 이미 FILLED인 Action은 거래소 조회 없이 즉시 종결로 처리되므로
    /// 원장 반영은 체결 확인 시점에 정확히 한 번만 일어납니다.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> Result<bool, TraderError> {
        let Some(action) = self.current_action.as_mut() else {
            return Ok(true);
        };
        // 주문 없는 의사결정은 즉시 종결
        let Some(order) = action.order.as_mut() else {
            return Ok(true);
        };
        // 종결 상태 가드: FILLED 이후에는 다시 조회하지 않는다
        if order.is_filled() {
            return Ok(true);
        }

        let update = self.client.query_order(&self.symbol, order.order_id).await?;
        order.update_status(update.status);

        if order.is_filled() {
            let mut tx = order.expected_transaction;
            tx.amount *= Decimal::from(self.strategy.leverage());
            tx.price = update.price;

            info!(order_id = order.order_id, %tx, "체결 확인, 원장 반영");
            self.strategy.apply_fill(tx);
            quant_core::dump_json(&self.strategy.snapshots().to_vec(), &self.paths.results_path)?;
            return Ok(true);
        }

        if (now - order.order_time).num_seconds() >= ORDER_TIMEOUT_SECS {
            let order_id = order.order_id;
            warn!(order_id, "체결 시간 초과, 주문 취소");
            // 취소는 best-effort: 실패해도 종료 경로는 같다
            if let Err(e) = self.client.cancel_order(&self.symbol, order_id).await {
                warn!(error = %e, "주문 취소 실패");
            }
            if let Some(notifier) = &self.notifier {
                notifier
                    .notify(&[("Message", "Order was cancelled".to_string())])
                    .await;
            }
            return Err(TraderError::OrderTimeout { order_id });
        }

        Ok(false)
    }
}
