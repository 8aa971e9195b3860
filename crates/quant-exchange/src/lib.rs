//! 거래소 클라이언트 추상화.
//!
//! 코어는 좁은 능력 집합([`ExchangeClient`])에만 의존합니다:
//! 서버 시각, 최근 캔들, 주문 제출/조회/취소, 레버리지 변경.
//! 특정 거래소 SDK에는 의존하지 않습니다.

pub mod binance;
pub mod client;
pub mod error;
pub mod mock;

pub use binance::{BinanceConfig, BinanceFuturesClient};
pub use client::{ExchangeClient, OrderAck, OrderRequest, OrderStatus, OrderType, OrderUpdate};
pub use error::ExchangeError;
pub use mock::MockExchange;
