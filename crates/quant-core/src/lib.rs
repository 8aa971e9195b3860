//! 트레이딩 시스템 핵심 도메인 타입.
//!
//! 분봉 캔들, 거래, 포지션 원장(TransactionFlow), 스냅샷 기록,
//! 슬라이딩 윈도우 극값 추적기 등 모든 크레이트가 공유하는
//! 순수 값 타입을 제공합니다.
//!
//! 이 crate는 동기/순수 코드만 포함합니다. 네트워크, 파일 경로 결정,
//! 전략 로직은 상위 크레이트의 책임입니다.

pub mod candle;
pub mod flow;
pub mod json;
pub mod snapshot;
pub mod time;
pub mod time_value;
pub mod transaction;

pub use candle::{Candle, CandleError};
pub use flow::{FlowDump, LedgerError, TransactionFlow};
pub use json::{load_json, dump_json, JsonError};
pub use snapshot::{ProfitPoint, TransactionSnapshot};
pub use time::{format_datetime, parse_datetime, TimeError, CANDLE_STEP_SECS};
pub use time_value::{TimeValue, TimeValueWindow};
pub use transaction::{Side, Transaction};
