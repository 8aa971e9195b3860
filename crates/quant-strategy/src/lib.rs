//! 규칙 기반 트레이딩 전략.
//!
//! 전략은 닫힌 변형 집합으로 구성됩니다:
//!
//! - **그리드**: 가격 대역을 고정 폭 레벨로 나눠 하락에 매수,
//!   상승에 매도 ([`grid`])
//! - **주기 적립**: 일정 시간 간격으로 고정 명목가 거래 ([`periodic`])
//! - **오실레이터 임계값**: KDJ 과매수/과매도 신호 기반 ([`oscillator`])
//!
//! 모든 변형은 [`Strategy`] 래퍼를 통해 실행됩니다. 래퍼가 레버리지
//! 적용, 예산 가드, 원장 커밋, 스냅샷 기록을 담당하고 변형은
//! 순수한 의사결정만 합니다.

pub mod config;
pub mod decision;
pub mod error;
pub mod grid;
pub mod oscillator;
pub mod periodic;
pub mod session;

pub use config::StrategyConfig;
pub use decision::{DecisionKind, SessionView};
pub use error::StrategyError;
pub use grid::{GridConfig, GridDecision};
pub use oscillator::{OscillatorConfig, OscillatorDecision};
pub use periodic::{PeriodicConfig, PeriodicDecision};
pub use session::Strategy;
