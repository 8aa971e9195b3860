//! Slack 알림 서비스.
//!
//! Slack Incoming Webhook으로 거래/취소 이벤트를 전송합니다.
//! 설정이 없으면 조용히 비활성화되며, 전송 실패가 트레이딩을
//! 중단시키지 않도록 호출 측에서 best-effort로 다룹니다.

pub mod slack;

pub use slack::{NotificationError, SlackConfig, SlackNotifier};
