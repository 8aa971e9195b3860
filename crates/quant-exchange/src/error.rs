//! 거래소 클라이언트 오류 타입.

use thiserror::Error;

/// 거래소 API 오류.
///
/// 이 오류는 호출 루프 안에서 재시도하지 않습니다. 상위로 전파되어
/// 실행을 멈춥니다.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/전송 오류
    #[error("거래소 네트워크 오류: {0}")]
    Network(#[from] reqwest::Error),

    /// 비정상 상태 코드 응답
    #[error("거래소 API 오류 (status {status}): {body}")]
    Api { status: u16, body: String },

    /// 응답 본문 파싱 실패
    #[error("거래소 응답 파싱 실패: {0}")]
    Parse(String),

    /// 알 수 없는 주문
    #[error("주문을 찾을 수 없습니다: {order_id}")]
    UnknownOrder { order_id: i64 },
}
