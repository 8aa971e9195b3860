//! 데이터 계층 오류 타입.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// 데이터 계층 오류.
///
/// 필요한 시각의 캔들/지표 누락은 해당 실행에 치명적입니다.
/// 보간은 수행하지 않습니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// 필요한 시각의 캔들이 없음
    #[error("캔들 데이터 공백: {time}")]
    Gap { time: DateTime<Utc> },

    /// 필요한 시각의 지표 값이 없음
    #[error("지표 데이터 공백: {time}")]
    IndicatorGap { time: DateTime<Utc> },

    /// 비어 있는 구간 요청
    #[error("요청한 구간에 데이터가 없습니다")]
    Empty,

    /// HTTP 요청 실패
    #[error("시세 요청 실패: {0}")]
    Network(#[from] reqwest::Error),

    /// 거래소 API가 비정상 상태 코드를 반환
    #[error("시세 API 오류 (status {status}): {body}")]
    Api { status: u16, body: String },

    /// 응답 행 파싱 실패
    #[error("캔들 응답 파싱 실패: {0}")]
    BadRow(String),

    /// 저장 파일 입출력 실패
    #[error(transparent)]
    Json(#[from] quant_core::JsonError),
}
