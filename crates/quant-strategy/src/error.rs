//! 전략 계층 오류 타입.

use thiserror::Error;

/// 전략 오류.
///
/// 설정 오류는 즉시 치명적이며 재시도하지 않습니다.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// 알 수 없는 전략 이름 또는 잘못된 파라미터
    #[error("전략 설정 오류: {0}")]
    Config(String),

    /// 오실레이터 전략에 지표 시리즈가 주입되지 않음
    #[error("{interval}분 간격의 지표 시리즈가 주입되지 않았습니다")]
    MissingIndicator { interval: u32 },

    /// 데이터 공백 (지표/캔들)
    #[error(transparent)]
    Data(#[from] quant_data::DataError),

    /// 원장 병합 오류
    #[error(transparent)]
    Ledger(#[from] quant_core::LedgerError),

    /// 상태 저장/복원 실패
    #[error(transparent)]
    Json(#[from] quant_core::JsonError),
}
