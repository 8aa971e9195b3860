//! 시각 파싱/포맷 헬퍼.
//!
//! 운영자 입력("YYYY-MM-DD HH:MM:SS")은 설정된 타임존 기준으로
//! 해석하고, 내부 표현은 항상 `DateTime<Utc>`입니다.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// 캔들 간격 (초).
pub const CANDLE_STEP_SECS: i64 = 60;

/// 입력 시각 포맷.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 기본 타임존.
pub fn default_timezone() -> Tz {
    chrono_tz::Asia::Taipei
}

/// 시각 파싱 오류.
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("시각 파싱 실패 ({input}): {source}")]
    Parse {
        input: String,
        source: chrono::ParseError,
    },

    /// 서머타임 경계 등으로 로컬 시각이 모호하거나 존재하지 않음
    #[error("타임존 {tz}에서 모호한 로컬 시각: {input}")]
    Ambiguous { input: String, tz: Tz },
}

/// `"YYYY-MM-DD HH:MM:SS"` 문자열을 지정 타임존 기준 UTC 시각으로 파싱합니다.
pub fn parse_datetime(input: &str, tz: Tz) -> Result<DateTime<Utc>, TimeError> {
    let naive =
        NaiveDateTime::parse_from_str(input, DATETIME_FORMAT).map_err(|source| TimeError::Parse {
            input: input.to_string(),
            source,
        })?;
    tz.from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| TimeError::Ambiguous {
            input: input.to_string(),
            tz,
        })
}

/// UTC 시각을 지정 타임존의 `"YYYY-MM-DD HH:MM:SS"` 문자열로 포맷합니다.
pub fn format_datetime(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz).format(DATETIME_FORMAT).to_string()
}
