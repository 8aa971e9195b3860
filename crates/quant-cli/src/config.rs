//! 환경변수 기반 애플리케이션 설정.
//!
//! 프로세스 시작 시 한 번 구성해 참조로 전달합니다. 코어 로직은
//! 전역 환경을 직접 조회하지 않습니다.

use std::path::PathBuf;

use anyhow::Context;
use chrono_tz::Tz;

/// 루트 경로와 타임존 설정.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 캔들/지표 데이터 루트
    pub data_root: PathBuf,
    /// 백테스트 결과 루트
    pub results_root: PathBuf,
    /// 실거래 상태 루트
    pub status_root: PathBuf,
    /// 운영자 입력 시각의 타임존
    pub timezone: Tz,
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).unwrap_or_else(|_| default.to_string()).into()
}

impl AppConfig {
    /// `DATA_ROOT` / `RESULTS_ROOT` / `STATUS_ROOT` / `TIMEZONE`
    /// 환경 변수에서 설정을 만듭니다. 모두 기본값이 있습니다.
    pub fn from_env() -> anyhow::Result<Self> {
        let timezone = match std::env::var("TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("잘못된 TIMEZONE: {e}"))?,
            Err(_) => quant_core::time::default_timezone(),
        };

        Ok(Self {
            data_root: env_path("DATA_ROOT", "data"),
            results_root: env_path("RESULTS_ROOT", "results"),
            status_root: env_path("STATUS_ROOT", "status"),
            timezone,
        })
    }

    /// 시각 문자열을 설정 타임존 기준으로 파싱합니다.
    pub fn parse_time(&self, input: &str) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
        quant_core::parse_datetime(input, self.timezone).context("시각 파싱 실패")
    }

    /// 1분봉 저장 경로: `<data>/<symbol>/prices.json`
    pub fn prices_path(&self, symbol: &str) -> PathBuf {
        self.data_root.join(symbol.to_lowercase()).join("prices.json")
    }

    /// KDJ 시리즈 저장 경로: `<data>/<symbol>/kdj_<interval>m.json`
    pub fn kdj_path(&self, symbol: &str, interval: u32) -> PathBuf {
        self.data_root
            .join(symbol.to_lowercase())
            .join(format!("kdj_{interval}m.json"))
    }

    /// 백테스트 결과 디렉터리: `<results>/<strategy>/`
    pub fn results_dir(&self, strategy_name: &str) -> PathBuf {
        self.results_root.join(strategy_name)
    }

    /// 실거래 영속 경로 묶음.
    pub fn trader_paths(&self, strategy_name: &str, symbol: &str) -> quant_trader::TraderPaths {
        let status_dir = self
            .status_root
            .join("trader")
            .join(strategy_name)
            .join(symbol.to_lowercase());
        let results_dir = self
            .results_root
            .join("trader")
            .join(strategy_name)
            .join(symbol.to_lowercase());
        quant_trader::TraderPaths {
            action_path: status_dir.join("last_action.json"),
            state_path: status_dir.join("state.json"),
            results_path: results_dir.join("result.json"),
        }
    }
}
