//! 전략 설정 레지스트리.
//!
//! `{ "name": ..., "config": {...} }` 형태의 JSON으로 구체 전략 하나를
//! 선택합니다. 알 수 없는 이름이나 잘못된 파라미터는 즉시 치명적인
//! 설정 오류입니다.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;
use crate::grid::GridConfig;
use crate::oscillator::OscillatorConfig;
use crate::periodic::PeriodicConfig;

/// 이름 태그로 선택되는 전략 설정 (닫힌 집합).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", content = "config", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// 그리드 트레이딩
    GridTrading(GridConfig),
    /// 주기 매수 적립
    Dca(PeriodicConfig),
    /// 주기 매도 적립
    GoingShort(PeriodicConfig),
    /// KDJ 임계값
    KdjTime(OscillatorConfig),
}

impl StrategyConfig {
    /// 설정 파일을 읽습니다. 파싱 실패는 설정 오류로 보고합니다.
    pub fn load(path: &Path) -> Result<Self, StrategyError> {
        let config: StrategyConfig = quant_core::load_json(path)
            .map_err(|e| StrategyError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// 전략 이름 (결과 경로 등에 사용).
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::GridTrading(_) => "grid_trading",
            StrategyConfig::Dca(_) => "dca",
            StrategyConfig::GoingShort(_) => "going_short",
            StrategyConfig::KdjTime(_) => "kdj_time",
        }
    }

    pub fn budget(&self) -> Decimal {
        match self {
            StrategyConfig::GridTrading(c) => c.budget,
            StrategyConfig::Dca(c) | StrategyConfig::GoingShort(c) => c.budget,
            StrategyConfig::KdjTime(c) => c.budget,
        }
    }

    pub fn leverage(&self) -> u32 {
        match self {
            StrategyConfig::GridTrading(c) => c.leverage,
            StrategyConfig::Dca(c) | StrategyConfig::GoingShort(c) => c.leverage,
            StrategyConfig::KdjTime(c) => c.leverage,
        }
    }

    /// 파라미터 검증.
    pub fn validate(&self) -> Result<(), StrategyError> {
        match self {
            StrategyConfig::GridTrading(c) => c.validate(),
            StrategyConfig::Dca(c) | StrategyConfig::GoingShort(c) => c.validate(),
            StrategyConfig::KdjTime(c) => c.validate(),
        }
    }

    /// 오실레이터 전략이 요구하는 KDJ 간격 목록 (분).
    pub fn kdj_intervals(&self) -> Vec<u32> {
        match self {
            StrategyConfig::KdjTime(c) => c.kdj_intervals.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_config() {
        let raw = r#"{
            "name": "grid_trading",
            "config": {
                "budget": 200,
                "leverage": 30,
                "highest": 75000,
                "lowest": 60000,
                "num_interval": 20,
                "amount": 0.0001
            }
        }"#;
        let config: StrategyConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.name(), "grid_trading");
        assert_eq!(config.leverage(), 30);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_name_is_rejected() {
        let raw = r#"{"name": "martingale", "config": {"budget": 1}}"#;
        assert!(serde_json::from_str::<StrategyConfig>(raw).is_err());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let raw = r#"{"name": "dca", "config": {"budget": 500}}"#;
        let config: StrategyConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.leverage(), 1);
        config.validate().unwrap();
    }
}
