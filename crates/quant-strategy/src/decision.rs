//! 전략 변형의 공통 의사결정 인터페이스.
//!
//! 개방형 상속 대신 닫힌 태그 변형 집합으로 구현합니다. 각 변형은
//! 자기만의 상태 구조체를 소유하며 상태를 공유하지 않습니다.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quant_core::{Candle, Transaction, TransactionFlow};
use quant_data::IndicatorSeries;

use crate::error::StrategyError;
use crate::grid::GridDecision;
use crate::oscillator::OscillatorDecision;
use crate::periodic::PeriodicDecision;

/// 의사결정 시 변형에게 보여주는 세션 읽기 전용 뷰.
///
/// 변형은 이 뷰와 자신의 내부 상태만으로 거래 의도를 만듭니다.
/// 원장 변경은 래퍼([`crate::Strategy`])의 몫입니다.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    /// 현재 원장
    pub flow: &'a TransactionFlow,
    /// 세션 레버리지
    pub leverage: u32,
    /// 마지막으로 기록된 거래 시각
    pub last_trade_time: Option<DateTime<Utc>>,
}

/// 전략 변형 (닫힌 집합).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionKind {
    Grid(GridDecision),
    Periodic(PeriodicDecision),
    Oscillator(OscillatorDecision),
}

impl DecisionKind {
    /// 현재 상태 + 입력 캔들로부터 0개 이상의 거래 의도를 만듭니다.
    pub fn decide(
        &mut self,
        view: &SessionView<'_>,
        time: DateTime<Utc>,
        candle: &Candle,
    ) -> Result<Vec<Transaction>, StrategyError> {
        match self {
            DecisionKind::Grid(grid) => Ok(grid.decide(time, candle)),
            DecisionKind::Periodic(periodic) => Ok(periodic.decide(view, time, candle)),
            DecisionKind::Oscillator(oscillator) => oscillator.decide(view, time, candle),
        }
    }

    /// 오실레이터 변형에 지표 시리즈를 주입합니다. 다른 변형에는 무시됩니다.
    pub fn attach_indicators(&mut self, series: HashMap<u32, IndicatorSeries>) {
        if let DecisionKind::Oscillator(oscillator) = self {
            oscillator.attach_indicators(series);
        }
    }
}
