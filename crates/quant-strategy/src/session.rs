//! 전략 실행 래퍼.
//!
//! 변형의 의사결정을 원장에 반영하는 공통 경로입니다. 레버리지 적용,
//! 예산 가드, 커밋, 스냅샷 기록이 모두 여기서 일어나며, 변형 자신은
//! 원장을 건드리지 않습니다.
//!
//! 백테스트는 [`Strategy::on_candle`]로 제안 즉시 커밋하고, 실거래는
//! [`Strategy::propose`]로 의도만 만든 뒤 체결 확인 시
//! [`Strategy::apply_fill`]로 한 번 커밋합니다.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use quant_core::{Candle, Transaction, TransactionFlow, TransactionSnapshot};
use quant_data::IndicatorSeries;

use crate::config::StrategyConfig;
use crate::decision::{DecisionKind, SessionView};
use crate::error::StrategyError;
use crate::grid::GridDecision;
use crate::oscillator::OscillatorDecision;
use crate::periodic::PeriodicDecision;

/// 예산 가드와 원장을 소유한 전략 세션.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    name: String,
    original_budget: Decimal,
    leverage: u32,
    flow: TransactionFlow,
    snapshots: Vec<TransactionSnapshot>,
    kind: DecisionKind,
}

impl Strategy {
    /// 설정으로부터 전략을 만듭니다.
    pub fn from_config(config: &StrategyConfig) -> Result<Self, StrategyError> {
        use quant_core::Side;

        let kind = match config {
            StrategyConfig::GridTrading(c) => DecisionKind::Grid(GridDecision::new(c)?),
            StrategyConfig::Dca(c) => {
                DecisionKind::Periodic(PeriodicDecision::new(Side::Buy, c)?)
            }
            StrategyConfig::GoingShort(c) => {
                DecisionKind::Periodic(PeriodicDecision::new(Side::Sell, c)?)
            }
            StrategyConfig::KdjTime(c) => {
                DecisionKind::Oscillator(OscillatorDecision::new(c)?)
            }
        };

        Ok(Self {
            name: config.name().to_string(),
            original_budget: config.budget(),
            leverage: config.leverage().max(1),
            flow: TransactionFlow::new(),
            snapshots: Vec::new(),
            kind,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn leverage(&self) -> u32 {
        self.leverage
    }

    pub fn original_budget(&self) -> Decimal {
        self.original_budget
    }

    pub fn flow(&self) -> &TransactionFlow {
        &self.flow
    }

    pub fn snapshots(&self) -> &[TransactionSnapshot] {
        &self.snapshots
    }

    /// 마지막으로 기록된 거래의 시각.
    pub fn last_trade_time(&self) -> Option<DateTime<Utc>> {
        self.snapshots
            .iter()
            .rev()
            .find(|s| s.transaction.is_some())
            .map(|s| s.time)
    }

    /// 현재 원장 기준 지급 능력 검사.
    pub fn check_budget(&self, mark_price: Decimal) -> bool {
        self.budget_holds(&self.flow, mark_price)
    }

    fn budget_holds(&self, flow: &TransactionFlow, mark_price: Decimal) -> bool {
        self.original_budget + flow.net_profit(mark_price) > Decimal::ZERO
    }

    /// 커밋 없이 거래 의도만 만듭니다 (실거래 경로).
    pub fn propose(
        &mut self,
        time: DateTime<Utc>,
        candle: &Candle,
    ) -> Result<Vec<Transaction>, StrategyError> {
        let last_trade_time = self.last_trade_time();
        let view = SessionView {
            flow: &self.flow,
            leverage: self.leverage,
            last_trade_time,
        };
        self.kind.decide(&view, time, candle)
    }

    /// 한 캔들을 처리합니다 (백테스트 경로).
    ///
    /// 제안된 거래를 순서대로 레버리지 적용 → 예산 가드 → 커밋하며,
    /// 예산을 깨뜨리는 첫 거래에서 배치 전체를 중단합니다.
    /// 커밋된 거래 수를 반환합니다.
    pub fn on_candle(
        &mut self,
        time: DateTime<Utc>,
        candle: &Candle,
    ) -> Result<usize, StrategyError> {
        let proposals = self.propose(time, candle)?;
        let mut committed = 0;

        for tx in proposals {
            let tx = tx.with_leverage(self.leverage);
            let candidate = self.flow.merge(&tx);
            if !self.budget_holds(&candidate, candle.close) {
                warn!(%tx, "예산 부족: 배치의 남은 거래를 버립니다");
                break;
            }
            self.flow = candidate;
            self.snapshots
                .push(TransactionSnapshot::with_trade(time, candle.close, tx, &self.flow));
            committed += 1;
        }
        Ok(committed)
    }

    /// 체결 확정 거래를 원장에 정확히 한 번 반영합니다 (실거래 경로).
    ///
    /// 호출자는 레버리지와 체결 가격이 이미 반영된 거래를 넘깁니다.
    pub fn apply_fill(&mut self, tx: Transaction) {
        self.flow = self.flow.merge(&tx);
        self.snapshots
            .push(TransactionSnapshot::with_trade(tx.time, tx.price, tx, &self.flow));
    }

    /// 거래 없이 현재 시세 기준 스냅샷을 기록합니다 (구간 종료 등).
    pub fn record_mark(&mut self, time: DateTime<Utc>, mark_price: Decimal) {
        self.snapshots
            .push(TransactionSnapshot::mark(time, mark_price, &self.flow));
    }

    /// 오실레이터 변형에 지표 시리즈를 주입합니다.
    ///
    /// 상태 파일에서 복원한 뒤에도 다시 호출해야 합니다.
    pub fn attach_indicators(&mut self, series: HashMap<u32, IndicatorSeries>) {
        self.kind.attach_indicators(series);
    }

    /// 전략 상태를 파일로 저장합니다 (전체 쓰기).
    pub fn save(&self, path: &Path) -> Result<(), StrategyError> {
        quant_core::dump_json(self, path)?;
        Ok(())
    }

    /// 저장된 상태에서 전략을 복원합니다.
    ///
    /// 동일한 미래 캔들에 대해 저장 전과 동일한 결정을 재현합니다.
    pub fn load(path: &Path) -> Result<Self, StrategyError> {
        Ok(quant_core::load_json(path)?)
    }
}
