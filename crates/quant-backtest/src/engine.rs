//! 백테스트 드라이버.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use quant_core::{Candle, ProfitPoint, TransactionSnapshot};
use quant_data::CandleStore;
use quant_strategy::{Strategy, StrategyError};

use crate::swing::SwingTracker;

/// 백테스트 오류.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// 캔들 데이터 없음
    #[error("캔들 데이터가 비어있습니다")]
    EmptyData,

    /// 전략 실행 오류 (설정/지표 공백 등)
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// 결과 저장 실패
    #[error(transparent)]
    Json(#[from] quant_core::JsonError),
}

/// 백테스트 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// 낙폭/상승폭 통계의 슬라이딩 윈도우 크기 (스텝)
    #[serde(default = "default_swing_window")]
    pub swing_window: usize,
}

fn default_swing_window() -> usize {
    60
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            swing_window: default_swing_window(),
        }
    }
}

/// 백테스트 결과.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// 전략 이름
    pub strategy_name: String,
    /// 거래 스냅샷 로그 (시간순)
    pub snapshots: Vec<TransactionSnapshot>,
    /// 순손익 이력 (스텝당 1개)
    pub profit_history: Vec<ProfitPoint>,
    /// 지급 불능으로 조기 종료된 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bankrupt_at: Option<DateTime<Utc>>,
    /// 윈도우 내 최대 낙폭
    pub max_profit_drop: Decimal,
    /// 윈도우 내 최대 상승폭
    pub max_profit_gain: Decimal,
    /// 구간 시작
    pub start_time: DateTime<Utc>,
    /// 구간 끝 (조기 종료 시 종료 시각)
    pub end_time: DateTime<Utc>,
    /// 처리한 캔들 수
    pub data_points: usize,
}

impl BacktestReport {
    /// 요약 문자열.
    pub fn summary(&self) -> String {
        let final_profit = self
            .profit_history
            .last()
            .map(|p| p.net_profit)
            .unwrap_or_default();
        let trades = self
            .snapshots
            .iter()
            .filter(|s| s.transaction.is_some())
            .count();

        format!(
            "백테스트 결과 [{}]\n\
             ───────────────────────────────\n\
             구간: {} → {} ({} 캔들)\n\
             거래 수: {}\n\
             최종 순손익: {}\n\
             최대 낙폭: {} / 최대 상승폭: {}\n\
             조기 종료: {}",
            self.strategy_name,
            self.start_time,
            self.end_time,
            self.data_points,
            trades,
            final_profit,
            self.max_profit_drop,
            self.max_profit_gain,
            self.bankrupt_at
                .map(|t| t.to_string())
                .unwrap_or_else(|| "없음".to_string()),
        )
    }

    /// 두 개의 시간순 로그를 결과 디렉터리에 저장합니다 (전체 쓰기).
    pub fn persist(&self, results_dir: &Path) -> Result<(), BacktestError> {
        quant_core::dump_json(&self.snapshots, &results_dir.join("result.json"))?;
        quant_core::dump_json(&self.profit_history, &results_dir.join("profit_history.json"))?;
        info!(dir = %results_dir.display(), "백테스트 결과 저장");
        Ok(())
    }
}

/// 백테스트 드라이버.
///
/// 캔들을 엄격한 시간순으로 한 번 순회합니다. 각 캔들마다 먼저 저가와
/// 고가 양 극단에서 지급 능력을 검사하고(캔들 내 리스크), 깨지면 그
/// 스텝의 거래 없이 조기 종료합니다. 지급 불능은 오류가 아니라 기록되는
/// 정상 종료 결과입니다.
pub struct Backtester {
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Self {
        Self { config }
    }

    /// 백테스트를 실행합니다.
    pub fn run(
        &self,
        strategy: &mut Strategy,
        candles: &CandleStore,
    ) -> Result<BacktestReport, BacktestError> {
        if candles.is_empty() {
            return Err(BacktestError::EmptyData);
        }

        let mut tracker = SwingTracker::new(self.config.swing_window);
        let mut profit_history: Vec<ProfitPoint> = Vec::with_capacity(candles.len());
        let mut bankrupt_at = None;
        let mut last_step: Option<(DateTime<Utc>, Candle)> = None;
        let mut start_time = None;

        for (time, candle) in candles.iter() {
            start_time.get_or_insert(time);

            if !strategy.check_budget(candle.low) || !strategy.check_budget(candle.high) {
                info!(time = %time, "지급 불능: 백테스트 조기 종료");
                bankrupt_at = Some(time);
                last_step = Some((time, candle));
                break;
            }

            let committed = strategy.on_candle(time, &candle)?;
            if committed > 0 {
                debug!(time = %time, committed, "거래 커밋");
            }

            let net_profit = strategy.flow().net_profit(candle.close);
            profit_history.push(ProfitPoint {
                time,
                price: candle.close,
                average_price: strategy.flow().average_price,
                net_profit,
            });
            tracker.observe(time, net_profit);
            last_step = Some((time, candle));
        }

        let (end_time, last_candle) = last_step.ok_or(BacktestError::EmptyData)?;
        strategy.record_mark(end_time, last_candle.close);

        let data_points = profit_history.len() + usize::from(bankrupt_at.is_some());
        Ok(BacktestReport {
            strategy_name: strategy.name().to_string(),
            snapshots: strategy.snapshots().to_vec(),
            profit_history,
            bankrupt_at,
            max_profit_drop: tracker.max_drop(),
            max_profit_gain: tracker.max_gain(),
            start_time: start_time.unwrap_or(end_time),
            end_time,
            data_points,
        })
    }
}

impl Default for Backtester {
    fn default() -> Self {
        Self::new(BacktestConfig::default())
    }
}
