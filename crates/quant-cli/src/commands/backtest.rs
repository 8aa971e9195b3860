//! `backtest` 서브커맨드.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::DateTime;
use tracing::info;

use quant_backtest::{BacktestConfig, Backtester};
use quant_data::{CandleStore, KdjCalculator};
use quant_strategy::{Strategy, StrategyConfig};

use crate::commands::fetch;
use crate::config::AppConfig;

pub async fn run(
    config: &AppConfig,
    symbol: &str,
    start_time: &str,
    end_time: Option<&str>,
    strategy_config_path: &str,
    fetch_price: bool,
) -> anyhow::Result<()> {
    if fetch_price {
        info!("백테스트 전 캔들 수집");
        fetch::run(config, symbol, start_time, end_time, 1).await?;
    }

    let prices_path = config.prices_path(symbol);
    let store = CandleStore::load(&prices_path)
        .with_context(|| format!("캔들 저장소 로드 실패: {}", prices_path.display()))?;

    let start = config.parse_time(start_time)?;
    let end = match end_time {
        Some(raw) => config.parse_time(raw)?,
        None => store
            .last_timestamp()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .context("캔들 저장소가 비어 있습니다")?,
    };
    // 구간 연속성 검증: 공백이 있으면 여기서 치명적으로 실패한다
    let candles = store.slice(start, end).context("캔들 구간 슬라이스 실패")?;

    let strategy_config = StrategyConfig::load(Path::new(strategy_config_path))?;
    let mut strategy = Strategy::from_config(&strategy_config)?;

    // 오실레이터 전략이면 전체 저장소 기준으로 지표를 계산해 주입
    let intervals = strategy_config.kdj_intervals();
    if !intervals.is_empty() {
        let calculator = KdjCalculator::new();
        let mut series = HashMap::new();
        for interval in intervals {
            series.insert(interval, calculator.calculate(&store.resample(interval)));
        }
        strategy.attach_indicators(series);
    }

    let report = Backtester::new(BacktestConfig::default())
        .run(&mut strategy, &candles)
        .context("백테스트 실행 실패")?;

    println!("{}", report.summary());

    let results_dir = config.results_dir(strategy.name());
    report.persist(&results_dir).context("결과 저장 실패")?;
    Ok(())
}
