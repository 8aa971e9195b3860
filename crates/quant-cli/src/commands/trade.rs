//! `trade` 서브커맨드: 실거래 루프 1회 실행.
//!
//! 주문 타임아웃은 취소 후 치명적 종료입니다. 재시작은 운영자의
//! 몫이며, 저장된 전략 상태에서 이어집니다.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use quant_data::IndicatorSeries;
use quant_exchange::{BinanceConfig, BinanceFuturesClient, ExchangeClient};
use quant_notification::SlackNotifier;
use quant_strategy::{Strategy, StrategyConfig};
use quant_trader::Trader;

use crate::config::AppConfig;

pub async fn run(
    config: &AppConfig,
    symbol: &str,
    strategy_config_path: &str,
) -> anyhow::Result<()> {
    let strategy_config = StrategyConfig::load(Path::new(strategy_config_path))?;
    let paths = config.trader_paths(strategy_config.name(), symbol);

    // 저장된 상태가 있으면 이어서, 없으면 새로 시작
    let mut strategy = if paths.state_path.exists() {
        info!(path = %paths.state_path.display(), "전략 상태 복원");
        Strategy::load(&paths.state_path)?
    } else {
        Strategy::from_config(&strategy_config)?
    };

    // 오실레이터 전략은 사전 계산된 KDJ 시리즈를 다시 주입해야 한다
    let intervals = strategy_config.kdj_intervals();
    if !intervals.is_empty() {
        let mut series = HashMap::new();
        for interval in intervals {
            let path = config.kdj_path(symbol, interval);
            let loaded = IndicatorSeries::load(&path).with_context(|| {
                format!("KDJ 시리즈 로드 실패 ({}): 먼저 `quant kdj`를 실행하세요", path.display())
            })?;
            series.insert(interval, loaded);
        }
        strategy.attach_indicators(series);
    }

    let binance_config =
        BinanceConfig::from_env().context("API_KEY / SECRET_KEY 환경 변수가 필요합니다")?;
    let client = BinanceFuturesClient::new(binance_config);
    client
        .change_leverage(&symbol.to_uppercase(), strategy.leverage())
        .await
        .context("레버리지 변경 실패")?;

    let notifier = SlackNotifier::from_env();
    if notifier.is_none() {
        warn!("SLACK_WEBHOOK_URL 미설정: 알림 비활성화");
    }

    let mut trader = Trader::new(strategy, symbol.to_string(), client, notifier, paths);
    trader.run().await.context("실거래 루프 종료 (치명적)")?;
    Ok(())
}
