//! `fetch` 서브커맨드: 과거 캔들 수집.

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing::info;

use quant_data::KlineFetcher;

use crate::config::AppConfig;

pub async fn run(
    config: &AppConfig,
    symbol: &str,
    start_time: &str,
    end_time: Option<&str>,
    interval: u32,
) -> anyhow::Result<()> {
    let start = config.parse_time(start_time)?;
    let end = match end_time {
        Some(raw) => config.parse_time(raw)?,
        // 마지막 완성 캔들까지만
        None => Utc::now() - Duration::minutes(1),
    };

    let fetcher = KlineFetcher::new();
    let store = fetcher
        .fetch_range(&symbol.to_uppercase(), interval, start, end)
        .await
        .context("캔들 수집 실패")?;

    let path = config.prices_path(symbol);
    store.save(&path).context("캔들 저장 실패")?;
    info!(candles = store.len(), path = %path.display(), "캔들 수집 완료");
    Ok(())
}
