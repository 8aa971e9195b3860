//! `kdj` 서브커맨드: KDJ 지표 사전 계산.

use anyhow::Context;
use tracing::info;

use quant_data::{CandleStore, KdjCalculator};

use crate::config::AppConfig;

pub fn run(config: &AppConfig, symbol: &str, intervals: &[u32]) -> anyhow::Result<()> {
    let prices_path = config.prices_path(symbol);
    let store = CandleStore::load(&prices_path)
        .with_context(|| format!("캔들 저장소 로드 실패: {}", prices_path.display()))?;

    let calculator = KdjCalculator::new();
    for &interval in intervals {
        let resampled = store.resample(interval);
        let series = calculator.calculate(&resampled);
        let path = config.kdj_path(symbol, interval);
        series.save(&path).context("KDJ 시리즈 저장 실패")?;
        info!(interval, points = series.len(), path = %path.display(), "KDJ 계산 완료");
    }
    Ok(())
}
