//! Binance 선물 과거 캔들 수집기.
//!
//! 요청당 최대 1000개 제한에 맞춰 구간을 endTime 배치로 나누고,
//! 배치들을 동시에 요청한 뒤 하나의 시간 정렬 저장소로 병합합니다.
//! 병합이 끝나기 전에는 호출자에게 아무것도 반환하지 않으므로
//! 코어는 부분 데이터를 보지 못합니다.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use quant_core::Candle;

use crate::error::DataError;
use crate::store::CandleStore;

/// Binance USDT-M 선물 REST 엔드포인트.
pub const BINANCE_FUTURES_API: &str = "https://fapi.binance.com";

/// 요청당 최대 캔들 수.
const MAX_KLINES_PER_REQUEST: i64 = 1000;

/// Binance kline 응답 행.
///
/// `[open_time, open, high, low, close, volume, close_time, ...]`
/// 형태의 혼합 배열이며, 뒤쪽 필드는 사용하지 않습니다.
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    #[serde(default)] serde_json::Value,
    #[serde(default)] serde_json::Value,
    #[serde(default)] serde_json::Value,
    #[serde(default)] serde_json::Value,
    #[serde(default)] serde_json::Value,
    #[serde(default)] serde_json::Value,
    #[serde(default)] serde_json::Value,
);

impl RawKline {
    fn into_entry(self) -> Result<(i64, Candle), DataError> {
        let parse = |s: &str| {
            Decimal::from_str(s).map_err(|e| DataError::BadRow(format!("{s}: {e}")))
        };
        let candle = Candle::new(parse(&self.1)?, parse(&self.2)?, parse(&self.3)?, parse(&self.4)?)
            .map_err(|e| DataError::BadRow(e.to_string()))?;
        Ok((self.0 / 1000, candle))
    }
}

/// 과거 캔들 수집기.
pub struct KlineFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl KlineFetcher {
    pub fn new() -> Self {
        Self::with_base_url(BINANCE_FUTURES_API.to_string())
    }

    /// 테스트/프록시용 베이스 URL 지정 생성자.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// `[start, end]` 구간의 캔들을 수집해 시간 정렬 저장소로 반환합니다.
    ///
    /// `interval_mins` 분 간격으로 수집하며, 배치 요청은 동시에 수행되고
    /// 모두 완료된 뒤에야 병합 결과가 반환됩니다.
    pub async fn fetch_range(
        &self,
        symbol: &str,
        interval_mins: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CandleStore, DataError> {
        if end < start {
            return Err(DataError::Empty);
        }
        let step_secs = i64::from(interval_mins) * 60;
        let total = (end.timestamp() - start.timestamp()) / step_secs + 1;
        let end_times = split_end_times(total, end.timestamp() * 1000, step_secs);

        info!(
            symbol,
            interval_mins,
            batches = end_times.len(),
            total,
            "과거 캔들 수집 시작"
        );

        let batches = try_join_all(
            end_times
                .iter()
                .map(|&end_ms| self.fetch_batch(symbol, interval_mins, end_ms)),
        )
        .await?;

        let mut merged: BTreeMap<i64, Candle> = BTreeMap::new();
        for batch in batches {
            merged.extend(batch);
        }

        let mut store = CandleStore::with_step(step_secs);
        let (start_ts, end_ts) = (start.timestamp(), end.timestamp());
        for (ts, candle) in merged {
            if ts >= start_ts && ts <= end_ts {
                store.insert(ts, candle);
            }
        }
        debug!(candles = store.len(), "캔들 병합 완료");
        Ok(store)
    }

    /// endTime 기준 한 배치를 요청합니다.
    async fn fetch_batch(
        &self,
        symbol: &str,
        interval_mins: u32,
        end_time_ms: i64,
    ) -> Result<Vec<(i64, Candle)>, DataError> {
        let url = format!("{}/fapi/v1/klines", self.base_url);
        let interval = format!("{interval_mins}m");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("limit", &MAX_KLINES_PER_REQUEST.to_string()),
                ("endTime", &end_time_ms.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let rows: Vec<RawKline> = response.json().await?;
        rows.into_iter().map(RawKline::into_entry).collect()
    }
}

impl Default for KlineFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// 전체 수집량을 배치별 endTime(ms) 목록으로 나눕니다.
///
/// 최신 구간부터 `MAX_KLINES_PER_REQUEST` 개씩 과거로 거슬러 갑니다.
fn split_end_times(total: i64, end_ms: i64, step_secs: i64) -> Vec<i64> {
    let mut end_times = Vec::new();
    let mut offset = 0;
    while offset < total {
        end_times.push(end_ms - offset * step_secs * 1000);
        offset += MAX_KLINES_PER_REQUEST;
    }
    end_times
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_covers_whole_range() {
        let end_ms = 1_700_000_000_000;
        let times = split_end_times(2500, end_ms, 60);
        assert_eq!(times.len(), 3);
        assert_eq!(times[0], end_ms);
        assert_eq!(times[1], end_ms - 1000 * 60_000);
        assert_eq!(times[2], end_ms - 2000 * 60_000);
    }

    #[test]
    fn single_batch_for_small_range() {
        assert_eq!(split_end_times(10, 1_000_000, 60).len(), 1);
    }

    #[tokio::test]
    async fn fetch_batch_parses_rows() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!([
            [1700000040000i64, "100.1", "110.5", "95.0", "105.2", "12.3", 1700000099999i64,
             "0", 10, "0", "0", "0"],
            [1700000100000i64, "105.2", "108.0", "101.0", "102.5", "8.1", 1700000159999i64,
             "0", 7, "0", "0", "0"]
        ]);
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/fapi/v1/klines.*".into()))
            .match_query(mockito::Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let fetcher = KlineFetcher::with_base_url(server.url());
        let rows = fetcher
            .fetch_batch("BTCUSDT", 1, 1700000100000)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1700000040);
        assert_eq!(rows[0].1.open.to_string(), "100.1");
        assert_eq!(rows[1].1.close.to_string(), "102.5");
    }

    #[tokio::test]
    async fn fetch_batch_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex(r"^/fapi/v1/klines.*".into()))
            .with_status(429)
            .with_body("{\"code\":-1003}")
            .create_async()
            .await;

        let fetcher = KlineFetcher::with_base_url(server.url());
        let err = fetcher.fetch_batch("BTCUSDT", 1, 1_700_000_000_000).await;
        assert!(matches!(err, Err(DataError::Api { status: 429, .. })));
    }
}
