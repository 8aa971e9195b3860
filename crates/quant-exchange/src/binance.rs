//! Binance USDT-M 선물 클라이언트.
//!
//! 서명 요청은 쿼리 문자열에 timestamp/recvWindow를 붙이고
//! HMAC-SHA256 서명을 더해 전송합니다. API 비밀키는 로그/Debug에
//! 노출되지 않습니다.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Method;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info};

use quant_core::{Candle, Side};

use crate::client::{
    ExchangeClient, OrderAck, OrderRequest, OrderStatus, OrderType, OrderUpdate,
};
use crate::error::ExchangeError;

/// 운영 엔드포인트.
pub const BINANCE_FUTURES_API: &str = "https://fapi.binance.com";

const RECV_WINDOW_MS: i64 = 5_000;

type HmacSha256 = Hmac<Sha256>;

/// Binance API 자격 증명과 엔드포인트.
#[derive(Clone)]
pub struct BinanceConfig {
    pub api_key: String,
    pub secret_key: SecretString,
    pub base_url: String,
}

impl std::fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("api_key", &"***")
            .field("secret_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BinanceConfig {
    pub fn new(api_key: String, secret_key: SecretString) -> Self {
        Self {
            api_key,
            secret_key,
            base_url: BINANCE_FUTURES_API.to_string(),
        }
    }

    /// `API_KEY` / `SECRET_KEY` 환경 변수에서 생성합니다.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("API_KEY").ok()?;
        let secret_key = std::env::var("SECRET_KEY").ok()?;
        Some(Self::new(api_key, SecretString::from(secret_key)))
    }

    /// 테스트넷/프록시용 베이스 URL 교체.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

// ==================== API 응답 타입 ====================

#[derive(Debug, Deserialize)]
struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    server_time: i64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(rename = "orderId")]
    order_id: i64,
    #[serde(rename = "updateTime")]
    update_time: i64,
    status: OrderStatus,
    price: String,
    #[serde(rename = "avgPrice", default)]
    avg_price: Option<String>,
}

/// kline 행 `[open_time, open, high, low, close, ...]`의 앞부분만 읽습니다.
#[derive(Debug, Deserialize)]
struct KlineRow(
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

fn parse_decimal(raw: &str) -> Result<Decimal, ExchangeError> {
    Decimal::from_str(raw).map_err(|e| ExchangeError::Parse(format!("{raw}: {e}")))
}

fn parse_millis(ms: i64) -> Result<DateTime<Utc>, ExchangeError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| ExchangeError::Parse(format!("잘못된 타임스탬프: {ms}")))
}

// ==================== 클라이언트 ====================

/// Binance USDT-M 선물 REST 클라이언트.
pub struct BinanceFuturesClient {
    config: BinanceConfig,
    http: reqwest::Client,
}

impl BinanceFuturesClient {
    pub fn new(config: BinanceConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// 쿼리 문자열에 대한 HMAC-SHA256 서명 (hex).
    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.config.secret_key.expose_secret().as_bytes())
            .expect("HMAC은 임의 길이 키를 허용한다");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// 서명 없는 공개 GET 요청.
    async fn public_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self.http.get(&url).query(params).send().await?;
        Self::decode(response).await
    }

    /// timestamp + 서명을 붙인 요청.
    async fn signed_request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let mut query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        query.push(format!("recvWindow={RECV_WINDOW_MS}"));
        query.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        let query = query.join("&");
        let signature = self.sign(&query);

        let url = format!(
            "{}{}?{}&signature={}",
            self.config.base_url, path, query, signature
        );
        let response = self
            .http
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.config.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ExchangeError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ExchangeError::Parse(format!("{e}: {body}")))
    }
}

#[async_trait]
impl ExchangeClient for BinanceFuturesClient {
    async fn server_time(&self) -> Result<DateTime<Utc>, ExchangeError> {
        let response: ServerTimeResponse = self.public_get("/fapi/v1/time", &[]).await?;
        parse_millis(response.server_time)
    }

    async fn recent_candle(&self, symbol: &str) -> Result<(DateTime<Utc>, Candle), ExchangeError> {
        let rows: Vec<KlineRow> = self
            .public_get(
                "/fapi/v1/klines",
                &[
                    ("symbol", symbol.to_uppercase()),
                    ("interval", "1m".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Parse("빈 kline 응답".to_string()))?;

        let candle = Candle::new(
            parse_decimal(&row.1)?,
            parse_decimal(&row.2)?,
            parse_decimal(&row.3)?,
            parse_decimal(&row.4)?,
        )
        .map_err(|e| ExchangeError::Parse(e.to_string()))?;
        Ok((parse_millis(row.0)?, candle))
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<OrderAck, ExchangeError> {
        let side = match request.side {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        };
        let order_type = match request.order_type {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
        };
        let mut params = vec![
            ("symbol", request.symbol.to_uppercase()),
            ("side", side.to_string()),
            ("type", order_type.to_string()),
            ("quantity", request.quantity.to_string()),
        ];
        if request.order_type == OrderType::Limit {
            params.push(("timeInForce", "GTC".to_string()));
            params.push(("price", format!("{:.4}", request.price)));
        }

        let response: OrderResponse = self
            .signed_request(Method::POST, "/fapi/v1/order", &params)
            .await?;
        info!(
            order_id = response.order_id,
            symbol = %request.symbol,
            side,
            "주문 제출"
        );
        Ok(OrderAck {
            order_id: response.order_id,
            order_time: parse_millis(response.update_time)?,
            status: response.status,
        })
    }

    async fn query_order(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<OrderUpdate, ExchangeError> {
        let response: OrderResponse = self
            .signed_request(
                Method::GET,
                "/fapi/v1/order",
                &[
                    ("symbol", symbol.to_uppercase()),
                    ("orderId", order_id.to_string()),
                ],
            )
            .await?;
        debug!(order_id, status = ?response.status, "주문 상태 조회");

        // 체결가가 있으면 체결가, 없으면 주문가
        let avg_price = response
            .avg_price
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .map(parse_decimal)
            .transpose()?;
        let price = match avg_price {
            Some(avg) if !avg.is_zero() => avg,
            _ => parse_decimal(&response.price)?,
        };
        Ok(OrderUpdate {
            status: response.status,
            price,
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .signed_request(
                Method::DELETE,
                "/fapi/v1/order",
                &[
                    ("symbol", symbol.to_uppercase()),
                    ("orderId", order_id.to_string()),
                ],
            )
            .await?;
        info!(order_id, symbol, "주문 취소");
        Ok(())
    }

    async fn change_leverage(&self, symbol: &str, leverage: u32) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self
            .signed_request(
                Method::POST,
                "/fapi/v1/leverage",
                &[
                    ("symbol", symbol.to_uppercase()),
                    ("leverage", leverage.to_string()),
                ],
            )
            .await?;
        info!(symbol, leverage, "레버리지 변경");
        Ok(())
    }
}
