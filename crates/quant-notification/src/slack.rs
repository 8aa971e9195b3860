//! Slack Incoming Webhook 전송기.

use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

/// 알림 전송 오류.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Slack 전송 실패: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Slack 응답 오류 (status {0})")]
    BadStatus(u16),
}

/// Slack 알림 설정.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Incoming Webhook URL
    pub webhook_url: String,
    /// 전송 활성화 여부
    pub enabled: bool,
}

impl SlackConfig {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            enabled: true,
        }
    }

    /// `SLACK_WEBHOOK_URL` / `SLACK_ENABLED` 환경 변수에서 생성합니다.
    pub fn from_env() -> Option<Self> {
        let webhook_url = std::env::var("SLACK_WEBHOOK_URL").ok()?;
        let enabled = std::env::var("SLACK_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);
        Some(Self {
            webhook_url,
            enabled,
        })
    }
}

/// Slack 알림 전송기.
pub struct SlackNotifier {
    config: SlackConfig,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Option<Self> {
        SlackConfig::from_env().map(Self::new)
    }

    /// 단일 텍스트 메시지를 전송합니다.
    pub async fn send_message(&self, text: &str) -> Result<(), NotificationError> {
        if !self.config.enabled {
            debug!("Slack 비활성화 상태, 전송 생략");
            return Ok(());
        }

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::BadStatus(status.as_u16()));
        }
        Ok(())
    }

    /// `키: 값` 묶음을 한 줄씩 전송합니다.
    pub async fn send_fields(&self, fields: &[(&str, String)]) -> Result<(), NotificationError> {
        let body = fields
            .iter()
            .map(|(key, value)| format!("*{key}*: {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.send_message(&body).await
    }

    /// 실패를 로그로만 남기는 best-effort 전송.
    pub async fn notify(&self, fields: &[(&str, String)]) {
        if let Err(e) = self.send_fields(fields).await {
            warn!(error = %e, "Slack 알림 전송 실패 (무시)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn posts_text_payload_to_webhook() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"text": "*Price*: 65000"}),
            ))
            .with_status(200)
            .create_async()
            .await;

        let notifier = SlackNotifier::new(SlackConfig::new(format!("{}/hook", server.url())));
        notifier
            .send_fields(&[("Price", "65000".to_string())])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn disabled_config_skips_network() {
        let mut config = SlackConfig::new("http://127.0.0.1:1/unreachable".to_string());
        config.enabled = false;
        let notifier = SlackNotifier::new(config);
        // 비활성화 상태에서는 네트워크를 건드리지 않으므로 성공
        notifier.send_message("ignored").await.unwrap();
    }

    #[tokio::test]
    async fn bad_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(500)
            .create_async()
            .await;

        let notifier = SlackNotifier::new(SlackConfig::new(format!("{}/hook", server.url())));
        let err = notifier.send_message("x").await;
        assert!(matches!(err, Err(NotificationError::BadStatus(500))));
    }
}
