//! EmailJS transactional email notifier

use std::time::Duration;

use async_trait::async_trait;
use proxicap_core::{AlertNotifier, ConfigError, FallAlert, NotificationError, NotificationReceipt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::build_client;

const PROVIDER_ID: &str = "emailjs";

/// EmailJS account settings.
#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub base_url: String,
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    /// Private key. Requests go out without one when unset, which EmailJS
    /// only accepts for accounts that allow public sends.
    pub access_token: Option<SecretString>,
    pub timeout: Duration,
}

impl Default for EmailJsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.emailjs.com".to_string(),
            service_id: "service_vavz75e".to_string(),
            template_id: "template_y317gq5".to_string(),
            user_id: "fwfVSV07CXWtpPxNb".to_string(),
            access_token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl EmailJsConfig {
    pub fn send_url(&self) -> String {
        format!("{}/api/v1.0/email/send", self.base_url.trim_end_matches('/'))
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .as_ref()
            .is_some_and(|token| !token.expose_secret().is_empty())
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Variables substituted into the email template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateParams {
    pub address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Body of `POST /api/v1.0/email/send`.
#[derive(Clone, Serialize)]
pub struct EmailJsRequest {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub template_params: TemplateParams,
}

impl EmailJsRequest {
    pub fn for_alert(config: &EmailJsConfig, alert: &FallAlert) -> Self {
        Self {
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
            user_id: config.user_id.clone(),
            access_token: config
                .access_token
                .as_ref()
                .map(|token| token.expose_secret().to_string())
                .filter(|token| !token.is_empty()),
            template_params: TemplateParams {
                address: alert.address.clone(),
                lat: alert.lat,
                lon: alert.lon,
            },
        }
    }
}

impl std::fmt::Debug for EmailJsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsRequest")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("user_id", &self.user_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("template_params", &self.template_params)
            .finish()
    }
}

// ============================================================================
// NOTIFIER
// ============================================================================

/// Sends fall alerts through the EmailJS REST API.
pub struct EmailJsNotifier {
    client: Client,
    config: EmailJsConfig,
    send_url: String,
}

impl EmailJsNotifier {
    pub fn new(config: EmailJsConfig) -> Result<Self, ConfigError> {
        let client = build_client(
            Client::builder().timeout(config.timeout),
            "PROXICAP_EMAILJS_URL",
        )?;
        Ok(Self {
            client,
            send_url: config.send_url(),
            config,
        })
    }

    fn check_configured(&self) -> Result<(), NotificationError> {
        for (field, value) in [
            ("service_id", &self.config.service_id),
            ("template_id", &self.config.template_id),
            ("user_id", &self.config.user_id),
        ] {
            if value.trim().is_empty() {
                return Err(NotificationError::NotConfigured {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AlertNotifier for EmailJsNotifier {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    async fn notify(&self, alert: &FallAlert) -> Result<NotificationReceipt, NotificationError> {
        self.check_configured()?;

        let request = EmailJsRequest::for_alert(&self.config, alert);
        tracing::debug!(
            alert_id = %alert.alert_id,
            template_id = %request.template_id,
            "Sending fall alert email"
        );

        let response = self
            .client
            .post(&self.send_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::Transport {
                provider: PROVIDER_ID.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status.is_success() {
            Ok(NotificationReceipt {
                provider: PROVIDER_ID.to_string(),
                status: status.as_u16(),
                body,
            })
        } else {
            Err(NotificationError::Rejected {
                provider: PROVIDER_ID.to_string(),
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl std::fmt::Debug for EmailJsNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsNotifier")
            .field("send_url", &self.send_url)
            .field("service_id", &self.config.service_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proxicap_core::NotificationOutcome;
    use proxicap_test_utils::StubServer;

    fn alert() -> FallAlert {
        FallAlert::new("Kingsway Mall", Some(53.558), Some(-113.504), Utc::now())
    }

    fn notifier_for(stub: &StubServer) -> EmailJsNotifier {
        EmailJsNotifier::new(EmailJsConfig {
            base_url: stub.base_url().to_string(),
            access_token: Some(SecretString::from("private-key".to_string())),
            timeout: Duration::from_secs(2),
            ..EmailJsConfig::default()
        })
        .expect("client builds")
    }

    #[test]
    fn test_request_body_shape() {
        let config = EmailJsConfig {
            access_token: Some(SecretString::from("private-key".to_string())),
            ..EmailJsConfig::default()
        };
        let body = serde_json::to_value(EmailJsRequest::for_alert(&config, &alert()))
            .expect("serializes");

        assert_eq!(body["service_id"], "service_vavz75e");
        assert_eq!(body["template_id"], "template_y317gq5");
        assert_eq!(body["user_id"], "fwfVSV07CXWtpPxNb");
        assert_eq!(body["accessToken"], "private-key");
        assert_eq!(body["template_params"]["address"], "Kingsway Mall");
        assert_eq!(body["template_params"]["lat"], 53.558);
    }

    #[test]
    fn test_missing_token_is_omitted() {
        let body = serde_json::to_value(EmailJsRequest::for_alert(
            &EmailJsConfig::default(),
            &alert(),
        ))
        .expect("serializes");
        assert!(body.get("accessToken").is_none());
        assert!(!EmailJsConfig::default().has_access_token());
    }

    #[test]
    fn test_debug_never_prints_token() {
        let config = EmailJsConfig {
            access_token: Some(SecretString::from("hunter2".to_string())),
            ..EmailJsConfig::default()
        };
        let request = EmailJsRequest::for_alert(&config, &alert());
        assert!(!format!("{:?}", request).contains("hunter2"));
        assert!(!format!("{:?}", config).contains("hunter2"));

        let notifier = EmailJsNotifier::new(config).expect("client builds");
        assert!(!format!("{:?}", notifier).contains("hunter2"));
    }

    #[tokio::test]
    async fn test_blank_service_id_is_not_configured() {
        let notifier = EmailJsNotifier::new(EmailJsConfig {
            service_id: "  ".to_string(),
            ..EmailJsConfig::default()
        })
        .expect("client builds");

        assert_eq!(
            notifier.notify(&alert()).await,
            Err(NotificationError::NotConfigured {
                field: "service_id".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let notifier = EmailJsNotifier::new(EmailJsConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            ..EmailJsConfig::default()
        })
        .expect("client builds");

        assert!(matches!(
            notifier.notify(&alert()).await,
            Err(NotificationError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_accepted_send_posts_json_and_is_sent() {
        let stub = StubServer::start(200, "OK").await.expect("stub binds");
        let notifier = notifier_for(&stub);

        let result = notifier.notify(&alert()).await;
        let receipt = result.clone().expect("accepted");
        assert_eq!(receipt.provider, "emailjs");
        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.body, "OK");
        assert_eq!(
            NotificationOutcome::from_result(&result),
            NotificationOutcome::Sent { status: 200 }
        );

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method(), "POST");
        assert_eq!(request.target(), "/api/v1.0/email/send");
        assert_eq!(request.header("content-type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_str(&request.body).expect("json body");
        assert_eq!(body["service_id"], "service_vavz75e");
        assert_eq!(body["accessToken"], "private-key");
        assert_eq!(body["template_params"]["address"], "Kingsway Mall");
        assert_eq!(body["template_params"]["lon"], -113.504);
    }

    #[tokio::test]
    async fn test_rejected_send_is_failed() {
        let stub = StubServer::start(400, "The user ID is invalid")
            .await
            .expect("stub binds");
        let notifier = notifier_for(&stub);

        let result = notifier.notify(&alert()).await;
        assert_eq!(
            result,
            Err(NotificationError::Rejected {
                provider: "emailjs".to_string(),
                status: 400,
                body: "The user ID is invalid".to_string(),
            })
        );
        assert_eq!(NotificationOutcome::from_result(&result).label(), "failed");
        assert_eq!(stub.requests().len(), 1);
    }
}
