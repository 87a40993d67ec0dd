use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{Backend, BackendError};
use crate::config::Config;
use crate::model::{
    AwardPointsRequest, AwardResult, ProcessRedemptionRequest, RedemptionResult, ScanResult,
    ValidateQrRequest,
};

const VALIDATE_CUSTOMER_QR: &str = "validateCustomerQR";
const AWARD_POINTS: &str = "awardPointsToCustomer";
const PROCESS_REDEMPTION: &str = "processRedemption";

/// JSON-over-HTTP client for the Grabbitt backend.
pub struct HttpBackend {
    client: Client,
    config: Config,
}

impl HttpBackend {
    pub fn new(config: Config) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn post<Req, Resp>(&self, endpoint: &str, body: &Req) -> Result<Resp, BackendError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.config.endpoint(endpoint);
        debug!(%url, "backend request");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        debug!(%url, status = status.as_u16(), len = bytes.len(), "backend response");

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_field(&bytes),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// `error` field of a JSON error body, if any.
fn error_field(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn validate_customer_qr(
        &self,
        request: &ValidateQrRequest,
    ) -> Result<ScanResult, BackendError> {
        self.post(VALIDATE_CUSTOMER_QR, request).await
    }

    async fn award_points(&self, request: &AwardPointsRequest) -> Result<AwardResult, BackendError> {
        self.post(AWARD_POINTS, request).await
    }

    async fn process_redemption(
        &self,
        request: &ProcessRedemptionRequest,
    ) -> Result<RedemptionResult, BackendError> {
        self.post(PROCESS_REDEMPTION, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_reads_string_error() {
        assert_eq!(
            error_field(br#"{"success":false,"error":"Invalid QR"}"#).as_deref(),
            Some("Invalid QR")
        );
    }

    #[test]
    fn error_field_reads_nested_message() {
        assert_eq!(
            error_field(br#"{"error":{"code":"x","message":"Seller inactive"}}"#).as_deref(),
            Some("Seller inactive")
        );
    }

    #[test]
    fn error_field_ignores_non_json() {
        assert_eq!(error_field(b"<html>502</html>"), None);
        assert_eq!(error_field(br#"{"ok":false}"#), None);
    }

    #[test]
    fn new_uses_configured_base_url() {
        let config = Config::new("http://localhost:5001/").unwrap();
        let backend = HttpBackend::new(config).unwrap();
        assert_eq!(
            backend.config().endpoint(AWARD_POINTS),
            "http://localhost:5001/awardPointsToCustomer"
        );
    }
}
