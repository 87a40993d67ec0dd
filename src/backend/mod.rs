//! REST backend consumed by the scan workflows.
//!
//! The backend is authoritative for identity checks, point awards and
//! redemptions. [`Backend`] is the seam the session driver talks to;
//! [`HttpBackend`] is the production implementation.

use async_trait::async_trait;

use crate::model::{
    AwardPointsRequest, AwardResult, ProcessRedemptionRequest, RedemptionResult, ScanResult,
    ValidateQrRequest,
};

mod error;
pub use error::BackendError;

mod http;
pub use http::HttpBackend;

/// Endpoints of the Grabbitt backend used by the seller app.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /validateCustomerQR`
    async fn validate_customer_qr(
        &self,
        request: &ValidateQrRequest,
    ) -> Result<ScanResult, BackendError>;

    /// `POST /awardPointsToCustomer`
    async fn award_points(&self, request: &AwardPointsRequest) -> Result<AwardResult, BackendError>;

    /// `POST /processRedemption`
    async fn process_redemption(
        &self,
        request: &ProcessRedemptionRequest,
    ) -> Result<RedemptionResult, BackendError>;
}
