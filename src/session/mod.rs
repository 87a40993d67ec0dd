//! Scan session state machines.
//!
//! A session owns the screen state of one scan screen and turns user and
//! backend inputs into [`Effect`]s. It performs no I/O itself: the driver in
//! [`driver`] executes the backend calls and feeds the responses back with the
//! [`Ticket`] they were issued under.
//!
//! Award flow: `Scanning -> [AmountInput ->] Processing -> Success`. Any
//! failure or focus regain resets to `Scanning`; cancel does so only from
//! `AmountInput`. Nothing but focus regain leaves `Processing` early.

use tracing::{debug, info, warn};

use crate::Amount;
use crate::backend::BackendError;
use crate::model::{
    AwardPointsRequest, AwardResult, Points, RewardScheme, ScanResult, ValidateQrRequest,
};
use crate::qr::parse_customer_qr;
use crate::reward::calculate_points;

mod effect;
pub use effect::{Alert, AlertAction, Effect, Notice, Route, Ticket};

mod error;
pub use error::SessionError;

mod redemption;
pub use redemption::{RedemptionSession, RedemptionState};

pub mod driver;
pub use driver::{RedemptionController, ScanController, UiEvent};

const INVALID_QR_TITLE: &str = "Invalid QR Code";
const AWARD_FAILED_TITLE: &str = "Error";
const VALIDATE_FALLBACK: &str = "Failed to validate QR code";
const AWARD_FALLBACK: &str = "Failed to award points";

/// Order amount being typed by the seller, with its live points preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountEntry {
    pub customer: ScanResult,
    pub customer_id: String,
    pub text: String,
    pub amount: Option<Amount>,
    pub preview: Points,
}

/// Award request in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAward {
    pub customer: ScanResult,
    pub request: AwardPointsRequest,
    pub ticket: Ticket,
}

/// Confirmed award, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardSummary {
    pub customer: ScanResult,
    pub award: AwardResult,
    /// Points previewed locally before submission; informational only.
    pub previewed: Points,
}

impl AwardSummary {
    /// Points to display. Always the backend's figure.
    pub fn points(&self) -> Points {
        self.award.points_awarded
    }

    pub fn headline(&self) -> String {
        format!("+{}", self.points())
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.award
            .customer_name
            .as_deref()
            .or(self.customer.customer_name.as_deref())
    }
}

/// Screen state of the award flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScreenState {
    #[default]
    Scanning,
    AmountInput(AmountEntry),
    Processing(PendingAward),
    Success(AwardSummary),
}

impl ScreenState {
    pub fn name(&self) -> &'static str {
        match self {
            ScreenState::Scanning => "scanning",
            ScreenState::AmountInput(_) => "amount_input",
            ScreenState::Processing(_) => "processing",
            ScreenState::Success(_) => "success",
        }
    }
}

/// Customer scan & award state machine for one scan screen.
#[derive(Debug)]
pub struct ScanSession {
    scheme: RewardScheme,
    state: ScreenState,
    /// One-shot latch set on the first accepted barcode, cleared only by a reset
    /// or a failed validation.
    scanned: bool,
    focused: bool,
    /// Validation request in flight, if any.
    validating: Option<Ticket>,
    next_ticket: u64,
}

/// Public API
impl ScanSession {
    pub fn new(scheme: RewardScheme) -> Self {
        Self {
            scheme,
            state: ScreenState::Scanning,
            scanned: false,
            focused: true,
            validating: None,
            next_ticket: 0,
        }
    }

    pub fn scheme(&self) -> &RewardScheme {
        &self.scheme
    }

    /// Replace the reward scheme, e.g. after the seller profile was refetched.
    ///
    /// An amount being entered is re-previewed under the new scheme.
    pub fn set_scheme(&mut self, scheme: RewardScheme) {
        self.scheme = scheme;
        if let ScreenState::AmountInput(entry) = &mut self.state {
            entry.preview = calculate_points(&self.scheme, entry.amount);
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    /// The camera runs only while scanning, unlatched and focused.
    pub fn camera_active(&self) -> bool {
        self.focused && !self.scanned && matches!(self.state, ScreenState::Scanning)
    }

    /// Validation result of the current customer, once accepted.
    pub fn scan_result(&self) -> Option<&ScanResult> {
        match &self.state {
            ScreenState::Scanning => None,
            ScreenState::AmountInput(entry) => Some(&entry.customer),
            ScreenState::Processing(pending) => Some(&pending.customer),
            ScreenState::Success(summary) => Some(&summary.customer),
        }
    }

    pub fn award_result(&self) -> Option<&AwardResult> {
        match &self.state {
            ScreenState::Success(summary) => Some(&summary.award),
            _ => None,
        }
    }

    /// Live points preview while entering an amount.
    pub fn preview(&self) -> Option<Points> {
        match &self.state {
            ScreenState::AmountInput(entry) => Some(entry.preview),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        match &self.state {
            ScreenState::AmountInput(entry) => {
                entry.amount.is_some_and(Amount::is_positive) && entry.preview > 0
            }
            _ => false,
        }
    }

    /// A barcode was detected by the camera.
    ///
    /// Ignored unless the camera is active. Unrecognized payloads are
    /// rejected locally without a backend call.
    pub fn on_barcode(&mut self, raw: &str) -> Option<Effect> {
        if !self.camera_active() {
            debug!(state = self.state.name(), scanned = self.scanned, "barcode ignored");
            return None;
        }

        let payload = match parse_customer_qr(raw) {
            Ok(payload) => payload,
            Err(e) => {
                info!(reason = %e, "qr payload rejected");
                return Some(Effect::Alert(Alert::new(
                    INVALID_QR_TITLE,
                    e.to_string(),
                    AlertAction::ScanAgain,
                )));
            }
        };

        self.scanned = true;
        let ticket = self.issue_ticket();
        self.validating = Some(ticket);
        info!(kind = payload.kind(), %ticket, "validating customer qr");

        Some(Effect::Validate {
            ticket,
            request: ValidateQrRequest {
                qr_data: raw.to_string(),
                customer_id: payload.customer_id().map(str::to_string),
            },
        })
    }

    /// Feed back the response of a [`Effect::Validate`].
    pub fn on_validation(
        &mut self,
        ticket: Ticket,
        result: Result<ScanResult, BackendError>,
    ) -> Option<Effect> {
        if self.validating != Some(ticket) {
            debug!(%ticket, "stale validation response dropped");
            return None;
        }
        self.validating = None;

        let customer = match accepted_scan(result) {
            Ok(customer) => customer,
            Err(message) => {
                warn!(%ticket, reason = %message, "customer qr rejected");
                // re-arm the camera
                self.scanned = false;
                return Some(Effect::Alert(Alert::new(
                    INVALID_QR_TITLE,
                    message,
                    AlertAction::ScanAgain,
                )));
            }
        };
        let customer_id = customer.customer_id.clone().unwrap_or_default();
        info!(%ticket, customer = %customer_id, "customer qr accepted");

        if self.scheme.requires_amount() {
            self.state = ScreenState::AmountInput(AmountEntry {
                customer,
                customer_id,
                text: String::new(),
                amount: None,
                preview: 0,
            });
            return None;
        }

        let points = calculate_points(&self.scheme, None);
        Some(self.begin_award(customer, customer_id, None, points))
    }

    /// The amount field changed. Returns the recomputed preview.
    pub fn set_amount(&mut self, text: &str) -> Option<Points> {
        let ScreenState::AmountInput(entry) = &mut self.state else {
            return None;
        };
        entry.text = text.to_string();
        entry.amount = text.parse::<Amount>().ok();
        entry.preview = calculate_points(&self.scheme, entry.amount);
        Some(entry.preview)
    }

    /// Submit the entered amount and request the award.
    pub fn submit_amount(&mut self) -> Result<Effect, SessionError> {
        let ScreenState::AmountInput(entry) = &self.state else {
            return Err(self.invalid_state("submit amount"));
        };
        let amount = entry
            .amount
            .filter(|amount| amount.is_positive())
            .ok_or(SessionError::AmountRequired)?;
        if entry.preview <= 0 {
            return Err(SessionError::NoPoints(entry.preview));
        }

        let customer = entry.customer.clone();
        let customer_id = entry.customer_id.clone();
        let points = entry.preview;
        Ok(self.begin_award(customer, customer_id, Some(amount), points))
    }

    /// Feed back the response of a [`Effect::Award`].
    pub fn on_award(
        &mut self,
        ticket: Ticket,
        result: Result<AwardResult, BackendError>,
    ) -> Option<Effect> {
        let pending = match &self.state {
            ScreenState::Processing(pending) if pending.ticket == ticket => pending.clone(),
            _ => {
                debug!(%ticket, "stale award response dropped");
                return None;
            }
        };

        match accepted_award(result) {
            Ok(award) => {
                if award.points_awarded != pending.request.points {
                    warn!(
                        previewed = pending.request.points,
                        awarded = award.points_awarded,
                        "backend awarded a different amount than previewed"
                    );
                }
                info!(
                    %ticket,
                    customer = %pending.request.customer_id,
                    points = award.points_awarded,
                    transaction = award.transaction_id.as_deref().unwrap_or("-"),
                    "points awarded"
                );
                self.state = ScreenState::Success(AwardSummary {
                    customer: pending.customer,
                    award,
                    previewed: pending.request.points,
                });
                None
            }
            Err(message) => {
                warn!(%ticket, customer = %pending.request.customer_id, reason = %message, "award failed");
                self.reset();
                Some(Effect::Alert(Alert::new(
                    AWARD_FAILED_TITLE,
                    message,
                    AlertAction::TryAgain,
                )))
            }
        }
    }

    /// Leave the amount entry and start over.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, ScreenState::AmountInput(_)) {
            return Err(self.invalid_state("cancel"));
        }
        self.reset();
        Ok(())
    }

    /// "Scan Another" on the success screen.
    pub fn scan_another(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, ScreenState::Success(_)) {
            return Err(self.invalid_state("scan another"));
        }
        self.reset();
        Ok(())
    }

    /// "Done" on the success screen: tear the session down and leave.
    pub fn done(&mut self) -> Result<Effect, SessionError> {
        if !matches!(self.state, ScreenState::Success(_)) {
            return Err(self.invalid_state("done"));
        }
        self.reset();
        self.focused = false;
        Ok(Effect::Navigate(Route::Done))
    }

    /// An alert button was pressed.
    ///
    /// Alerts are only raised back in `Scanning` with no validation pending;
    /// anywhere else the press is stale and ignored.
    pub fn acknowledge(&mut self, action: AlertAction) {
        if !matches!(self.state, ScreenState::Scanning) || self.validating.is_some() {
            debug!(state = self.state.name(), action = action.label(), "stale alert action ignored");
            return;
        }
        self.reset();
    }

    /// The host screen regained focus. Forces a full reset from any state.
    pub fn on_focus(&mut self) {
        self.focused = true;
        self.reset();
    }

    /// The host screen lost focus; the camera is released.
    pub fn on_blur(&mut self) {
        self.focused = false;
    }

}

/// Private API
impl ScanSession {
    /// Back to scanning with the latch cleared. Outstanding requests are
    /// forgotten and their responses will be dropped.
    fn reset(&mut self) {
        if !matches!(self.state, ScreenState::Scanning) || self.scanned {
            debug!(from = self.state.name(), "scan session reset");
        }
        self.state = ScreenState::Scanning;
        self.scanned = false;
        self.validating = None;
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket::new(self.next_ticket)
    }

    fn invalid_state(&self, action: &'static str) -> SessionError {
        SessionError::InvalidState {
            action,
            state: self.state.name(),
        }
    }

    fn begin_award(
        &mut self,
        customer: ScanResult,
        customer_id: String,
        order_amount: Option<Amount>,
        points: Points,
    ) -> Effect {
        let ticket = self.issue_ticket();
        let request = AwardPointsRequest {
            customer_id,
            points,
            order_amount,
            reward_type: self.scheme.reward_type,
        };
        info!(
            %ticket,
            customer = %request.customer_id,
            points,
            reward_type = %request.reward_type,
            "awarding points"
        );
        self.state = ScreenState::Processing(PendingAward {
            customer,
            request: request.clone(),
            ticket,
        });
        Effect::Award { ticket, request }
    }
}

/// A validation counts only with `success` and a customer id.
fn accepted_scan(result: Result<ScanResult, BackendError>) -> Result<ScanResult, String> {
    match result {
        Ok(scan) if scan.success && scan.customer_id.as_deref().is_some_and(|id| !id.is_empty()) => {
            Ok(scan)
        }
        Ok(scan) => Err(non_empty_or(scan.error, VALIDATE_FALLBACK)),
        Err(e) => Err(e.user_message(VALIDATE_FALLBACK)),
    }
}

fn accepted_award(result: Result<AwardResult, BackendError>) -> Result<AwardResult, String> {
    match result {
        Ok(award) if award.success => Ok(award),
        Ok(award) => Err(non_empty_or(award.error, AWARD_FALLBACK)),
        Err(e) => Err(e.user_message(AWARD_FALLBACK)),
    }
}

pub(crate) fn non_empty_or(message: Option<String>, fallback: &str) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
