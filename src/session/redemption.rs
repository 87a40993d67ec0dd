//! Redemption scan flow: `Scanning -> Processing -> Redeemed`.

use tracing::{debug, info, warn};

use super::effect::{Alert, AlertAction, Effect, Route, Ticket};
use super::non_empty_or;
use crate::backend::BackendError;
use crate::model::{ProcessRedemptionRequest, RedemptionResult};
use crate::qr::parse_redemption_qr;

const INVALID_QR_TITLE: &str = "Invalid QR Code";
const REDEMPTION_FAILED_TITLE: &str = "Redemption Failed";
const REDEEM_FALLBACK: &str = "Failed to process redemption";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RedemptionState {
    #[default]
    Scanning,
    Processing { redemption_id: String, ticket: Ticket },
    Redeemed {
        redemption_id: String,
        result: RedemptionResult,
    },
}

impl RedemptionState {
    pub fn name(&self) -> &'static str {
        match self {
            RedemptionState::Scanning => "scanning",
            RedemptionState::Processing { .. } => "processing",
            RedemptionState::Redeemed { .. } => "redeemed",
        }
    }
}

/// Redemption scan state machine. Same latch and ticket rules as the award
/// flow, without the amount step.
#[derive(Debug)]
pub struct RedemptionSession {
    state: RedemptionState,
    scanned: bool,
    focused: bool,
    next_ticket: u64,
}

impl RedemptionSession {
    pub fn new() -> Self {
        Self {
            state: RedemptionState::Scanning,
            scanned: false,
            focused: true,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &RedemptionState {
        &self.state
    }

    pub fn camera_active(&self) -> bool {
        self.focused && !self.scanned && matches!(self.state, RedemptionState::Scanning)
    }

    pub fn on_barcode(&mut self, raw: &str) -> Option<Effect> {
        if !self.camera_active() {
            debug!(state = self.state.name(), "redemption barcode ignored");
            return None;
        }

        let redemption_id = match parse_redemption_qr(raw) {
            Ok(id) => id,
            Err(e) => {
                info!(reason = %e, "redemption payload rejected");
                return Some(Effect::Alert(Alert::new(
                    INVALID_QR_TITLE,
                    e.to_string(),
                    AlertAction::ScanAgain,
                )));
            }
        };

        self.scanned = true;
        self.next_ticket += 1;
        let ticket = Ticket::new(self.next_ticket);
        info!(%ticket, redemption = %redemption_id, "processing redemption");
        self.state = RedemptionState::Processing {
            redemption_id: redemption_id.clone(),
            ticket,
        };
        Some(Effect::Redeem {
            ticket,
            request: ProcessRedemptionRequest { redemption_id },
        })
    }

    pub fn on_redemption(
        &mut self,
        ticket: Ticket,
        result: Result<RedemptionResult, BackendError>,
    ) -> Option<Effect> {
        let redemption_id = match &self.state {
            RedemptionState::Processing {
                redemption_id,
                ticket: pending,
            } if *pending == ticket => redemption_id.clone(),
            _ => {
                debug!(%ticket, "stale redemption response dropped");
                return None;
            }
        };

        let outcome = match result {
            Ok(result) if result.success => Ok(result),
            Ok(result) => Err(non_empty_or(result.error, REDEEM_FALLBACK)),
            Err(e) => Err(e.user_message(REDEEM_FALLBACK)),
        };

        match outcome {
            Ok(result) => {
                info!(
                    %ticket,
                    redemption = %redemption_id,
                    points = result.points_redeemed,
                    "redemption processed"
                );
                let route = Route::RedemptionSuccess {
                    redemption_id: redemption_id.clone(),
                    points_redeemed: result.points_redeemed,
                };
                self.state = RedemptionState::Redeemed {
                    redemption_id,
                    result,
                };
                Some(Effect::Navigate(route))
            }
            Err(message) => {
                warn!(%ticket, redemption = %redemption_id, reason = %message, "redemption failed");
                self.reset();
                Some(Effect::Alert(Alert::new(
                    REDEMPTION_FAILED_TITLE,
                    message,
                    AlertAction::TryAgain,
                )))
            }
        }
    }

    /// An alert button was pressed. Ignored unless back in `Scanning`.
    pub fn acknowledge(&mut self, action: AlertAction) {
        if !matches!(self.state, RedemptionState::Scanning) {
            debug!(state = self.state.name(), action = action.label(), "stale alert action ignored");
            return;
        }
        self.reset();
    }

    pub fn on_focus(&mut self) {
        self.focused = true;
        self.reset();
    }

    pub fn on_blur(&mut self) {
        self.focused = false;
    }

    fn reset(&mut self) {
        self.state = RedemptionState::Scanning;
        self.scanned = false;
    }
}

impl Default for RedemptionSession {
    fn default() -> Self {
        Self::new()
    }
}
