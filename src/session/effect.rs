//! Commands a session hands to its driver.

use std::fmt;

use crate::model::{AwardPointsRequest, Points, ProcessRedemptionRequest, ValidateQrRequest};

/// Identifies one backend request issued by a session.
///
/// Responses must be fed back with the ticket they were issued with; a reset
/// forgets all outstanding tickets so late responses are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub(crate) fn new(id: u64) -> Self {
        Ticket(id)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Button of an alert. Every action resets the session to scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    ScanAgain,
    TryAgain,
}

impl AlertAction {
    pub fn label(&self) -> &'static str {
        match self {
            AlertAction::ScanAgain => "Scan Again",
            AlertAction::TryAgain => "Try Again",
        }
    }
}

/// A dialog the seller has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub action: AlertAction,
}

impl Alert {
    pub fn new(title: &str, message: impl Into<String>, action: AlertAction) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
            action,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.title, self.message, self.action.label())
    }
}

/// Where the host screen should navigate when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Leave the scan screen.
    Done,
    /// Redemption confirmed by the backend.
    RedemptionSuccess {
        redemption_id: String,
        points_redeemed: Points,
    },
}

/// Output of a session transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Validate {
        ticket: Ticket,
        request: ValidateQrRequest,
    },
    Award {
        ticket: Ticket,
        request: AwardPointsRequest,
    },
    Redeem {
        ticket: Ticket,
        request: ProcessRedemptionRequest,
    },
    Alert(Alert),
    Navigate(Route),
}

/// Effects that reach the user once backend calls are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Alert(Alert),
    Navigate(Route),
}
