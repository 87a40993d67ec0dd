//! Async drivers executing session effects against a [`Backend`].
//!
//! Events are handled one at a time, the way a UI event loop serializes
//! them; each backend call is awaited before the next event is taken.

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use super::effect::{AlertAction, Effect, Notice, Route};
use super::{RedemptionSession, ScanSession};
use crate::backend::Backend;
use crate::model::RewardScheme;

/// User-facing inputs of a scan screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Barcode(String),
    AmountChanged(String),
    SubmitAmount,
    Cancel,
    ScanAnother,
    Done,
    Acknowledge(AlertAction),
    Focus,
    Blur,
}

/// Runs a [`ScanSession`] against a backend.
pub struct ScanController<B> {
    session: ScanSession,
    backend: B,
}

impl<B: Backend> ScanController<B> {
    pub fn new(scheme: RewardScheme, backend: B) -> Self {
        Self {
            session: ScanSession::new(scheme),
            backend,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ScanSession {
        &mut self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Handle one event, performing any backend calls it triggers.
    pub async fn dispatch(&mut self, event: UiEvent) -> Vec<Notice> {
        let effect = match event {
            UiEvent::Barcode(raw) => self.session.on_barcode(&raw),
            UiEvent::AmountChanged(text) => {
                self.session.set_amount(&text);
                None
            }
            UiEvent::SubmitAmount => match self.session.submit_amount() {
                Ok(effect) => Some(effect),
                Err(e) => {
                    info!(reason = %e, "amount submission refused");
                    None
                }
            },
            UiEvent::Cancel => {
                if let Err(e) = self.session.cancel() {
                    info!(reason = %e, "cancel refused");
                }
                None
            }
            UiEvent::ScanAnother => {
                if let Err(e) = self.session.scan_another() {
                    info!(reason = %e, "scan another refused");
                }
                None
            }
            UiEvent::Done => match self.session.done() {
                Ok(effect) => Some(effect),
                Err(e) => {
                    info!(reason = %e, "done refused");
                    None
                }
            },
            UiEvent::Acknowledge(action) => {
                self.session.acknowledge(action);
                None
            }
            UiEvent::Focus => {
                self.session.on_focus();
                None
            }
            UiEvent::Blur => {
                self.session.on_blur();
                None
            }
        };
        self.drive(effect).await
    }

    /// Process events until the stream ends or the seller leaves the screen.
    pub async fn run(&mut self, mut events: impl Stream<Item = UiEvent> + Unpin) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Some(event) = events.next().await {
            let batch = self.dispatch(event).await;
            let leaving = batch
                .iter()
                .any(|notice| matches!(notice, Notice::Navigate(Route::Done)));
            notices.extend(batch);
            if leaving {
                break;
            }
        }
        notices
    }

    async fn drive(&mut self, mut effect: Option<Effect>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Some(next) = effect.take() {
            effect = match next {
                Effect::Validate { ticket, request } => {
                    let result = self.backend.validate_customer_qr(&request).await;
                    self.session.on_validation(ticket, result)
                }
                Effect::Award { ticket, request } => {
                    let result = self.backend.award_points(&request).await;
                    self.session.on_award(ticket, result)
                }
                Effect::Redeem { ticket, .. } => {
                    warn!(%ticket, "redemption effect outside a redemption session");
                    None
                }
                Effect::Alert(alert) => {
                    notices.push(Notice::Alert(alert));
                    None
                }
                Effect::Navigate(route) => {
                    notices.push(Notice::Navigate(route));
                    None
                }
            };
        }
        notices
    }
}

/// Runs a [`RedemptionSession`] against a backend.
pub struct RedemptionController<B> {
    session: RedemptionSession,
    backend: B,
}

impl<B: Backend> RedemptionController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            session: RedemptionSession::new(),
            backend,
        }
    }

    pub fn session(&self) -> &RedemptionSession {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn dispatch(&mut self, event: UiEvent) -> Vec<Notice> {
        let effect = match event {
            UiEvent::Barcode(raw) => self.session.on_barcode(&raw),
            UiEvent::Acknowledge(action) => {
                self.session.acknowledge(action);
                None
            }
            UiEvent::Focus => {
                self.session.on_focus();
                None
            }
            UiEvent::Blur => {
                self.session.on_blur();
                None
            }
            other => {
                info!(event = ?other, "event not handled by redemption screen");
                None
            }
        };

        let mut notices = Vec::new();
        let mut effect = effect;
        while let Some(next) = effect.take() {
            effect = match next {
                Effect::Redeem { ticket, request } => {
                    let result = self.backend.process_redemption(&request).await;
                    self.session.on_redemption(ticket, result)
                }
                Effect::Alert(alert) => {
                    notices.push(Notice::Alert(alert));
                    None
                }
                Effect::Navigate(route) => {
                    notices.push(Notice::Navigate(route));
                    None
                }
                Effect::Validate { ticket, .. } | Effect::Award { ticket, .. } => {
                    warn!(%ticket, "award effect outside an award session");
                    None
                }
            };
        }
        notices
    }
}
