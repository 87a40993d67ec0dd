use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use grabbitt_scan::model::{
    AwardPointsRequest, ProcessRedemptionRequest, RedemptionResult, ValidateQrRequest,
};
use grabbitt_scan::session::{AlertAction, Notice, RedemptionController, Route, UiEvent};
use grabbitt_scan::{
    Amount, AwardResult, Backend, BackendError, RewardScheme, RewardType, ScanController,
    ScanResult, ScreenState, resolve_scheme,
};
use serde_json::json;

/// Backend answering from scripted queues and recording every request.
#[derive(Default)]
struct ScriptedBackend {
    validations: Mutex<VecDeque<Result<ScanResult, BackendError>>>,
    awards: Mutex<VecDeque<Result<AwardResult, BackendError>>>,
    redemptions: Mutex<VecDeque<Result<RedemptionResult, BackendError>>>,
    validate_calls: AtomicUsize,
    award_requests: Mutex<Vec<AwardPointsRequest>>,
    redemption_requests: Mutex<Vec<ProcessRedemptionRequest>>,
}

impl ScriptedBackend {
    fn validates(self, result: Result<ScanResult, BackendError>) -> Self {
        self.validations.lock().unwrap().push_back(result);
        self
    }

    fn awards(self, result: Result<AwardResult, BackendError>) -> Self {
        self.awards.lock().unwrap().push_back(result);
        self
    }

    fn redeems(self, result: Result<RedemptionResult, BackendError>) -> Self {
        self.redemptions.lock().unwrap().push_back(result);
        self
    }

    fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    fn award_requests(&self) -> Vec<AwardPointsRequest> {
        self.award_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn validate_customer_qr(
        &self,
        _request: &ValidateQrRequest,
    ) -> Result<ScanResult, BackendError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.validations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted response".to_string())))
    }

    async fn award_points(&self, request: &AwardPointsRequest) -> Result<AwardResult, BackendError> {
        self.award_requests.lock().unwrap().push(request.clone());
        self.awards
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted response".to_string())))
    }

    async fn process_redemption(
        &self,
        request: &ProcessRedemptionRequest,
    ) -> Result<RedemptionResult, BackendError> {
        self.redemption_requests.lock().unwrap().push(request.clone());
        self.redemptions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no scripted response".to_string())))
    }
}

fn customer(id: &str, name: &str) -> ScanResult {
    ScanResult {
        success: true,
        customer_id: Some(id.to_string()),
        customer_name: Some(name.to_string()),
        qr_id: None,
        error: None,
    }
}

fn awarded(points: i64) -> AwardResult {
    AwardResult {
        success: true,
        points_awarded: points,
        customer_name: Some("Ravi".to_string()),
        transaction_id: Some("txn_1".to_string()),
        error: None,
    }
}

fn barcode(raw: &str) -> UiEvent {
    UiEvent::Barcode(raw.to_string())
}

#[tokio::test]
async fn default_scheme_awards_without_amount_prompt() {
    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Ok(awarded(15)));
    let mut controller = ScanController::new(RewardScheme::default_points(15), backend);

    let notices = controller.dispatch(barcode("grabbitt://cust_1")).await;
    assert!(notices.is_empty());

    let ScreenState::Success(summary) = controller.session().state() else {
        panic!("expected success state");
    };
    assert_eq!(summary.headline(), "+15");
    assert_eq!(summary.customer_name(), Some("Ravi"));

    let requests = controller.backend().award_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].points, 15);
    assert_eq!(requests[0].order_amount, None);
    assert_eq!(requests[0].reward_type, RewardType::Default);
}

#[tokio::test]
async fn percentage_scheme_displays_backend_points_over_preview() {
    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Ok(awarded(80)));
    let mut controller =
        ScanController::new(RewardScheme::percentage(Amount::from_whole(10)), backend);

    controller.dispatch(barcode("grabbitt://cust_1")).await;
    assert_eq!(controller.session().state().name(), "amount_input");

    for partial in ["9", "99", "999"] {
        controller
            .dispatch(UiEvent::AmountChanged(partial.to_string()))
            .await;
    }
    assert_eq!(controller.session().preview(), Some(99));

    let notices = controller.dispatch(UiEvent::SubmitAmount).await;
    assert!(notices.is_empty());

    let ScreenState::Success(summary) = controller.session().state() else {
        panic!("expected success state");
    };
    assert_eq!(summary.previewed, 99);
    assert_eq!(summary.headline(), "+80");
    assert_eq!(controller.backend().award_requests()[0].points, 99);
}

#[tokio::test]
async fn stray_cancel_and_alert_press_keep_success() {
    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Ok(awarded(15)));
    let mut controller = ScanController::new(RewardScheme::default_points(15), backend);

    controller.dispatch(barcode("grabbitt://cust_1")).await;
    assert!(controller.dispatch(UiEvent::Cancel).await.is_empty());
    assert!(
        controller
            .dispatch(UiEvent::Acknowledge(AlertAction::TryAgain))
            .await
            .is_empty()
    );
    controller.dispatch(barcode("grabbitt://cust_1")).await;

    assert_eq!(controller.session().state().name(), "success");
    assert_eq!(controller.backend().validate_calls(), 1);
    assert_eq!(controller.backend().award_requests().len(), 1);
}

#[tokio::test]
async fn cancel_from_amount_input_rearms_camera() {
    let backend = ScriptedBackend::default().validates(Ok(customer("cust_1", "Ravi")));
    let mut controller =
        ScanController::new(RewardScheme::percentage(Amount::from_whole(10)), backend);

    controller.dispatch(barcode("grabbitt://cust_1")).await;
    controller
        .dispatch(UiEvent::AmountChanged("500".to_string()))
        .await;
    controller.dispatch(UiEvent::Cancel).await;

    assert_eq!(controller.session().state(), &ScreenState::Scanning);
    assert!(controller.session().camera_active());
    assert!(controller.backend().award_requests().is_empty());
}

#[tokio::test]
async fn repeated_barcodes_validate_once() {
    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .validates(Ok(customer("cust_2", "Mina")));
    let mut controller =
        ScanController::new(RewardScheme::percentage(Amount::from_whole(10)), backend);

    controller.dispatch(barcode("grabbitt://cust_1")).await;
    controller.dispatch(barcode("grabbitt://cust_1")).await;
    controller.dispatch(barcode("grabbitt://cust_2")).await;

    assert_eq!(controller.backend().validate_calls(), 1);
}

#[tokio::test]
async fn unparsable_payload_never_reaches_backend() {
    let mut controller =
        ScanController::new(RewardScheme::default_points(10), ScriptedBackend::default());

    let notices = controller.dispatch(barcode("tiny")).await;

    assert_eq!(controller.backend().validate_calls(), 0);
    assert!(matches!(
        notices.as_slice(),
        [Notice::Alert(alert)] if alert.action == AlertAction::ScanAgain
    ));
    assert!(controller.session().camera_active());
}

#[tokio::test]
async fn rejected_customer_alerts_and_rearms() {
    let rejected = ScanResult {
        success: false,
        error: Some("Customer not found".to_string()),
        ..ScanResult::default()
    };
    let backend = ScriptedBackend::default()
        .validates(Ok(rejected))
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Ok(awarded(10)));
    let mut controller = ScanController::new(RewardScheme::default_points(10), backend);

    let notices = controller.dispatch(barcode("grabbitt://ghost")).await;
    match notices.as_slice() {
        [Notice::Alert(alert)] => assert_eq!(alert.message, "Customer not found"),
        other => panic!("expected one alert, got {other:?}"),
    }
    assert!(controller.session().camera_active());

    controller
        .dispatch(UiEvent::Acknowledge(AlertAction::ScanAgain))
        .await;
    controller.dispatch(barcode("grabbitt://cust_1")).await;
    assert_eq!(controller.session().state().name(), "success");
}

#[tokio::test]
async fn failed_award_offers_try_again_and_resets() {
    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Err(BackendError::Status {
            status: 409,
            message: Some("Reward settings changed, rescan".to_string()),
        }));
    let mut controller = ScanController::new(RewardScheme::flat(5), backend);

    let notices = controller.dispatch(barcode("grabbitt://cust_1")).await;

    match notices.as_slice() {
        [Notice::Alert(alert)] => {
            assert_eq!(alert.message, "Reward settings changed, rescan");
            assert_eq!(alert.action, AlertAction::TryAgain);
        }
        other => panic!("expected one alert, got {other:?}"),
    }
    assert_eq!(controller.session().state(), &ScreenState::Scanning);
    assert_eq!(controller.session().award_result(), None);
}

#[tokio::test]
async fn run_stops_when_seller_is_done() {
    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Ok(awarded(10)));
    let mut controller = ScanController::new(RewardScheme::default_points(10), backend);

    let events = vec![
        barcode("grabbitt://cust_1"),
        UiEvent::Done,
        barcode("grabbitt://cust_2"),
    ];
    let notices = controller.run(tokio_stream::iter(events)).await;

    assert_eq!(notices, vec![Notice::Navigate(Route::Done)]);
    assert_eq!(controller.backend().validate_calls(), 1);
}

#[tokio::test]
async fn scan_another_then_focus_reset() {
    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Ok(awarded(10)))
        .validates(Ok(customer("cust_2", "Mina")));
    let mut controller =
        ScanController::new(RewardScheme::percentage(Amount::from_whole(10)), backend);

    controller.dispatch(barcode("grabbitt://cust_1")).await;
    controller
        .dispatch(UiEvent::AmountChanged("100".to_string()))
        .await;
    controller.dispatch(UiEvent::SubmitAmount).await;
    controller.dispatch(UiEvent::ScanAnother).await;
    assert!(controller.session().camera_active());

    controller.dispatch(barcode("grabbitt://cust_2")).await;
    assert_eq!(controller.session().state().name(), "amount_input");

    controller.dispatch(UiEvent::Blur).await;
    assert!(!controller.session().camera_active());
    controller.dispatch(UiEvent::Focus).await;
    assert_eq!(controller.session().state(), &ScreenState::Scanning);
    assert!(controller.session().camera_active());
}

#[tokio::test]
async fn resolved_profile_drives_slab_flow() {
    let profile = json!({
        "business_name": "Chai Point",
        "rewards": {
            "reward_type": "slab",
            "slab_rules": [
                {"min": 0, "max": 500, "points": 10},
                {"min": 501, "max": 1000, "points": 25}
            ]
        }
    });
    let resolved = resolve_scheme(&profile);
    assert!(resolved.is_complete());

    let backend = ScriptedBackend::default()
        .validates(Ok(customer("cust_1", "Ravi")))
        .awards(Ok(awarded(25)));
    let mut controller = ScanController::new(resolved.scheme, backend);

    controller
        .dispatch(UiEvent::Barcode(r#"{"customer_id":"cust_1"}"#.to_string()))
        .await;
    controller
        .dispatch(UiEvent::AmountChanged("1500".to_string()))
        .await;
    assert!(!controller.session().can_submit());
    controller.dispatch(UiEvent::SubmitAmount).await;
    assert_eq!(controller.session().state().name(), "amount_input");

    controller
        .dispatch(UiEvent::AmountChanged("501".to_string()))
        .await;
    controller.dispatch(UiEvent::SubmitAmount).await;

    let requests = controller.backend().award_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].points, 25);
    assert_eq!(requests[0].reward_type, RewardType::Slab);
    assert_eq!(requests[0].order_amount, Some(Amount::from_whole(501)));
}

#[tokio::test]
async fn redemption_navigates_on_success() {
    let backend = ScriptedBackend::default().redeems(Ok(RedemptionResult {
        success: true,
        points_redeemed: 120,
        error: None,
    }));
    let mut controller = RedemptionController::new(backend);

    let notices = controller
        .dispatch(barcode(r#"{"redemption_id":"red_42"}"#))
        .await;

    assert_eq!(
        notices,
        vec![Notice::Navigate(Route::RedemptionSuccess {
            redemption_id: "red_42".to_string(),
            points_redeemed: 120,
        })]
    );
    let requests = controller.backend().redemption_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].redemption_id, "red_42");
}

#[tokio::test]
async fn redemption_failure_alerts() {
    let backend = ScriptedBackend::default()
        .redeems(Err(BackendError::Transport("connection reset".to_string())));
    let mut controller = RedemptionController::new(backend);

    let notices = controller.dispatch(barcode("red_42")).await;

    match notices.as_slice() {
        [Notice::Alert(alert)] => {
            assert_eq!(alert.message, "connection reset");
            assert_eq!(alert.action, AlertAction::TryAgain);
        }
        other => panic!("expected one alert, got {other:?}"),
    }
    assert!(controller.session().camera_active());
}
