pub mod amount;
pub mod backend;
pub mod config;
pub mod model;
pub mod qr;
pub mod reward;
pub mod session;

pub use amount::Amount;
pub use backend::{Backend, BackendError, HttpBackend};
pub use config::Config;
pub use model::{AwardResult, CustomerId, Points, RewardScheme, RewardType, ScanResult, SlabRule};
pub use qr::{QrPayload, parse_customer_qr, parse_redemption_qr};
pub use reward::{calculate_points, resolve_scheme};
pub use session::{ScanController, ScanSession, ScreenState};
