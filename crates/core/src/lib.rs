#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and corridor analytics for the PulseOps backend.

pub mod api;
pub mod brain;
pub mod case_studies;
pub mod health;
pub mod history;
pub mod incidents;
pub mod model;
pub mod plan;
pub mod risk;
pub mod simulation;
pub mod summary;
pub mod validation;

mod util;

pub use health::{compute_health_metrics, compute_health_metrics_at, HealthMetrics, RiskLevel};
pub use history::{History, HISTORY_WINDOW_MS};
pub use risk::{compute_risk_for_route, compute_risk_for_route_at, RiskAssessment};
pub use summary::{summarize_day, DaySummary};
pub use util::{new_ulid, now_ms, round_half_up, round_to_tenth, EpochMs};
