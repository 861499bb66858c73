use serde::{Deserialize, Serialize};

/// What-if scenario parameters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationInput {
    pub delay_minutes: f64,
    pub riders_estimated: f64,
    /// Carried for the caller; the impact model does not use it yet.
    pub duration_minutes: f64,
}

/// Qualitative impact bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Moderate,
    High,
}

/// What-if outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub rider_delay_minutes: f64,
    pub qualitative_impact: Impact,
}

/// Estimates rider impact of a hypothetical delay.
pub fn simulate_impact(input: SimulationInput) -> SimulationResult {
    let rider_delay_minutes = input.delay_minutes * input.riders_estimated;
    let qualitative_impact = if rider_delay_minutes > 20_000.0 {
        Impact::High
    } else if rider_delay_minutes > 5_000.0 {
        Impact::Moderate
    } else {
        Impact::Low
    };
    SimulationResult {
        rider_delay_minutes,
        qualitative_impact,
    }
}
