use serde::Serialize;

/// The five validated form values a projection is run from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub monthly_savings: u32,
    pub monthly_investment: u32,
    /// Percentage points per year, e.g. `5` for 5%. Applies to investment only.
    pub annual_return_rate: u32,
}

/// Balances at the end of one year of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub age: u32,
    pub savings: f64,
    pub investment: f64,
    pub total: f64,
}
