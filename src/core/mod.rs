mod engine;
mod types;

pub use engine::project_semi_annual_assets;
pub use types::{AssetSnapshot, ProjectionInputs};
