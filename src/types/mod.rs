mod critique_state;
mod keys;
mod models;

pub use critique_state::CritiqueState;
pub use keys::*;
pub use models::*;
