pub mod actor;
pub mod currency;
pub mod error;

pub use actor::Actor;
pub use currency::Currency;
pub use error::{AppError, Result};
