pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{check_unit_parameter, CagdError, Result};
pub use tolerance::Tolerance;
