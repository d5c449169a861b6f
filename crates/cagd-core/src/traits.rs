use crate::error::Result;

/// Validate structural integrity of a curve or surface definition.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
