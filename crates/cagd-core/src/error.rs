use thiserror::Error;

#[derive(Debug, Error)]
pub enum CagdError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed knot vector: {0}")]
    MalformedKnotVector(String),

    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),
}

impl CagdError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    pub fn is_malformed_knot_vector(&self) -> bool {
        matches!(self, Self::MalformedKnotVector(_))
    }

    pub fn is_numeric_degeneracy(&self) -> bool {
        matches!(self, Self::NumericDegeneracy(_))
    }
}

pub type Result<T> = std::result::Result<T, CagdError>;

/// Fail with `InvalidArgument` unless `t` lies in the closed unit interval.
pub fn check_unit_parameter(name: &str, t: f64) -> Result<()> {
    if (0.0..=1.0).contains(&t) {
        Ok(())
    } else {
        Err(CagdError::InvalidArgument(format!(
            "{name} must lie in [0, 1], got {t}"
        )))
    }
}
