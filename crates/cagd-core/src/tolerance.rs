/// Tolerances for comparing evaluated geometry.
///
/// The instance values are for callers and checks that compare computed points,
/// lengths and angles against each other. Evaluators only consult
/// [`Tolerance::DEGENERATE`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Distance tolerance (in model units)
    pub linear: f64,
    /// Angular tolerance (in radians)
    pub angular: f64,
}

impl Tolerance {
    pub const DEFAULT_LINEAR: f64 = 1e-7;
    pub const DEFAULT_ANGULAR: f64 = 1e-10;
    /// Homogeneous weights and normal lengths whose magnitude does not exceed
    /// this are treated as zero.
    pub const DEGENERATE: f64 = 1e-15;

    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    pub fn default_precision() -> Self {
        Self {
            linear: Self::DEFAULT_LINEAR,
            angular: Self::DEFAULT_ANGULAR,
        }
    }

    /// Check if two values are equal within linear tolerance
    pub fn linear_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    /// Check if a value is zero within linear tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    /// Check if a vector length is one within linear tolerance
    pub fn is_unit(self, length: f64) -> bool {
        self.linear_eq(length, 1.0)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}
