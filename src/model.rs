use ndarray::{Array1, ArrayView1};

use crate::{
    error::{ParamErr, PipelineErr},
    scaler::checked,
};

/// A pre-fitted ridge regression, `intercept + coef · x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ridge {
    coef: Array1<f64>,
    intercept: f64,
}

impl Ridge {
    /// Creates a new `Ridge` model out of its fitted coefficients.
    ///
    /// # Errors
    /// `ParamErr` if there isn't one finite coefficient per feature or the intercept isn't finite.
    pub fn new(coef: Vec<f64>, intercept: f64) -> Result<Self, ParamErr> {
        let coef = checked("model coef", coef)?;
        if !intercept.is_finite() {
            return Err(ParamErr::NonFinite {
                what: "model intercept",
                index: 0,
            });
        }

        Ok(Self { coef, intercept })
    }

    pub fn coef(&self) -> ArrayView1<'_, f64> {
        self.coef.view()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Predicts the target for an already scaled feature vector.
    ///
    /// # Errors
    /// `PipelineErr::DimensionMismatch` if `x` doesn't have one value per coefficient.
    pub fn predict(&self, x: ArrayView1<f64>) -> Result<f64, PipelineErr> {
        if x.len() != self.coef.len() {
            return Err(PipelineErr::DimensionMismatch {
                stage: "model",
                got: x.len(),
                expected: self.coef.len(),
            });
        }

        Ok(x.dot(&self.coef) + self.intercept)
    }
}
