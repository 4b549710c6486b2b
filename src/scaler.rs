use ndarray::{Array1, ArrayView1};

use crate::{
    error::{ParamErr, PipelineErr},
    features::N_FEATURES,
};

/// A pre-fitted standard scaler, `(x - mean) / scale` per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    /// Creates a new `Scaler` out of fitted parameters.
    ///
    /// A missing `mean` behaves as zero and a missing `scale` as one, which is what a scaler
    /// fitted without centering or without scaling stores. Zero scales are replaced by one.
    ///
    /// # Errors
    /// `ParamErr` if neither is given, or either has the wrong size or non finite values.
    pub fn new(mean: Option<Vec<f64>>, scale: Option<Vec<f64>>) -> Result<Self, ParamErr> {
        if mean.is_none() && scale.is_none() {
            return Err(ParamErr::MissingField("mean or scale"));
        }

        let mean = match mean {
            Some(mean) => checked("scaler mean", mean)?,
            None => Array1::zeros(N_FEATURES),
        };

        let scale = match scale {
            Some(scale) => checked("scaler scale", scale)?
                .mapv_into(|s| if s == 0.0 { 1.0 } else { s }),
            None => Array1::ones(N_FEATURES),
        };

        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn scale(&self) -> ArrayView1<'_, f64> {
        self.scale.view()
    }

    /// Standardizes a raw feature vector.
    ///
    /// # Errors
    /// `PipelineErr::DimensionMismatch` if `x` doesn't have one value per fitted feature.
    pub fn transform(&self, x: ArrayView1<f64>) -> Result<Array1<f64>, PipelineErr> {
        if x.len() != self.mean.len() {
            return Err(PipelineErr::DimensionMismatch {
                stage: "scaler",
                got: x.len(),
                expected: self.mean.len(),
            });
        }

        let mut out = &x - &self.mean;
        out /= &self.scale;
        Ok(out)
    }
}

/// Checks a fitted parameter vector has one finite value per feature.
pub(crate) fn checked(what: &'static str, values: Vec<f64>) -> Result<Array1<f64>, ParamErr> {
    if values.len() != N_FEATURES {
        return Err(ParamErr::DimensionMismatch {
            what,
            got: values.len(),
            expected: N_FEATURES,
        });
    }

    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(ParamErr::NonFinite { what, index });
    }

    Ok(Array1::from(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn scaler() -> Scaler {
        Scaler::new(
            Some(vec![20.0, 50.0, 10.0, 1.0, 80.0, 5.0, 4.0, 0.5, 0.5]),
            Some(vec![5.0, 10.0, 5.0, 2.0, 5.0, 5.0, 2.0, 0.5, 0.5]),
        )
        .unwrap()
    }

    #[test]
    fn standardizes_each_feature() {
        let x = array![25.0, 60.0, 15.0, 0.0, 85.0, 10.0, 5.0, 0.0, 0.0];
        let z = scaler().transform(x.view()).unwrap();
        assert_eq!(z, array![1.0, 1.0, 1.0, -0.5, 1.0, 1.0, 0.5, -1.0, -1.0]);
    }

    #[test]
    fn transform_is_bit_deterministic() {
        let x = array![31.7, 43.1, 13.9, 0.2, 88.4, 17.3, 6.6, 1.0, 1.0];
        let s = scaler();
        let a = s.transform(x.view()).unwrap();
        let b = s.transform(x.view()).unwrap();
        assert!(a.iter().zip(&b).all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn wrong_length_is_a_dimension_mismatch() {
        let x = array![1.0, 2.0, 3.0];
        let err = scaler().transform(x.view()).unwrap_err();
        assert!(matches!(
            err,
            PipelineErr::DimensionMismatch {
                stage: "scaler",
                got: 3,
                expected: 9
            }
        ));
    }

    #[test]
    fn zero_scale_behaves_as_one() {
        let s = Scaler::new(Some(vec![1.0; 9]), Some(vec![0.0; 9])).unwrap();
        let z = s.transform(Array1::from_elem(9, 3.0).view()).unwrap();
        assert_eq!(z, Array1::from_elem(9, 2.0));
    }

    #[test]
    fn missing_parts_fall_back_to_identity() {
        let only_scale = Scaler::new(None, Some(vec![2.0; 9])).unwrap();
        assert_eq!(only_scale.mean(), Array1::<f64>::zeros(9));

        let only_mean = Scaler::new(Some(vec![1.0; 9]), None).unwrap();
        assert_eq!(only_mean.scale(), Array1::<f64>::ones(9));

        assert!(matches!(
            Scaler::new(None, None),
            Err(ParamErr::MissingField(_))
        ));
    }

    #[test]
    fn rejects_bad_fitted_parameters() {
        assert!(matches!(
            Scaler::new(Some(vec![0.0; 8]), None),
            Err(ParamErr::DimensionMismatch { got: 8, expected: 9, .. })
        ));

        let mut scale = vec![1.0; 9];
        scale[4] = f64::NAN;
        assert!(matches!(
            Scaler::new(None, Some(scale)),
            Err(ParamErr::NonFinite { index: 4, .. })
        ));
    }
}
