use std::{fmt, sync::Arc};

use log::debug;
use serde::{Serialize, Serializer};

use crate::{
    error::PipelineErr,
    features::{FeatureVector, RawFields},
    model::Ridge,
    scaler::Scaler,
};

/// Rounds like the training side's `round(x, 2)` does: to the decimal closest to the exact
/// binary value, ties to even.
pub fn round_2dp(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// A fire danger prediction, already rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction(f64);

impl Prediction {
    fn new(raw: f64) -> Result<Self, PipelineErr> {
        if !raw.is_finite() {
            return Err(PipelineErr::NonFinitePrediction(raw));
        }

        Ok(Self(round_2dp(raw)))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

/// What a front end shows for one request: a prediction or an error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Value(Prediction),
    Error(String),
}

impl Outcome {
    pub fn error(err: impl fmt::Display) -> Self {
        Self::Error(format!("Error: {err}"))
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }
}

impl From<Result<Prediction, PipelineErr>> for Outcome {
    fn from(result: Result<Prediction, PipelineErr>) -> Self {
        match result {
            Ok(prediction) => Outcome::Value(prediction),
            Err(e) => Outcome::error(e),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(prediction) => write!(f, "{prediction}"),
            Outcome::Error(msg) => write!(f, "{msg}"),
        }
    }
}

/// Builder -> scaler -> model -> rounding, shared by every front end.
///
/// Cloning is cheap, the fitted parameters are behind `Arc`s and never mutated.
#[derive(Debug, Clone)]
pub struct Pipeline {
    scaler: Arc<Scaler>,
    model: Arc<Ridge>,
}

impl Pipeline {
    pub fn new(scaler: Arc<Scaler>, model: Arc<Ridge>) -> Self {
        Self { scaler, model }
    }

    /// Runs a single request through the whole pipeline.
    ///
    /// # Arguments
    /// * `fields` - The raw values of the request keyed by feature name.
    ///
    /// # Returns
    /// The rounded prediction or the error of the first stage that failed.
    pub fn predict(&self, fields: &RawFields) -> Result<Prediction, PipelineErr> {
        let features = FeatureVector::from_fields(fields)?;
        self.predict_vector(&features)
    }

    /// Runs an already built feature vector through the scaler and the model.
    pub fn predict_vector(&self, features: &FeatureVector) -> Result<Prediction, PipelineErr> {
        let scaled = self.scaler.transform(features.view())?;
        let raw = self.model.predict(scaled.view())?;
        debug!("predicted {raw} for {:?}", features.values());
        Prediction::new(raw)
    }

    /// Same as `predict` but folds any failure into a displayable message.
    pub fn respond(&self, fields: &RawFields) -> Outcome {
        self.predict(fields).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Feature, RawValue};

    fn pipeline() -> Pipeline {
        let scaler = Scaler::new(
            Some(vec![20.0, 50.0, 10.0, 1.0, 80.0, 5.0, 4.0, 0.5, 0.5]),
            Some(vec![5.0, 10.0, 5.0, 2.0, 5.0, 5.0, 2.0, 0.5, 0.5]),
        )
        .unwrap();
        let model =
            Ridge::new(vec![0.5, -0.25, 0.75, -1.0, 2.0, 1.5, 3.0, 0.4, -0.2], 10.0).unwrap();
        Pipeline::new(Arc::new(scaler), Arc::new(model))
    }

    #[test]
    fn rounds_like_the_training_side() {
        assert_eq!(round_2dp(16.299999999999997), 16.3);
        assert_eq!(round_2dp(2.675), 2.67);
        assert_eq!(round_2dp(1.005), 1.0);
        assert_eq!(round_2dp(0.125), 0.12);
        assert_eq!(round_2dp(-3.14159), -3.14);
    }

    #[test]
    fn prediction_always_shows_two_decimals() {
        let p = Prediction::new(7.0).unwrap();
        assert_eq!(p.to_string(), "7.00");
        assert_eq!(Prediction::new(3.14159).unwrap().to_string(), "3.14");
    }

    #[test]
    fn non_finite_predictions_are_internal_errors() {
        assert!(matches!(
            Prediction::new(f64::NAN),
            Err(PipelineErr::NonFinitePrediction(_))
        ));
    }

    #[test]
    fn invalid_fields_become_an_error_message() {
        let mut fields: RawFields = Feature::ALL
            .iter()
            .map(|f| (f.name().to_string(), RawValue::Number(1.0)))
            .collect();
        fields.insert("ISI".into(), "high".into());

        let outcome = pipeline().respond(&fields);
        assert!(!outcome.is_value());
        assert_eq!(
            outcome.to_string(),
            "Error: invalid input: ISI 'high' is not a number"
        );
    }

    #[test]
    fn outcome_serializes_as_number_or_message() {
        let value = Outcome::Value(Prediction::new(4.5).unwrap());
        assert_eq!(serde_json::to_string(&value).unwrap(), "4.5");

        let err = Outcome::Error("Error: boom".into());
        assert_eq!(serde_json::to_string(&err).unwrap(), r#""Error: boom""#);
    }
}
