//! Loading of the scaler and model parameters exported by the offline training step.
//!
//! Both files are JSON documents whose keys follow the fitted estimators' attribute names
//! (`mean_`, `scale_`, `coef_`, `intercept_`, ...). Any failure here is fatal at startup.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    error::ParamErr,
    features::{Feature, N_FEATURES},
    model::Ridge,
    scaler::Scaler,
};

#[derive(Debug, Deserialize)]
struct ScalerFile {
    #[serde(rename = "mean_", alias = "mean")]
    mean: Option<Vec<f64>>,
    #[serde(rename = "scale_", alias = "scale")]
    scale: Option<Vec<f64>>,
    #[serde(rename = "n_features_in_", alias = "n_features")]
    n_features: Option<usize>,
    #[serde(rename = "feature_names_in_", alias = "feature_names")]
    feature_names: Option<Vec<String>>,
}

/// Estimators fitted on a 2-D target store their coefficients as a single row matrix.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coef {
    Flat(Vec<f64>),
    Rows(Vec<Vec<f64>>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Intercept {
    Scalar(f64),
    Vector(Vec<f64>),
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(rename = "coef_", alias = "coef")]
    coef: Coef,
    #[serde(rename = "intercept_", alias = "intercept", default)]
    intercept: Option<Intercept>,
    #[serde(rename = "n_features_in_", alias = "n_features")]
    n_features: Option<usize>,
    #[serde(rename = "feature_names_in_", alias = "feature_names")]
    feature_names: Option<Vec<String>>,
}

/// Parses scaler parameters from a JSON document.
pub fn parse_scaler(json: &str) -> Result<Scaler, ParamErr> {
    let file: ScalerFile = serde_json::from_str(json)?;
    check_layout(file.n_features, file.feature_names.as_deref())?;
    Scaler::new(file.mean, file.scale)
}

/// Parses ridge model parameters from a JSON document.
pub fn parse_ridge(json: &str) -> Result<Ridge, ParamErr> {
    let file: ModelFile = serde_json::from_str(json)?;
    check_layout(file.n_features, file.feature_names.as_deref())?;

    let coef = match file.coef {
        Coef::Flat(coef) => coef,
        Coef::Rows(mut rows) => {
            if rows.len() != 1 {
                return Err(ParamErr::DimensionMismatch {
                    what: "model coef rows",
                    got: rows.len(),
                    expected: 1,
                });
            }
            rows.remove(0)
        }
    };

    let intercept = match file.intercept {
        None => 0.0,
        Some(Intercept::Scalar(intercept)) => intercept,
        Some(Intercept::Vector(intercepts)) => match intercepts[..] {
            [intercept] => intercept,
            _ => {
                return Err(ParamErr::DimensionMismatch {
                    what: "model intercept",
                    got: intercepts.len(),
                    expected: 1,
                })
            }
        },
    };

    Ridge::new(coef, intercept)
}

/// Loads the scaler parameters file.
pub fn load_scaler<P: AsRef<Path>>(path: P) -> Result<Scaler, ParamErr> {
    let path = path.as_ref();
    parse_scaler(&read(path)?).map_err(|e| e.at(path.to_path_buf()))
}

/// Loads the ridge model parameters file.
pub fn load_ridge<P: AsRef<Path>>(path: P) -> Result<Ridge, ParamErr> {
    let path = path.as_ref();
    parse_ridge(&read(path)?).map_err(|e| e.at(path.to_path_buf()))
}

fn read(path: &Path) -> Result<String, ParamErr> {
    fs::read_to_string(path).map_err(|source| ParamErr::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Checks the optional fitting metadata matches the feature order this service feeds.
fn check_layout(n_features: Option<usize>, names: Option<&[String]>) -> Result<(), ParamErr> {
    if let Some(n) = n_features {
        if n != N_FEATURES {
            return Err(ParamErr::DimensionMismatch {
                what: "n_features_in_",
                got: n,
                expected: N_FEATURES,
            });
        }
    }

    let Some(names) = names else {
        return Ok(());
    };

    if names.len() != N_FEATURES {
        return Err(ParamErr::DimensionMismatch {
            what: "feature_names_in_",
            got: names.len(),
            expected: N_FEATURES,
        });
    }

    // The training CSV has padded headers such as " RH".
    for (index, (got, feature)) in names.iter().zip(Feature::ALL).enumerate() {
        if got.trim() != feature.name() {
            return Err(ParamErr::FeatureOrder {
                index,
                got: got.clone(),
                expected: feature.name(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exported_scaler() {
        let scaler = parse_scaler(
            r#"{
                "mean_": [20, 50, 10, 1, 80, 5, 4, 0.5, 0.5],
                "scale_": [5, 10, 5, 2, 5, 5, 2, 0.5, 0.5],
                "n_features_in_": 9,
                "feature_names_in_": ["Temperature", " RH", " Ws", "Rain ", "FFMC", "DMC", "ISI", "Classes", "Region"]
            }"#,
        )
        .unwrap();

        assert_eq!(scaler.mean()[1], 50.0);
        assert_eq!(scaler.scale()[3], 2.0);
    }

    #[test]
    fn accepts_plain_key_aliases() {
        let scaler = parse_scaler(r#"{"mean": [0,0,0,0,0,0,0,0,0], "scale": [1,1,1,1,1,1,1,1,1]}"#);
        assert!(scaler.is_ok());

        let ridge = parse_ridge(r#"{"coef": [1,2,3,4,5,6,7,8,9], "intercept": 0.5}"#).unwrap();
        assert_eq!(ridge.intercept(), 0.5);
    }

    #[test]
    fn parses_row_matrix_coefficients() {
        let ridge =
            parse_ridge(r#"{"coef_": [[1,2,3,4,5,6,7,8,9]], "intercept_": [-1.5]}"#).unwrap();
        assert_eq!(ridge.coef()[8], 9.0);
        assert_eq!(ridge.intercept(), -1.5);
    }

    #[test]
    fn intercept_defaults_to_zero() {
        let ridge = parse_ridge(r#"{"coef_": [1,1,1,1,1,1,1,1,1]}"#).unwrap();
        assert_eq!(ridge.intercept(), 0.0);
    }

    #[test]
    fn rejects_a_different_feature_count() {
        let err = parse_ridge(r#"{"coef_": [1,1,1,1,1,1,1,1,1], "n_features_in_": 10}"#)
            .unwrap_err();
        assert!(matches!(err, ParamErr::DimensionMismatch { got: 10, .. }));

        let err = parse_ridge(r#"{"coef_": [[1,1,1,1,1,1,1,1,1], [1,1,1,1,1,1,1,1,1]]}"#)
            .unwrap_err();
        assert!(matches!(err, ParamErr::DimensionMismatch { got: 2, expected: 1, .. }));
    }

    #[test]
    fn rejects_a_different_feature_order() {
        let err = parse_scaler(
            r#"{
                "mean_": [0,0,0,0,0,0,0,0,0],
                "feature_names_in_": ["RH", "Temperature", "Ws", "Rain", "FFMC", "DMC", "ISI", "Classes", "Region"]
            }"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ParamErr::FeatureOrder { index: 0, expected: "Temperature", .. }
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_scaler("{ not json").unwrap_err();
        assert!(matches!(err, ParamErr::Malformed { path: None, .. }));
    }
}
