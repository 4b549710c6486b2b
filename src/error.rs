use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use crate::features::Feature;

/// What went wrong with a single input field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldIssue {
    Missing,
    Empty,
    NotNumeric(String),
    NotFinite(String),
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing => write!(f, "is missing"),
            FieldIssue::Empty => write!(f, "is empty"),
            FieldIssue::NotNumeric(raw) => write!(f, "'{raw}' is not a number"),
            FieldIssue::NotFinite(raw) => write!(f, "'{raw}' is not a finite number"),
        }
    }
}

/// Raised when the raw input fields can't be turned into a feature vector.
///
/// Holds every offending field, in feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    issues: Vec<(Feature, FieldIssue)>,
}

impl ValidationError {
    pub(crate) fn new(issues: Vec<(Feature, FieldIssue)>) -> Self {
        Self { issues }
    }

    /// Returns the offending fields with what is wrong with each of them.
    pub fn issues(&self) -> &[(Feature, FieldIssue)] {
        &self.issues
    }

    /// Returns whether the given feature is among the offending ones.
    pub fn concerns(&self, feature: Feature) -> bool {
        self.issues.iter().any(|(f, _)| *f == feature)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input: ")?;
        for (i, (feature, issue)) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} {issue}", feature.name())?;
        }
        Ok(())
    }
}

impl Error for ValidationError {}

/// Per request failures of the inference pipeline.
#[derive(Debug)]
pub enum PipelineErr {
    Validation(ValidationError),
    DimensionMismatch {
        stage: &'static str,
        got: usize,
        expected: usize,
    },
    NonFinitePrediction(f64),
}

impl Display for PipelineErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineErr::Validation(e) => write!(f, "{e}"),
            PipelineErr::DimensionMismatch {
                stage,
                got,
                expected,
            } => write!(
                f,
                "dimension mismatch in {stage}: got {got} values, expected {expected}"
            ),
            PipelineErr::NonFinitePrediction(value) => {
                write!(f, "internal error: the model produced a non finite value ({value})")
            }
        }
    }
}

impl Error for PipelineErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineErr::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for PipelineErr {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Startup failures while loading the scaler and model parameters.
#[derive(Debug)]
pub enum ParamErr {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Malformed {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    MissingField(&'static str),
    DimensionMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    NonFinite {
        what: &'static str,
        index: usize,
    },
    FeatureOrder {
        index: usize,
        got: String,
        expected: &'static str,
    },
}

impl ParamErr {
    pub(crate) fn at(self, path: PathBuf) -> Self {
        match self {
            ParamErr::Malformed { source, .. } => ParamErr::Malformed {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl Display for ParamErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamErr::Io { path, source } => {
                write!(f, "cannot read '{}': {source}", path.display())
            }
            ParamErr::Malformed {
                path: Some(path),
                source,
            } => write!(f, "malformed parameters in '{}': {source}", path.display()),
            ParamErr::Malformed { path: None, source } => {
                write!(f, "malformed parameters: {source}")
            }
            ParamErr::MissingField(field) => write!(f, "missing field: {field}"),
            ParamErr::DimensionMismatch {
                what,
                got,
                expected,
            } => write!(f, "{what} has {got} values, expected {expected}"),
            ParamErr::NonFinite { what, index } => {
                write!(f, "{what}[{index}] is not a finite number")
            }
            ParamErr::FeatureOrder {
                index,
                got,
                expected,
            } => write!(
                f,
                "feature {index} was fitted as '{got}' but this service feeds '{expected}'"
            ),
        }
    }
}

impl Error for ParamErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParamErr::Io { source, .. } => Some(source),
            ParamErr::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ParamErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed {
            path: None,
            source: value,
        }
    }
}

/// Invalid environment configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigErr {
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::InvalidVar { var, value, reason } => {
                write!(f, "invalid {var}='{value}': {reason}")
            }
        }
    }
}

impl Error for ConfigErr {}
