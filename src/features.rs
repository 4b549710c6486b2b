use std::collections::HashMap;

use ndarray::ArrayView1;

use crate::error::{FieldIssue, ValidationError};

/// Amount of features both the scaler and the model were fitted on.
pub const N_FEATURES: usize = 9;

/// The raw input fields of a single request, keyed by field name.
pub type RawFields = HashMap<String, RawValue>;

/// The model's input features, in the exact order they were fitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Temperature,
    RelativeHumidity,
    WindSpeed,
    Rain,
    Ffmc,
    Dmc,
    Isi,
    FireClass,
    Region,
}

impl Feature {
    /// Every feature, in fitting order.
    pub const ALL: [Feature; N_FEATURES] = [
        Feature::Temperature,
        Feature::RelativeHumidity,
        Feature::WindSpeed,
        Feature::Rain,
        Feature::Ffmc,
        Feature::Dmc,
        Feature::Isi,
        Feature::FireClass,
        Feature::Region,
    ];

    /// Returns the position of this feature inside a `FeatureVector`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the column name this feature had in the training data.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Temperature => "Temperature",
            Feature::RelativeHumidity => "RH",
            Feature::WindSpeed => "Ws",
            Feature::Rain => "Rain",
            Feature::Ffmc => "FFMC",
            Feature::Dmc => "DMC",
            Feature::Isi => "ISI",
            Feature::FireClass => "Classes",
            Feature::Region => "Region",
        }
    }

    /// Other keys a front end may send this feature under.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            // The web form has always spelled it this way.
            Feature::Temperature => &["Temprature"],
            Feature::RelativeHumidity => &["RelativeHumidity"],
            Feature::WindSpeed => &["WS", "WindSpeed"],
            Feature::Rain => &[],
            Feature::Ffmc => &[],
            Feature::Dmc => &[],
            Feature::Isi => &[],
            Feature::FireClass => &["FireClass"],
            Feature::Region => &[],
        }
    }

    /// Finds the feature a field key refers to.
    pub fn from_key(key: &str) -> Option<Feature> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == key || f.aliases().contains(&key))
    }

    /// Maps a dashboard label to its encoded value, for the categorical features only.
    fn decode_label(self, raw: &str) -> Option<f64> {
        let label = raw
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match (self, label.as_str()) {
            (Feature::FireClass, "fire") => Some(1.0),
            (Feature::FireClass, "not fire") => Some(0.0),
            (Feature::Region, "bejaia") => Some(0.0),
            (Feature::Region, "sidi bel abbes") => Some(1.0),
            _ => None,
        }
    }

    fn parse(self, value: &RawValue) -> Result<f64, FieldIssue> {
        let (parsed, raw) = match value {
            RawValue::Number(n) => (*n, n.to_string()),
            RawValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(FieldIssue::Empty);
                }

                match trimmed.parse::<f64>() {
                    Ok(n) => (n, trimmed.to_string()),
                    Err(_) => {
                        return self
                            .decode_label(trimmed)
                            .ok_or_else(|| FieldIssue::NotNumeric(trimmed.to_string()));
                    }
                }
            }
        };

        if !parsed.is_finite() {
            return Err(FieldIssue::NotFinite(raw));
        }

        Ok(parsed)
    }
}

/// A single raw input value as a front end received it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Converts a JSON value, `null` counts as an absent field.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Number(n) => Some(match n.as_f64() {
                Some(n) => RawValue::Number(n),
                None => RawValue::Text(n.to_string()),
            }),
            serde_json::Value::String(s) => Some(RawValue::Text(s)),
            other => Some(RawValue::Text(other.to_string())),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The nine model inputs in fitting order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    /// Builds a feature vector out of the raw fields of a request.
    ///
    /// # Arguments
    /// * `fields` - The raw values keyed by feature name or alias, unknown keys are ignored.
    ///
    /// # Returns
    /// The feature vector or a `ValidationError` listing every missing or unparseable field.
    pub fn from_fields(fields: &RawFields) -> Result<Self, ValidationError> {
        let mut values = [0.0; N_FEATURES];
        let mut issues = Vec::new();

        for feature in Feature::ALL {
            let raw = std::iter::once(feature.name())
                .chain(feature.aliases().iter().copied())
                .find_map(|key| fields.get(key));

            let Some(raw) = raw else {
                issues.push((feature, FieldIssue::Missing));
                continue;
            };

            match feature.parse(raw) {
                Ok(value) => values[feature.index()] = value,
                Err(issue) => issues.push((feature, issue)),
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        Ok(Self(values))
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn values(&self) -> &[f64; N_FEATURES] {
        &self.0
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.0[..])
    }
}
