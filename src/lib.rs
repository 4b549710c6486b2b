pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod http;
pub mod model;
pub mod params;
pub mod pipeline;
pub mod scaler;

pub use config::Config;
pub use error::{ConfigErr, ParamErr, PipelineErr, ValidationError};
pub use features::{Feature, FeatureVector, RawFields, RawValue};
pub use model::Ridge;
pub use pipeline::{Outcome, Pipeline, Prediction};
pub use scaler::Scaler;
