use std::{collections::HashMap, io, path::PathBuf};

use actix_web::{
    error::{InternalError, UrlencodedError},
    middleware::Logger,
    web::{self, Data},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use log::{info, warn};
use serde::Serialize;

use crate::{
    config::Config,
    error::PipelineErr,
    features::{Feature, RawFields, RawValue},
    pipeline::{Outcome, Pipeline},
};

/// Static description of the loaded parameters, served on `/model-info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub features: Vec<&'static str>,
    pub scaler_path: PathBuf,
    pub model_path: PathBuf,
}

impl ModelInfo {
    pub fn new(config: &Config) -> Self {
        Self {
            features: Feature::ALL.iter().map(|f| f.name()).collect(),
            scaler_path: config.scaler_path().clone(),
            model_path: config.model_path().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FormReply {
    results: Outcome,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiReply {
    Prediction { prediction: f64 },
    Error { error: String },
}

/// Registers every route, so tests can mount them on a bare `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(form_rejected))
        .route("/health", web::get().to(health))
        .route("/model-info", web::get().to(model_info))
        .route("/predictdata", web::post().to(predict_form))
        .route("/api/predict", web::post().to(predict_json));
}

/// Serves the HTTP front end until the server is stopped.
pub async fn serve(config: &Config, pipeline: Pipeline, info: ModelInfo) -> io::Result<()> {
    let pipeline = Data::new(pipeline);
    let info = Data::new(info);

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(pipeline.clone())
            .app_data(info.clone())
            .configure(configure)
    });

    if let Some(workers) = config.workers() {
        server = server.workers(workers);
    }

    let (host, port) = config.bind_addr();
    info!("listening at {host}:{port}");
    server.bind((host, port))?.run().await
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn model_info(info: Data<ModelInfo>) -> impl Responder {
    HttpResponse::Ok().json(info.get_ref())
}

/// Unreadable form bodies still get a `results` message rather than a bare 4xx.
fn form_rejected(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    warn!("form rejected: {err}");
    let reply = FormReply {
        results: Outcome::error(&err),
    };
    InternalError::from_response(err, HttpResponse::Ok().json(reply)).into()
}

/// The web form handler, always answers 200 with either the number or the message.
async fn predict_form(
    pipeline: Data<Pipeline>,
    form: web::Form<HashMap<String, String>>,
) -> impl Responder {
    let fields: RawFields = form
        .into_inner()
        .into_iter()
        .map(|(k, v)| (k, RawValue::Text(v)))
        .collect();

    let results = pipeline.respond(&fields);
    if let Outcome::Error(msg) = &results {
        warn!("form prediction failed: {msg}");
    }

    HttpResponse::Ok().json(FormReply { results })
}

async fn predict_json(
    pipeline: Data<Pipeline>,
    body: web::Json<HashMap<String, serde_json::Value>>,
) -> impl Responder {
    let fields: RawFields = body
        .into_inner()
        .into_iter()
        .filter_map(|(k, v)| Some((k, RawValue::from_json(v)?)))
        .collect();

    match pipeline.predict(&fields) {
        Ok(prediction) => HttpResponse::Ok().json(ApiReply::Prediction {
            prediction: prediction.value(),
        }),
        Err(e) => {
            warn!("api prediction failed: {e}");
            let reply = ApiReply::Error {
                error: e.to_string(),
            };
            match e {
                PipelineErr::Validation(_) => HttpResponse::UnprocessableEntity().json(reply),
                _ => HttpResponse::InternalServerError().json(reply),
            }
        }
    }
}
