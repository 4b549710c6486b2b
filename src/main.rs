use std::{env, sync::Arc};

use anyhow::{bail, Context, Result};
use log::info;

use fire_danger::{batch, http::ModelInfo, params, Config, Pipeline};

const USAGE: &str = "Usage: fire-danger [serve|batch]";

#[actix_rt::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("serve");
    if !matches!(mode, "serve" | "batch") {
        bail!("unknown mode '{mode}'. {USAGE}");
    }

    let config = Config::from_env().context("reading configuration")?;

    // Nothing is served unless both parameter sets load.
    let scaler = params::load_scaler(config.scaler_path()).context("loading scaler parameters")?;
    info!("scaler parameters loaded from {}", config.scaler_path().display());
    let model = params::load_ridge(config.model_path()).context("loading model parameters")?;
    info!("model parameters loaded from {}", config.model_path().display());

    let pipeline = Pipeline::new(Arc::new(scaler), Arc::new(model));

    match mode {
        "batch" => {
            batch::run(&pipeline, tokio::io::stdin(), tokio::io::stdout()).await?;
        }
        _ => {
            let info = ModelInfo::new(&config);
            fire_danger::http::serve(&config, pipeline, info).await?;
        }
    }

    Ok(())
}
