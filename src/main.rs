mod classifier;
mod config;
mod error;
mod handlers;
mod models;
mod state;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(path = %settings.model_path.display(), "loading model");
    let state = web::Data::new(AppState::load(&settings.model_path));

    tracing::info!("Server running at http://{}:{}", settings.host, settings.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(settings.bind_addr())?
    .run()
    .await
}
