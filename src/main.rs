use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{info, warn};
use sqlx::postgres::PgPoolOptions;

use tasktrail::{config::Config, routes, AppError, AppState};

async fn build_state(config: &Config) -> Result<AppState, AppError> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("using postgres store");
            Ok(AppState::postgres(pool, config))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Ok(AppState::in_memory(
                &config.jwt_secret,
                config.jwt_ttl_secs,
                config.bcrypt_cost,
            ))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;
    let state = web::Data::new(build_state(&config).await.map_err(std::io::Error::other)?);

    info!("Starting tasktrail server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::app_config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
