pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::{auth::AuthMiddleware, error::AppError};

/// The whole application: `/health` in the open, everything else under a
/// token-checked `/api` scope.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health).service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            .configure(config),
    );
}

/// Mounts the `/auth` and `/tasks` scopes. Callers wrap the enclosing scope in
/// `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .service(
            web::scope("/auth")
                .service(auth::login)
                .service(auth::register),
        )
        .service(
            web::scope("/tasks")
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task_status)
                .service(tasks::delete_task),
        );
}

/// Undecodable JSON bodies become a 400 with the usual error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Task ids that are not UUIDs are a bad request rather than a missing route.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
