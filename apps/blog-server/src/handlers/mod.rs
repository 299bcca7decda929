//! HTTP handlers and route configuration.

mod health;
mod posts;
mod views;
mod widgets;


use actix_web::{error, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| error::Error::from(AppError::BadRequest(err.to_string()))),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| error::Error::from(AppError::BadRequest(err.to_string()))),
    )
    .service(web::scope("/api").route("/health", web::get().to(health::health_check)))
    .service(
        web::scope("/blog")
            .route("", web::get().to(posts::post_list))
            .route("/tag/{tag_slug}", web::get().to(posts::post_list_by_tag))
            // Template-embeddable queries
            .service(
                web::scope("/widgets")
                    .route("/most-commented", web::get().to(widgets::most_commented))
                    .route("/latest", web::get().to(widgets::latest_posts))
                    .route("/total", web::get().to(widgets::total_posts)),
            )
            .route(
                "/{year}/{month}/{day}/{slug}",
                web::get().to(posts::post_detail),
            )
            .route("/{post_id}/comment", web::post().to(posts::post_comment))
            .route("/{post_id}/share", web::post().to(posts::post_share)),
    );
}
