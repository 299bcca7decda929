//! Sidebar queries embeddable in any page.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use blog_shared::ApiResponse;
use blog_shared::dto::{PostSummary, RankedPostResponse, TotalPostsResponse};

use super::views;
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub count: Option<u64>,
}

/// GET /blog/widgets/most-commented?count=5
pub async fn most_commented(
    state: web::Data<AppState>,
    query: web::Query<CountQuery>,
) -> AppResult<HttpResponse> {
    let ranked = state.blog.most_commented(query.count).await?;
    let body: Vec<RankedPostResponse> = ranked.iter().map(views::ranked).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /blog/widgets/latest?count=5
pub async fn latest_posts(
    state: web::Data<AppState>,
    query: web::Query<CountQuery>,
) -> AppResult<HttpResponse> {
    let posts = state.blog.latest_posts(query.count).await?;
    let body: Vec<PostSummary> = posts.iter().map(views::summary).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /blog/widgets/total
pub async fn total_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let total_posts = state.blog.total_posts().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(TotalPostsResponse { total_posts })))
}
