//! Post views: listing, detail, comments and sharing.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use blog_core::forms::{CommentForm, EmailPostForm};
use blog_shared::ApiResponse;
use blog_shared::dto::ShareResponse;

use super::views;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Raw `page` parameter. Kept as text so bad input falls back instead of failing.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// GET /blog
pub async fn post_list(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let listing = state.blog.list_posts(None, query.page.as_deref()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(views::listing(&listing))))
}

/// GET /blog/tag/{tag_slug}
pub async fn post_list_by_tag(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let tag_slug = path.into_inner();
    let listing = state
        .blog
        .list_posts(Some(&tag_slug), query.page.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(views::listing(&listing))))
}

/// GET /blog/{year}/{month}/{day}/{slug}
pub async fn post_detail(
    state: web::Data<AppState>,
    path: web::Path<(i32, u32, u32, String)>,
) -> AppResult<HttpResponse> {
    let (year, month, day, slug) = path.into_inner();
    let detail = state.blog.post_detail(year, month, day, &slug).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(views::detail(&detail))))
}

/// POST /blog/{post_id}/comment
pub async fn post_comment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let comment = state.blog.add_comment(path.into_inner(), &body).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        views::comment(&comment),
        "Your comment has been added.",
    )))
}

/// POST /blog/{post_id}/share
pub async fn post_share(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<EmailPostForm>,
) -> AppResult<HttpResponse> {
    let shared = state.blog.share_post(path.into_inner(), &body).await?;
    let message = format!("'{}' was successfully sent to {}.", shared.post.title, shared.recipient);
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        ShareResponse {
            sent: shared.sent,
            post: views::summary(&shared.post),
            recipient: shared.recipient,
        },
        message,
    )))
}
