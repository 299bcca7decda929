//! Domain to DTO conversions for the view contexts.

use blog_core::domain::{Comment, Post, Tag};
use blog_core::pagination::Page;
use blog_core::services::{PostDetail, PostListing, RankedPost};
use blog_shared::dto::{
    CommentResponse, PageResponse, PostDetailResponse, PostListResponse, PostResponse,
    PostSummary, RankedPostResponse, TagResponse,
};

pub fn tag(tag: &Tag) -> TagResponse {
    TagResponse {
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    }
}

pub fn summary(post: &Post) -> PostSummary {
    PostSummary {
        id: post.id,
        title: post.title.clone(),
        slug: post.slug.clone(),
        author_id: post.author_id,
        publish: post.publish.to_rfc3339(),
        url: post.absolute_path(),
        tags: post.tags.iter().map(tag).collect(),
    }
}

fn post(post: &Post) -> PostResponse {
    PostResponse {
        summary: summary(post),
        body: post.body.clone(),
        status: post.status.as_str().to_string(),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

pub fn comment(comment: &Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        name: comment.name.clone(),
        body: comment.body.clone(),
        created_at: comment.created_at.to_rfc3339(),
        active: comment.active,
    }
}

fn page(page: &Page<Post>) -> PageResponse<PostSummary> {
    PageResponse {
        items: page.items.iter().map(summary).collect(),
        number: page.number,
        num_pages: page.num_pages,
        total: page.total,
        per_page: page.per_page,
        has_next: page.has_next(),
        has_previous: page.has_previous(),
        next_page_number: page.next_page_number(),
        previous_page_number: page.previous_page_number(),
    }
}

pub fn listing(listing: &PostListing) -> PostListResponse {
    PostListResponse {
        tag: listing.tag.as_ref().map(tag),
        page: page(&listing.page),
    }
}

pub fn detail(detail: &PostDetail) -> PostDetailResponse {
    PostDetailResponse {
        post: post(&detail.post),
        comments: detail.comments.iter().map(comment).collect(),
        similar_posts: detail.similar_posts.iter().map(summary).collect(),
    }
}

pub fn ranked(ranked: &RankedPost) -> RankedPostResponse {
    RankedPostResponse {
        post: summary(&ranked.post),
        total_comments: ranked.total_comments,
    }
}
