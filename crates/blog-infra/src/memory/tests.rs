use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, PostStatus, User};
use blog_core::forms::{CommentForm, EmailPostForm, INVALID_EMAIL, PostForm, REQUIRED};
use blog_core::ports::{
    BaseRepository, CommentRepository, MailError, Mailer, OutgoingEmail, PostRepository,
    TagRepository,
};
use blog_core::services::Repositories;
use blog_core::{BlogService, BlogSettings, DomainError};

use super::InMemoryStore;
use crate::mail::InMemoryMailer;

struct Fixture {
    store: InMemoryStore,
    mailer: Arc<InMemoryMailer>,
    service: BlogService,
    author: User,
}

fn repositories(store: &InMemoryStore) -> Repositories {
    Repositories {
        users: Arc::new(store.users()),
        posts: Arc::new(store.posts()),
        comments: Arc::new(store.comments()),
        tags: Arc::new(store.tags()),
    }
}

fn settings() -> BlogSettings {
    BlogSettings {
        site_url: "http://blog.test".to_string(),
        ..BlogSettings::default()
    }
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 9, 0, 0).unwrap()
}

async fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    let mailer = Arc::new(InMemoryMailer::new());
    let service = BlogService::new(repositories(&store), mailer.clone(), settings());
    let author = store
        .users()
        .save(User::new("admin".into(), "admin@myblog.com".into()))
        .await
        .unwrap();

    Fixture {
        store,
        mailer,
        service,
        author,
    }
}

impl Fixture {
    async fn post(
        &self,
        title: &str,
        status: PostStatus,
        publish: DateTime<Utc>,
        tags: &[&str],
    ) -> Post {
        let mut attached = Vec::new();
        for name in tags {
            attached.push(self.store.tags().get_or_create(name).await.unwrap());
        }
        let post = Post::new(self.author.id, title.to_string(), format!("{} body", title))
            .with_status(status)
            .with_publish(publish)
            .with_tags(attached);
        self.store.posts().save(post).await.unwrap()
    }

    async fn published(&self, title: &str, publish: DateTime<Utc>, tags: &[&str]) -> Post {
        self.post(title, PostStatus::Published, publish, tags).await
    }

    async fn comments(&self, post: &Post, n: usize) {
        for i in 0..n {
            let comment = Comment::new(
                post.id,
                format!("Reader {}", i),
                "reader@example.com".into(),
                "Great".into(),
            );
            self.store.comments().save(comment).await.unwrap();
        }
    }
}

fn titles(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.title.as_str()).collect()
}

#[tokio::test]
async fn test_published_view_excludes_drafts() {
    let fx = fixture().await;
    let published = fx.published("Live", day(2), &[]).await;
    let draft = fx.post("Draft", PostStatus::Draft, day(3), &[]).await;

    let listing = fx.service.list_posts(None, None).await.unwrap();
    assert_eq!(titles(&listing.page.items), vec!["Live"]);
    assert_eq!(fx.service.total_posts().await.unwrap(), 1);

    let posts = fx.store.posts();
    assert!(posts.find_published_by_id(published.id).await.unwrap().is_some());
    assert!(posts.find_published_by_id(draft.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_is_newest_first_and_paginated() {
    let fx = fixture().await;
    for d in 1..=7 {
        fx.published(&format!("Post {}", d), day(d), &[]).await;
    }

    let first = fx.service.list_posts(None, Some("1")).await.unwrap();
    assert_eq!(titles(&first.page.items), vec!["Post 7", "Post 6", "Post 5"]);
    assert_eq!(first.page.num_pages, 3);
    assert_eq!(first.page.total, 7);

    let last = fx.service.list_posts(None, Some("3")).await.unwrap();
    assert_eq!(titles(&last.page.items), vec!["Post 1"]);
}

#[tokio::test]
async fn test_list_non_numeric_page_is_first_page() {
    let fx = fixture().await;
    for d in 1..=5 {
        fx.published(&format!("Post {}", d), day(d), &[]).await;
    }

    let fallback = fx.service.list_posts(None, Some("abc")).await.unwrap();
    let first = fx.service.list_posts(None, Some("1")).await.unwrap();
    assert_eq!(fallback.page.number, 1);
    assert_eq!(titles(&fallback.page.items), titles(&first.page.items));
}

#[tokio::test]
async fn test_list_out_of_range_page_is_last_page() {
    let fx = fixture().await;
    for d in 1..=5 {
        fx.published(&format!("Post {}", d), day(d), &[]).await;
    }

    let fallback = fx.service.list_posts(None, Some("9999")).await.unwrap();
    let last = fx.service.list_posts(None, Some("2")).await.unwrap();
    assert_eq!(fallback.page.number, 2);
    assert_eq!(titles(&fallback.page.items), titles(&last.page.items));
    assert_eq!(titles(&fallback.page.items), vec!["Post 2", "Post 1"]);
}

#[tokio::test]
async fn test_list_by_tag() {
    let fx = fixture().await;
    let hello = fx
        .published("Hello", Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(), &["python"])
        .await;
    fx.published("Other", day(16), &["rust"]).await;
    fx.post("Hidden", PostStatus::Draft, day(17), &["python"]).await;

    let listing = fx.service.list_posts(Some("python"), Some("1")).await.unwrap();
    assert_eq!(listing.tag.as_ref().map(|t| t.name.as_str()), Some("python"));
    assert_eq!(listing.page.items.len(), 1);
    assert_eq!(listing.page.items[0].id, hello.id);
}

#[tokio::test]
async fn test_list_unknown_tag_is_not_found() {
    let fx = fixture().await;
    let result = fx.service.list_posts(Some("nope"), None).await;
    assert!(matches!(result, Err(DomainError::NotFound { entity_type: "Tag", .. })));
}

#[tokio::test]
async fn test_detail_lookup() {
    let fx = fixture().await;
    let publish = Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap();
    let post = fx.published("Hello", publish, &[]).await;

    let detail = fx.service.post_detail(2024, 1, 15, "hello").await.unwrap();
    assert_eq!(detail.post.id, post.id);
}

#[tokio::test]
async fn test_detail_not_found() {
    let fx = fixture().await;
    fx.published("Hello", day(15), &[]).await;
    fx.post("Draft", PostStatus::Draft, day(15), &[]).await;

    for (y, m, d, slug) in [
        (2024, 1, 15, "missing"),
        (2024, 1, 14, "hello"),
        (2023, 1, 15, "hello"),
        (2024, 13, 15, "hello"),
        (2024, 2, 30, "hello"),
        (2024, 1, 15, "draft"),
    ] {
        let result = fx.service.post_detail(y, m, d, slug).await;
        assert!(
            matches!(result, Err(DomainError::NotFound { entity_type: "Post", .. })),
            "expected NotFound for {}/{}/{}/{}",
            y,
            m,
            d,
            slug
        );
    }
}

#[tokio::test]
async fn test_detail_shows_active_comments_in_order() {
    let fx = fixture().await;
    let post = fx.published("Hello", day(15), &[]).await;
    let comments = fx.store.comments();

    let base = Utc::now();
    let mut later = Comment::new(post.id, "Later".into(), "l@example.com".into(), "2".into());
    later.created_at = base + Duration::seconds(10);
    let mut earlier = Comment::new(post.id, "Earlier".into(), "e@example.com".into(), "1".into());
    earlier.created_at = base;
    let mut hidden = Comment::new(post.id, "Hidden".into(), "h@example.com".into(), "x".into());
    hidden.deactivate();
    for comment in [later, earlier, hidden] {
        comments.save(comment).await.unwrap();
    }

    let detail = fx.service.post_detail(2024, 1, 15, "hello").await.unwrap();
    let names: Vec<&str> = detail.comments.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Earlier", "Later"]);
}

#[tokio::test]
async fn test_similar_posts_ranked_by_shared_tags() {
    let fx = fixture().await;
    fx.published("Current", day(10), &["a", "b"]).await;
    // Newer but shares only one tag.
    fx.published("Shares A", day(20), &["a"]).await;
    fx.published("Shares AB", day(5), &["a", "b"]).await;
    fx.published("Unrelated", day(21), &["c"]).await;
    fx.post("Draft AB", PostStatus::Draft, day(22), &["a", "b"]).await;

    let detail = fx.service.post_detail(2024, 1, 10, "current").await.unwrap();
    assert_eq!(titles(&detail.similar_posts), vec!["Shares AB", "Shares A"]);
}

#[tokio::test]
async fn test_similar_posts_tie_broken_by_publish_and_limited() {
    let fx = fixture().await;
    fx.published("Current", day(1), &["a"]).await;
    for d in 2..=7 {
        fx.published(&format!("Peer {}", d), day(d), &["a"]).await;
    }

    let detail = fx.service.post_detail(2024, 1, 1, "current").await.unwrap();
    assert_eq!(
        titles(&detail.similar_posts),
        vec!["Peer 7", "Peer 6", "Peer 5", "Peer 4"]
    );
}

#[tokio::test]
async fn test_add_comment_persists_active_comment() {
    let fx = fixture().await;
    let post = fx.published("Hello", day(15), &[]).await;

    let form = CommentForm {
        name: "Bob".into(),
        email: "bob@example.com".into(),
        body: "Nice post".into(),
    };
    let comment = fx.service.add_comment(post.id, &form).await.unwrap();
    assert!(comment.active);
    assert_eq!(comment.post_id, post.id);

    let stored = fx.store.comments().find_active_for_post(post.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Bob");
}

#[tokio::test]
async fn test_add_comment_missing_name_is_rejected() {
    let fx = fixture().await;
    let post = fx.published("Hello", day(15), &[]).await;

    let form = CommentForm {
        name: String::new(),
        email: "bob@example.com".into(),
        body: "Nice post".into(),
    };
    let result = fx.service.add_comment(post.id, &form).await;
    match result {
        Err(DomainError::Validation(errors)) => {
            assert_eq!(errors.get("name"), Some(&[REQUIRED.to_string()][..]));
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    assert!(fx.store.comments().find_active_for_post(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_comment_to_draft_is_not_found() {
    let fx = fixture().await;
    let draft = fx.post("Draft", PostStatus::Draft, day(15), &[]).await;

    let form = CommentForm {
        name: "Bob".into(),
        email: "bob@example.com".into(),
        body: "Nice post".into(),
    };
    let result = fx.service.add_comment(draft.id, &form).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

fn share_form(to: &str) -> EmailPostForm {
    EmailPostForm {
        name: "Alice".into(),
        email: "alice@example.com".into(),
        to: to.into(),
        comments: "You will like this".into(),
    }
}

#[tokio::test]
async fn test_share_sends_one_email() {
    let fx = fixture().await;
    let post = fx
        .published("Hello", Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(), &[])
        .await;

    let shared = fx
        .service
        .share_post(post.id, &share_form("bob@example.com"))
        .await
        .unwrap();
    assert!(shared.sent);
    assert_eq!(shared.recipient, "bob@example.com");

    let sent = fx.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Alice recommends you read Hello");
    assert_eq!(sent[0].from, "admin@myblog.com");
    assert_eq!(sent[0].to, vec!["bob@example.com".to_string()]);
    assert_eq!(
        sent[0].body,
        "Read Hello at http://blog.test/blog/2024/1/15/hello\n\nAlice's comments: You will like this"
    );
}

#[tokio::test]
async fn test_share_malformed_address_sends_nothing() {
    let fx = fixture().await;
    let post = fx.published("Hello", day(15), &[]).await;

    let result = fx.service.share_post(post.id, &share_form("bob-at-example")).await;
    match result {
        Err(DomainError::Validation(errors)) => {
            assert_eq!(errors.get("to"), Some(&[INVALID_EMAIL.to_string()][..]));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(fx.mailer.sent().await.is_empty());
}

struct BrokenMailer;

#[async_trait]
impl Mailer for BrokenMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_share_transport_failure_is_delivery_failed() {
    let fx = fixture().await;
    let post = fx.published("Hello", day(15), &[]).await;
    let service = BlogService::new(repositories(&fx.store), Arc::new(BrokenMailer), settings());

    let result = service.share_post(post.id, &share_form("bob@example.com")).await;
    assert!(matches!(result, Err(DomainError::DeliveryFailed(_))));
}

#[tokio::test]
async fn test_most_commented() {
    let fx = fixture().await;
    let five = fx.published("Five", day(1), &[]).await;
    let two = fx.published("Two", day(2), &[]).await;
    let zero = fx.published("Zero", day(3), &[]).await;
    fx.comments(&five, 5).await;
    fx.comments(&two, 2).await;
    fx.comments(&zero, 0).await;

    let ranked = fx.service.most_commented(Some(2)).await.unwrap();
    let summary: Vec<(&str, u64)> = ranked
        .iter()
        .map(|r| (r.post.title.as_str(), r.total_comments))
        .collect();
    assert_eq!(summary, vec![("Five", 5), ("Two", 2)]);

    let all = fx.service.most_commented(None).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_most_commented_ignores_drafts() {
    let fx = fixture().await;
    let draft = fx.post("Draft", PostStatus::Draft, day(1), &[]).await;
    let live = fx.published("Live", day(2), &[]).await;
    // Comments are attached directly; the service refuses drafts.
    fx.comments(&draft, 3).await;
    fx.comments(&live, 1).await;

    let ranked = fx.service.most_commented(Some(5)).await.unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].post.title, "Live");
}

#[tokio::test]
async fn test_latest_posts() {
    let fx = fixture().await;
    for d in 1..=7 {
        fx.published(&format!("Post {}", d), day(d), &[]).await;
    }

    let latest = fx.service.latest_posts(Some(2)).await.unwrap();
    assert_eq!(titles(&latest), vec!["Post 7", "Post 6"]);
    assert_eq!(fx.service.latest_posts(None).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_write_post_enforces_slug_unique_for_date() {
    let fx = fixture().await;
    let form = PostForm {
        title: "Hello".into(),
        body: "Body".into(),
        publish: Some(day(15)),
        tags: vec!["python".into()],
        ..Default::default()
    };

    let first = fx.service.write_post(fx.author.id, &form).await.unwrap();
    assert_eq!(first.slug, "hello");
    assert_eq!(first.status, PostStatus::Draft);
    assert_eq!(first.tags.len(), 1);

    let clash = fx.service.write_post(fx.author.id, &form).await;
    match clash {
        Err(DomainError::Validation(errors)) => assert!(errors.contains("slug")),
        other => panic!("expected slug clash, got {:?}", other),
    }

    let next_day = PostForm {
        publish: Some(day(16)),
        ..form
    };
    let second = fx.service.write_post(fx.author.id, &next_day).await.unwrap();
    assert_eq!(second.slug, "hello");
    assert_eq!(second.tags[0].id, first.tags[0].id);
}

#[tokio::test]
async fn test_write_post_unknown_author() {
    let fx = fixture().await;
    let form = PostForm {
        title: "Hello".into(),
        ..Default::default()
    };
    let result = fx.service.write_post(Uuid::new_v4(), &form).await;
    assert!(matches!(result, Err(DomainError::NotFound { entity_type: "User", .. })));
}

#[tokio::test]
async fn test_publish_post_moves_draft_into_listing() {
    let fx = fixture().await;
    let draft = fx.post("Draft", PostStatus::Draft, day(15), &[]).await;
    assert_eq!(fx.service.total_posts().await.unwrap(), 0);

    let published = fx.service.publish_post(draft.id).await.unwrap();
    assert_eq!(published.status, PostStatus::Published);
    assert!(published.updated_at >= draft.updated_at);
    assert_eq!(fx.service.total_posts().await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_author_cascades() {
    let fx = fixture().await;
    let post = fx.published("Hello", day(15), &[]).await;
    fx.comments(&post, 2).await;

    fx.store.users().delete(fx.author.id).await.unwrap();

    assert!(fx.store.posts().find_by_id(post.id).await.unwrap().is_none());
    assert!(fx.store.comments().find_active_for_post(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_rejects_duplicate_slug_on_same_day() {
    let fx = fixture().await;
    fx.published("Hello", day(15), &[]).await;

    let clash = Post::new(fx.author.id, "Hello".into(), "Again".into()).with_publish(day(15));
    let result = fx.store.posts().save(clash).await;
    assert!(matches!(result, Err(blog_core::RepoError::Constraint(_))));
}

#[tokio::test]
async fn test_write_post_reuses_tag_differing_in_case() {
    let fx = fixture().await;
    let first = fx.published("First", day(1), &["rust"]).await;

    let form = PostForm {
        title: "Second".into(),
        tags: vec!["Rust".into()],
        ..Default::default()
    };
    let second = fx.service.write_post(fx.author.id, &form).await.unwrap();

    assert_eq!(second.tags.len(), 1);
    assert_eq!(second.tags[0].id, first.tags[0].id);
    assert_eq!(second.tags[0].name, "rust");
}

#[tokio::test]
async fn test_write_post_rejects_overlong_tag() {
    let fx = fixture().await;
    let form = PostForm {
        title: "Hello".into(),
        tags: vec!["t".repeat(101)],
        ..Default::default()
    };

    match fx.service.write_post(fx.author.id, &form).await {
        Err(DomainError::Validation(errors)) => assert!(errors.contains("tags")),
        other => panic!("expected tag length error, got {:?}", other),
    }
    assert!(fx.store.tags().find_by_slug(&"t".repeat(101)).await.unwrap().is_none());
}
