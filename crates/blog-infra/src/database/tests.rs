use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, Tag};
use blog_core::ports::{BaseRepository, CommentRepository, PostRepository, TagRepository};

use crate::database::entity::{comment, post, post_tag, tag};
use crate::database::postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresTagRepository,
};

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::from(n))])
}

fn ranked_row(
    key: &'static str,
    id: Uuid,
    count_key: &'static str,
    n: i64,
) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([(key, Value::from(id)), (count_key, Value::from(n))])
}

fn post_model(title: &str, day: u32) -> post::Model {
    let publish = Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap();
    post::Model {
        id: Uuid::new_v4(),
        author_id: Uuid::new_v4(),
        title: title.to_owned(),
        slug: title.to_lowercase(),
        body: "Body".to_owned(),
        publish: publish.into(),
        created_at: publish.into(),
        updated_at: publish.into(),
        status: post::Status::Published,
    }
}

fn sql_log(db: DatabaseConnection) -> String {
    format!("{:?}", db.into_transaction_log())
}

fn titles(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.title.as_str()).collect()
}

#[tokio::test]
async fn test_find_active_comments_for_post() {
    let post_id = Uuid::new_v4();
    let comment_id = Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![comment::Model {
            id: comment_id,
            post_id,
            name: "Bob".to_owned(),
            email: "bob@example.com".to_owned(),
            body: "Nice post".to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
            active: true,
        }]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);
    let comments: Vec<Comment> = repo.find_active_for_post(post_id).await.unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, comment_id);
    assert_eq!(comments[0].name, "Bob");
    assert!(comments[0].active);
}

#[tokio::test]
async fn test_find_tag_by_slug() {
    let tag_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tag::Model {
            id: tag_id,
            name: "python".to_owned(),
            slug: "python".to_owned(),
        }]])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    let found: Option<Tag> = repo.find_by_slug("python").await.unwrap();

    assert_eq!(found.map(|t| t.id), Some(tag_id));
}

#[tokio::test]
async fn test_find_tag_by_id_missing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<tag::Model>::new()])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    let found: Option<Tag> = repo.find_by_id(Uuid::new_v4()).await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn test_count_published() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row(3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    assert_eq!(repo.count_published(None).await.unwrap(), 3);
}

#[tokio::test]
async fn test_slug_taken_on() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row(1)]])
        .append_query_results([[count_row(0)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

    assert!(repo.slug_taken_on(date, "hello", None).await.unwrap());
    assert!(!repo.slug_taken_on(date, "hello", Some(Uuid::new_v4())).await.unwrap());
}

#[tokio::test]
async fn test_find_published_by_id_missing() {
    use crate::database::entity::post;

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    assert!(repo.find_published_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_similar_posts_without_tags_skips_query() {
    // No query results are registered: any query would fail.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = PostgresPostRepository::new(db);

    let author = Uuid::new_v4();
    let post = blog_core::domain::Post::new(author, "Lonely".into(), "".into());
    assert!(repo.find_similar(&post, 4).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_or_create_reuses_tag_differing_in_case() {
    let tag_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tag::Model {
            id: tag_id,
            name: "rust".to_owned(),
            slug: "rust".to_owned(),
        }]])
        .into_connection();

    let repo = PostgresTagRepository::new(db.clone());
    let found = repo.get_or_create("Rust").await.unwrap();
    assert_eq!(found.id, tag_id);

    drop(repo);
    let sql = sql_log(db);
    assert!(sql.contains("LOWER("), "{}", sql);
    assert!(!sql.contains("INSERT"), "{}", sql);
}

#[tokio::test]
async fn test_list_published_by_tag_hydrates_tags() {
    let hello = post_model("Hello", 15);
    let tag_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![hello.clone()]])
        .append_query_results([vec![post_tag::Model {
            post_id: hello.id,
            tag_id,
        }]])
        .append_query_results([vec![tag::Model {
            id: tag_id,
            name: "python".to_owned(),
            slug: "python".to_owned(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let posts = repo.list_published(Some(tag_id), 0, 3).await.unwrap();

    assert_eq!(titles(&posts), vec!["Hello"]);
    assert_eq!(posts[0].tags.len(), 1);
    assert_eq!(posts[0].tags[0].slug, "python");

    drop(repo);
    let sql = sql_log(db);
    assert!(sql.contains("IN (SELECT"), "{}", sql);
    assert!(sql.contains("ORDER BY"), "{}", sql);
    assert!(sql.contains("LIMIT"), "{}", sql);
}

#[tokio::test]
async fn test_find_similar_keeps_ranking_order() {
    let older = post_model("Older", 10);
    let newer = post_model("Newer", 12);
    let post = Post::new(Uuid::new_v4(), "Hello".into(), "Body".into())
        .with_tags(vec![Tag::new("python"), Tag::new("web")]);

    // Ranked: "Older" shares two tags, "Newer" one; rows come back in the other order.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[
            ranked_row("post_id", older.id, "same_tags", 2),
            ranked_row("post_id", newer.id, "same_tags", 1),
        ]])
        .append_query_results([vec![newer.clone(), older.clone()]])
        .append_query_results([Vec::<post_tag::Model>::new()])
        .append_query_results([Vec::<tag::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let similar = repo.find_similar(&post, 4).await.unwrap();

    assert_eq!(titles(&similar), vec!["Older", "Newer"]);

    drop(repo);
    let sql = sql_log(db);
    assert!(sql.contains("COUNT("), "{}", sql);
    assert!(sql.contains("GROUP BY"), "{}", sql);
    assert!(sql.contains("ORDER BY same_tags DESC"), "{}", sql);
}

#[tokio::test]
async fn test_most_commented_attaches_counts_by_id() {
    let quiet = post_model("Quiet", 10);
    let busy = post_model("Busy", 12);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[
            ranked_row("id", busy.id, "total_comments", 5),
            ranked_row("id", quiet.id, "total_comments", 2),
        ]])
        .append_query_results([vec![quiet.clone(), busy.clone()]])
        .append_query_results([Vec::<post_tag::Model>::new()])
        .append_query_results([Vec::<tag::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let ranked = repo.most_commented(2).await.unwrap();

    let summary: Vec<(&str, u64)> = ranked.iter().map(|(p, n)| (p.title.as_str(), *n)).collect();
    assert_eq!(summary, vec![("Busy", 5), ("Quiet", 2)]);

    drop(repo);
    let sql = sql_log(db);
    assert!(sql.contains("LEFT JOIN"), "{}", sql);
    assert!(sql.contains("ORDER BY total_comments DESC"), "{}", sql);
}
