use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Comment, Post, Tag, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Deleting a user cascades to their posts.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
///
/// Every `*_published` query and the rankings operate on the published view,
/// i.e. they filter on `status = published` at query time.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Count published posts, optionally only those carrying `tag_id`.
    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError>;

    /// Published posts newest first, optionally only those carrying `tag_id`.
    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Published posts with the given slug whose publish timestamp falls on `date` (UTC).
    async fn find_published_on(&self, date: NaiveDate, slug: &str)
    -> Result<Vec<Post>, RepoError>;

    /// Whether any post (in any status) already uses `slug` on `date`.
    async fn slug_taken_on(
        &self,
        date: NaiveDate,
        slug: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, RepoError>;

    /// Other published posts sharing at least one tag with `post`, most shared
    /// tags first and newest first among equals.
    async fn find_similar(&self, post: &Post, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Published posts ranked by total comment count, descending.
    async fn most_commented(&self, limit: u64) -> Result<Vec<(Post, u64)>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Active comments on a post, oldest first.
    async fn find_active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    /// Fetch the tag with this name, creating it when missing.
    async fn get_or_create(&self, name: &str) -> Result<Tag, RepoError>;
}
