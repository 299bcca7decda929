//! In-memory repositories sharing one set of tables.
//!
//! Rows are kept in insertion order, which serves as the storage order for
//! ranking ties. Note: Data is lost on process restart.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{Comment, Post, Tag, User};
use blog_core::error::RepoError;
use blog_core::ports::{
    BaseRepository, CommentRepository, PostRepository, TagRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    tags: Vec<Tag>,
}

impl Tables {
    /// The published view.
    fn published(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| p.is_published())
    }

    /// Published posts newest first.
    fn published_by_date(&self, tag_id: Option<Uuid>) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self
            .published()
            .filter(|p| tag_id.is_none_or(|id| p.has_tag(id)))
            .collect();
        posts.sort_by(|a, b| b.publish.cmp(&a.publish));
        posts
    }

    fn delete_post(&mut self, id: Uuid) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        self.comments.retain(|c| c.post_id != id);
        self.posts.len() != before
    }
}

fn upsert<T>(rows: &mut Vec<T>, entity: T, same: impl Fn(&T) -> bool) {
    match rows.iter_mut().find(|row| same(row)) {
        Some(row) => *row = entity,
        None => rows.push(entity),
    }
}

/// Shared in-memory tables. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository(self.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository(self.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryCommentRepository(self.clone())
    }

    pub fn tags(&self) -> InMemoryTagRepository {
        InMemoryTagRepository(self.clone())
    }
}

pub struct InMemoryUserRepository(InMemoryStore);

pub struct InMemoryPostRepository(InMemoryStore);

pub struct InMemoryCommentRepository(InMemoryStore);

pub struct InMemoryTagRepository(InMemoryStore);

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint("Username already taken".to_string()));
        }
        upsert(&mut tables.users, user.clone(), |u| u.id == user.id);
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(RepoError::NotFound);
        }

        // Posts (and their comments) go with their author.
        let authored: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.delete_post(post_id);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.tables.write().await;
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepoError::Constraint("Unknown author".to_string()));
        }
        let date = post.publish_date();
        if tables
            .posts
            .iter()
            .any(|p| p.id != post.id && p.slug == post.slug && p.publish_date() == date)
        {
            return Err(RepoError::Constraint(
                "Slug already used on this publish date".to_string(),
            ));
        }
        upsert(&mut tables.posts, post.clone(), |p| p.id == post.id);
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables.delete_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .published()
            .filter(|p| tag_id.is_none_or(|id| p.has_tag(id)))
            .count() as u64)
    }

    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .published_by_date(tag_id)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.published().find(|p| p.id == id).cloned())
    }

    async fn find_published_on(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .published()
            .filter(|p| p.slug == slug && p.publish_date() == date)
            .cloned()
            .collect())
    }

    async fn slug_taken_on(
        &self,
        date: NaiveDate,
        slug: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.posts.iter().any(|p| {
            p.slug == slug && p.publish_date() == date && excluding != Some(p.id)
        }))
    }

    async fn find_similar(&self, post: &Post, limit: u64) -> Result<Vec<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        let mut ranked: Vec<(usize, &Post)> = tables
            .published()
            .filter(|p| p.id != post.id)
            .map(|p| (post.shared_tag_count(p), p))
            .filter(|(shared, _)| *shared > 0)
            .collect();
        ranked.sort_by(|(a_shared, a), (b_shared, b)| {
            b_shared.cmp(a_shared).then_with(|| b.publish.cmp(&a.publish))
        });

        Ok(ranked
            .into_iter()
            .take(limit as usize)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn most_commented(&self, limit: u64) -> Result<Vec<(Post, u64)>, RepoError> {
        let tables = self.0.tables.read().await;
        let mut ranked: Vec<(Post, u64)> = tables
            .published()
            .map(|p| {
                let total = tables.comments.iter().filter(|c| c.post_id == p.id).count();
                (p.clone(), total as u64)
            })
            .collect();
        // Stable sort keeps storage order among equal counts.
        ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
        ranked.truncate(limit as usize);
        Ok(ranked)
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.0.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(RepoError::Constraint("Unknown post".to_string()));
        }
        upsert(&mut tables.comments, comment.clone(), |c| c.id == comment.id);
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.0.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.active)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }
}

#[async_trait]
impl BaseRepository<Tag, Uuid> for InMemoryTagRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tag>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn save(&self, tag: Tag) -> Result<Tag, RepoError> {
        let mut tables = self.0.tables.write().await;
        if tables
            .tags
            .iter()
            .any(|t| t.id != tag.id && (t.name == tag.name || t.slug == tag.slug))
        {
            return Err(RepoError::Constraint("Tag already exists".to_string()));
        }
        upsert(&mut tables.tags, tag.clone(), |t| t.id == tag.id);
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        let before = tables.tags.len();
        tables.tags.retain(|t| t.id != id);
        if tables.tags.len() == before {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.iter_mut() {
            post.tags.retain(|t| t.id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.tags.iter().find(|t| t.slug == slug).cloned())
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag, RepoError> {
        let mut tables = self.0.tables.write().await;
        let tag = Tag::new(name);
        // Names differing only in case share a slug, and so a tag.
        if let Some(existing) = tables
            .tags
            .iter()
            .find(|t| t.name.to_lowercase() == name.to_lowercase() || t.slug == tag.slug)
        {
            return Ok(existing.clone());
        }
        if tag.slug.is_empty() {
            return Err(RepoError::Constraint(format!("Tag '{}' has no usable slug", name)));
        }
        tables.tags.push(tag.clone());
        Ok(tag)
    }
}
