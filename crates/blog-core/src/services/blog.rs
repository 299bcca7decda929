use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Comment, Post, Tag};
use crate::error::DomainError;
use crate::forms::{CommentForm, EmailPostForm, FormErrors, PostForm};
use crate::pagination::{Page, Paginator};
use crate::ports::{
    CommentRepository, Mailer, PostRepository, TagRepository, UserRepository, mask_email,
};

use super::share::compose_share_email;

/// Tunables of the blog views.
#[derive(Debug, Clone)]
pub struct BlogSettings {
    /// Posts per listing page.
    pub posts_per_page: u64,
    /// Maximum number of similar posts on a detail page.
    pub similar_posts: u64,
    /// Default length of the widget queries (most commented, latest).
    pub widget_count: u64,
    /// Site root used to build absolute links in emails.
    pub site_url: String,
    /// Fixed sender address of outgoing mail.
    pub mail_from: String,
}

impl Default for BlogSettings {
    fn default() -> Self {
        Self {
            posts_per_page: 3,
            similar_posts: 4,
            widget_count: 5,
            site_url: "http://127.0.0.1:8080".to_string(),
            mail_from: "admin@myblog.com".to_string(),
        }
    }
}

/// The storage ports the service works with.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub tags: Arc<dyn TagRepository>,
}

/// A listing page, optionally narrowed to one tag.
#[derive(Debug, Clone)]
pub struct PostListing {
    pub tag: Option<Tag>,
    pub page: Page<Post>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub similar_posts: Vec<Post>,
}

#[derive(Debug, Clone)]
pub struct SharedPost {
    pub post: Post,
    pub recipient: String,
    pub sent: bool,
}

#[derive(Debug, Clone)]
pub struct RankedPost {
    pub post: Post,
    pub total_comments: u64,
}

/// Blog use-cases.
pub struct BlogService {
    repos: Repositories,
    mailer: Arc<dyn Mailer>,
    settings: BlogSettings,
}

impl BlogService {
    pub fn new(repos: Repositories, mailer: Arc<dyn Mailer>, settings: BlogSettings) -> Self {
        Self {
            repos,
            mailer,
            settings,
        }
    }

    pub fn settings(&self) -> &BlogSettings {
        &self.settings
    }

    /// One page of published posts, newest first.
    ///
    /// `page` is the raw query value; see [`Paginator::resolve`] for the
    /// fallback policy on bad input.
    pub async fn list_posts(
        &self,
        tag_slug: Option<&str>,
        page: Option<&str>,
    ) -> Result<PostListing, DomainError> {
        let tag = match tag_slug {
            Some(slug) => Some(
                self.repos
                    .tags
                    .find_by_slug(slug)
                    .await?
                    .ok_or_else(|| DomainError::not_found("Tag", slug))?,
            ),
            None => None,
        };
        let tag_id = tag.as_ref().map(|t| t.id);

        let total = self.repos.posts.count_published(tag_id).await?;
        let paginator = Paginator::new(total, self.settings.posts_per_page);
        let number = paginator.resolve(page);
        let items = self
            .repos
            .posts
            .list_published(tag_id, paginator.offset(number), paginator.per_page())
            .await?;

        tracing::debug!(tag = ?tag_slug, page = number, total, "Listed posts");

        Ok(PostListing {
            tag,
            page: paginator.page(number, items),
        })
    }

    /// The published post at `/year/month/day/slug`, its active comments and
    /// similar posts.
    pub async fn post_detail(
        &self,
        year: i32,
        month: u32,
        day: u32,
        slug: &str,
    ) -> Result<PostDetail, DomainError> {
        let not_found =
            || DomainError::not_found("Post", format!("{}/{}/{}/{}", year, month, day, slug));

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(not_found)?;
        let mut matches = self.repos.posts.find_published_on(date, slug).await?;
        if matches.len() != 1 {
            if matches.len() > 1 {
                tracing::warn!(%date, slug, "Multiple published posts share a slug and date");
            }
            return Err(not_found());
        }
        let post = matches.remove(0);

        let comments = self.repos.comments.find_active_for_post(post.id).await?;
        let similar_posts = self
            .repos
            .posts
            .find_similar(&post, self.settings.similar_posts)
            .await?;

        Ok(PostDetail {
            post,
            comments,
            similar_posts,
        })
    }

    async fn published_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_published_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }

    /// Attach a reader's comment to a published post.
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        form: &CommentForm,
    ) -> Result<Comment, DomainError> {
        let post = self.published_post(post_id).await?;
        let valid = form.clean().map_err(DomainError::Validation)?;

        let comment = Comment::new(post.id, valid.name, valid.email, valid.body);
        let saved = self.repos.comments.save(comment).await?;

        tracing::info!(post_id = %post.id, comment_id = %saved.id, "Comment added");
        Ok(saved)
    }

    /// Email a link to a published post.
    pub async fn share_post(
        &self,
        post_id: Uuid,
        form: &EmailPostForm,
    ) -> Result<SharedPost, DomainError> {
        let post = self.published_post(post_id).await?;
        let valid = form.clean().map_err(DomainError::Validation)?;

        let post_url = post.absolute_url(&self.settings.site_url);
        let email = compose_share_email(&post, &valid, &post_url, &self.settings.mail_from);

        self.mailer.send(email).await.map_err(|e| {
            tracing::warn!(post_id = %post.id, error = %e, "Share email could not be delivered");
            DomainError::DeliveryFailed(e.to_string())
        })?;

        tracing::info!(
            post_id = %post.id,
            recipient = %mask_email(&valid.to),
            "Post shared by email"
        );

        Ok(SharedPost {
            post,
            recipient: valid.to,
            sent: true,
        })
    }

    /// Published posts with the most comments.
    pub async fn most_commented(&self, count: Option<u64>) -> Result<Vec<RankedPost>, DomainError> {
        let count = count.unwrap_or(self.settings.widget_count);
        if count == 0 {
            return Ok(Vec::new());
        }

        let ranked = self.repos.posts.most_commented(count).await?;
        Ok(ranked
            .into_iter()
            .map(|(post, total_comments)| RankedPost {
                post,
                total_comments,
            })
            .collect())
    }

    /// Newest published posts.
    pub async fn latest_posts(&self, count: Option<u64>) -> Result<Vec<Post>, DomainError> {
        let count = count.unwrap_or(self.settings.widget_count);
        if count == 0 {
            return Ok(Vec::new());
        }
        Ok(self.repos.posts.list_published(None, 0, count).await?)
    }

    /// Number of published posts.
    pub async fn total_posts(&self) -> Result<u64, DomainError> {
        Ok(self.repos.posts.count_published(None).await?)
    }

    /// Store a new post written by `author_id`.
    pub async fn write_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post, DomainError> {
        let valid = form.clean().map_err(DomainError::Validation)?;

        let author = self
            .repos
            .users
            .find_by_id(author_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", author_id))?;

        let mut post = Post::new(author.id, valid.title, valid.body)
            .with_slug(valid.slug)
            .with_status(valid.status);
        if let Some(publish) = valid.publish {
            post = post.with_publish(publish);
        }

        if self
            .repos
            .posts
            .slug_taken_on(post.publish_date(), &post.slug, None)
            .await?
        {
            let mut errors = FormErrors::new();
            errors.add("slug", "Slug must be unique for Publish date.");
            return Err(DomainError::Validation(errors));
        }

        let mut tags = Vec::with_capacity(valid.tags.len());
        for name in &valid.tags {
            tags.push(self.repos.tags.get_or_create(name).await?);
        }

        let saved = self.repos.posts.save(post.with_tags(tags)).await?;
        tracing::info!(
            post_id = %saved.id,
            slug = %saved.slug,
            status = saved.status.as_str(),
            "Post written"
        );
        Ok(saved)
    }

    /// Move a draft to the published view.
    pub async fn publish_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        let mut post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        if post.is_published() {
            return Ok(post);
        }

        post.publish_now();
        let saved = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %saved.id, "Post published");
        Ok(saved)
    }
}
