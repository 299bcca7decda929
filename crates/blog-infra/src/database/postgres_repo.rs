//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sea_orm::sea_query::{Expr, Func, OnConflict, Query};
use sea_orm::{
    ColumnTrait, Condition, DbConn, EntityTrait, JoinType, LoaderTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use blog_core::domain::{Comment, Post, Tag, User};
use blog_core::error::RepoError;
use blog_core::ports::{
    BaseRepository, CommentRepository, PostRepository, TagRepository, UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_tag::{self, Entity as PostTagEntity};
use super::entity::tag::{self, Entity as TagEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL tag repository.
pub type PostgresTagRepository = PostgresBaseRepository<TagEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn find_active_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Active.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TagRepository for PostgresTagRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(tag::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag, RepoError> {
        let tag = Tag::new(name);
        if let Some(existing) = self.find_same_tag(&tag).await? {
            return Ok(existing);
        }

        if tag.slug.is_empty() {
            return Err(RepoError::Constraint(format!("Tag '{}' has no usable slug", name)));
        }

        // A concurrent insert of the same slug lands on the unique index; read it back.
        TagEntity::insert(tag::ActiveModel::from(tag.clone()))
            .on_conflict(OnConflict::column(tag::Column::Slug).do_nothing().to_owned())
            .do_nothing()
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        self.find_same_tag(&tag).await?.ok_or(RepoError::NotFound)
    }
}

impl PostgresTagRepository {
    /// A stored tag whose name matches ignoring case, or whose slug matches.
    async fn find_same_tag(&self, tag: &Tag) -> Result<Option<Tag>, RepoError> {
        let result = TagEntity::find()
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(tag::Column::Name)))
                            .eq(tag.name.to_lowercase()),
                    )
                    .add(tag::Column::Slug.eq(tag.slug.as_str())),
            )
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

/// PostgreSQL post repository. Posts carry their tags, so this repository
/// manages the `post_tags` junction alongside the `posts` table.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// The published view.
    fn published() -> Select<PostEntity> {
        PostEntity::find().filter(post::Column::Status.eq(post::Status::Published))
    }

    fn tagged(select: Select<PostEntity>, tag_id: Option<Uuid>) -> Select<PostEntity> {
        match tag_id {
            Some(tag_id) => select.filter(
                post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_tag::Column::PostId)
                        .from(PostTagEntity)
                        .and_where(Expr::col(post_tag::Column::TagId).eq(tag_id))
                        .to_owned(),
                ),
            ),
            None => select,
        }
    }

    fn on_date(select: Select<PostEntity>, date: NaiveDate) -> Select<PostEntity> {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);
        select
            .filter(post::Column::Publish.gte(start.fixed_offset()))
            .filter(post::Column::Publish.lt(end.fixed_offset()))
    }

    /// Attach tags to post rows.
    async fn hydrate(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        let tags = models
            .load_many_to_many(TagEntity, PostTagEntity, &self.db)
            .await
            .map_err(map_db_err)?;

        Ok(models
            .into_iter()
            .zip(tags)
            .map(|(model, tags)| post::into_domain(model, tags))
            .collect())
    }

    /// Fetch posts by id and return them in the order of `ids`.
    async fn in_order(&self, ids: &[Uuid]) -> Result<Vec<Post>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = PostEntity::find()
            .filter(post::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        let mut posts = self.hydrate(models).await?;

        let position = |id: &Uuid| ids.iter().position(|i| i == id).unwrap_or(usize::MAX);
        posts.sort_by_key(|p| position(&p.id));
        Ok(posts)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        match model {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Upsert the post row and replace its tag links in one transaction.
    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let on_conflict = OnConflict::column(post::Column::Id)
            .update_columns([
                post::Column::AuthorId,
                post::Column::Title,
                post::Column::Slug,
                post::Column::Body,
                post::Column::Publish,
                post::Column::UpdatedAt,
                post::Column::Status,
            ])
            .to_owned();

        PostEntity::insert(post::ActiveModel::from(post.clone()))
            .on_conflict(on_conflict)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        PostTagEntity::delete_many()
            .filter(post_tag::Column::PostId.eq(post.id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if !post.tags.is_empty() {
            let links = post.tags.iter().map(|t| post_tag::ActiveModel {
                post_id: Set(post.id),
                tag_id: Set(t.id),
            });
            PostTagEntity::insert_many(links)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;
        tracing::debug!(post_id = %post.id, tags = post.tags.len(), "Post saved");
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn count_published(&self, tag_id: Option<Uuid>) -> Result<u64, RepoError> {
        Self::tagged(Self::published(), tag_id)
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn list_published(
        &self,
        tag_id: Option<Uuid>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let models = Self::tagged(Self::published(), tag_id)
            .order_by_desc(post::Column::Publish)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        self.hydrate(models).await
    }

    async fn find_published_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = Self::published()
            .filter(post::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        match model {
            Some(model) => Ok(self.hydrate(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_published_on(
        &self,
        date: NaiveDate,
        slug: &str,
    ) -> Result<Vec<Post>, RepoError> {
        let models = Self::on_date(Self::published(), date)
            .filter(post::Column::Slug.eq(slug))
            .limit(2)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        self.hydrate(models).await
    }

    async fn slug_taken_on(
        &self,
        date: NaiveDate,
        slug: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        let mut select =
            Self::on_date(PostEntity::find(), date).filter(post::Column::Slug.eq(slug));
        if let Some(id) = excluding {
            select = select.filter(post::Column::Id.ne(id));
        }

        let count = select.count(&self.db).await.map_err(map_db_err)?;
        Ok(count > 0)
    }

    async fn find_similar(&self, post: &Post, limit: u64) -> Result<Vec<Post>, RepoError> {
        if post.tags.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let tag_ids: Vec<Uuid> = post.tags.iter().map(|t| t.id).collect();

        let ranked: Vec<(Uuid, i64)> = PostTagEntity::find()
            .select_only()
            .column(post_tag::Column::PostId)
            .column_as(Expr::col((PostTagEntity, post_tag::Column::TagId)).count(), "same_tags")
            .join(JoinType::InnerJoin, post_tag::Relation::Post.def())
            .filter(post_tag::Column::TagId.is_in(tag_ids))
            .filter(post_tag::Column::PostId.ne(post.id))
            .filter(post::Column::Status.eq(post::Status::Published))
            .group_by(post_tag::Column::PostId)
            .group_by(post::Column::Publish)
            .order_by(Expr::cust("same_tags"), Order::Desc)
            .order_by(post::Column::Publish, Order::Desc)
            .limit(limit)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let ids: Vec<Uuid> = ranked.into_iter().map(|(id, _)| id).collect();
        self.in_order(&ids).await
    }

    async fn most_commented(&self, limit: u64) -> Result<Vec<(Post, u64)>, RepoError> {
        let ranked: Vec<(Uuid, i64)> = Self::published()
            .select_only()
            .column(post::Column::Id)
            .column_as(
                Expr::col((CommentEntity, comment::Column::Id)).count(),
                "total_comments",
            )
            .join(JoinType::LeftJoin, post::Relation::Comments.def())
            .group_by(post::Column::Id)
            .order_by(Expr::cust("total_comments"), Order::Desc)
            .limit(limit)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        let ids: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
        let posts = self.in_order(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let total = ranked
                    .iter()
                    .find(|(id, _)| *id == post.id)
                    .map_or(0, |(_, total)| (*total).max(0) as u64);
                (post, total)
            })
            .collect())
    }
}
