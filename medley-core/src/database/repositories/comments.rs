use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;
use medley_model::{Author, Comment, CommentId, CommentStatus, NewComment};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::comments::CommentRelation;
use crate::error::{Result, StoreError};

const COMMENT_COLUMNS: &str = "id, kind, subject, status, author_name, \
     author_email, author_ip, body, created_on, modified_on";

/// Raw comment row; `status` is converted through its strict code check
/// before a [`Comment`] is handed out.
#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    kind: String,
    subject: Option<String>,
    status: i16,
    author_name: String,
    author_email: Option<String>,
    author_ip: Option<IpNetwork>,
    body: String,
    created_on: DateTime<Utc>,
    modified_on: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = StoreError;

    fn try_from(row: CommentRow) -> Result<Self> {
        Ok(Comment {
            id: row.id,
            kind: row.kind,
            subject: row.subject,
            status: CommentStatus::from_code(row.status)?,
            author: Author {
                name: row.author_name,
                email: row.author_email,
            },
            author_ip: row.author_ip,
            body: row.body,
            created_on: row.created_on,
            modified_on: row.modified_on,
        })
    }
}

/// Repository for comments and their parent join tables.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert an unattached comment; its `kind` is stamped by
    /// [`CommentRepository::attach`].
    pub async fn insert(&self, new: NewComment) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            INSERT INTO comments (id, kind, subject, status, author_name, author_email, author_ip, body, created_on, modified_on)
            VALUES ($1, '', $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING {COMMENT_COLUMNS}
            "#,
        ))
        .bind(CommentId::new())
        .bind(&new.subject)
        .bind(new.status.code())
        .bind(&new.author.name)
        .bind(&new.author.email)
        .bind(new.author_ip)
        .bind(&new.body)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to insert comment: {e}"))
        })?;

        row.try_into()
    }

    pub async fn fetch_by_id(&self, id: CommentId) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to fetch comment: {e}"))
        })?;

        row.map(Comment::try_from).transpose()
    }

    /// Attach a comment to a parent through a relation: transactionally
    /// stamps the relation's tag onto the comment and inserts the join
    /// row. The UNIQUE constraint on the join table rejects a second
    /// parent.
    pub async fn attach(
        &self,
        relation: &CommentRelation,
        parent_id: Uuid,
        comment_id: CommentId,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StoreError::Internal(format!("Failed to begin transaction: {e}"))
        })?;

        let updated = sqlx::query(
            "UPDATE comments SET kind = $1, modified_on = NOW() WHERE id = $2",
        )
        .bind(relation.tag)
        .bind(comment_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to tag comment: {e}"))
        })?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("comment {comment_id}")));
        }

        sqlx::query(&format!(
            "INSERT INTO {} ({}, comment_id) VALUES ($1, $2)",
            relation.join_table, relation.parent_column,
        ))
        .bind(parent_id)
        .bind(comment_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to attach comment: {e}"))
        })?;

        tx.commit().await.map_err(|e| {
            StoreError::Internal(format!("Failed to commit attach: {e}"))
        })?;

        debug!(%comment_id, tag = relation.tag, "attached comment");
        Ok(())
    }

    /// Remove the join row and reset the comment's `kind` to unattached.
    pub async fn detach(
        &self,
        relation: &CommentRelation,
        comment_id: CommentId,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            StoreError::Internal(format!("Failed to begin transaction: {e}"))
        })?;

        let deleted = sqlx::query(&format!(
            "DELETE FROM {} WHERE comment_id = $1",
            relation.join_table,
        ))
        .bind(comment_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to detach comment: {e}"))
        })?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "comment {comment_id} under relation {}",
                relation.tag
            )));
        }

        sqlx::query(
            "UPDATE comments SET kind = '', modified_on = NOW() WHERE id = $1",
        )
        .bind(comment_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to untag comment: {e}"))
        })?;

        tx.commit().await.map_err(|e| {
            StoreError::Internal(format!("Failed to commit detach: {e}"))
        })
    }

    /// Resolve a comment's parent id through its `kind` tag.
    ///
    /// A `kind` naming no known relation yields `Ok(None)` rather than an
    /// error; an unattached or dangling comment resolves the same way.
    pub async fn parent_of(&self, comment: &Comment) -> Result<Option<Uuid>> {
        let Some(relation) = CommentRelation::lookup(&comment.kind) else {
            return Ok(None);
        };

        sqlx::query_scalar::<_, Uuid>(&format!(
            "SELECT {} FROM {} WHERE comment_id = $1",
            relation.parent_column, relation.join_table,
        ))
        .bind(comment.id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!(
                "Failed to resolve comment parent: {e}"
            ))
        })
    }

    /// All comments attached to a parent, oldest first.
    pub async fn comments_for(
        &self,
        relation: &CommentRelation,
        parent_id: Uuid,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            SELECT c.id, c.kind, c.subject, c.status, c.author_name,
                   c.author_email, c.author_ip, c.body, c.created_on,
                   c.modified_on
            FROM comments c
            INNER JOIN {} j ON j.comment_id = c.id
            WHERE j.{} = $1
            ORDER BY c.created_on ASC
            "#,
            relation.join_table, relation.parent_column,
        ))
        .bind(parent_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!("Failed to fetch comments: {e}"))
        })?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    /// Move a comment to a new moderation state, bumping `modified_on`.
    pub async fn set_status(
        &self,
        id: CommentId,
        status: CommentStatus,
    ) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            UPDATE comments
            SET status = $2, modified_on = NOW()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status.code())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            StoreError::Internal(format!(
                "Failed to update comment status: {e}"
            ))
        })?
        .ok_or_else(|| StoreError::NotFound(format!("comment {id}")))?;

        row.try_into()
    }
}
