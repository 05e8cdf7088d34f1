use std::fmt;

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;

use crate::error::{ModelError, Result};
use crate::ids::CommentId;

/// Allowed comment moderation states.
///
/// The wire representation is the numeric code, kept stable because rows
/// written by earlier deployments carry it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(i16)]
pub enum CommentStatus {
    Trash = 1,
    Publish = 2,
    PendingReview = 3,
}

impl CommentStatus {
    /// Every defined status, in code order.
    pub const ALL: [CommentStatus; 3] = [
        CommentStatus::Trash,
        CommentStatus::Publish,
        CommentStatus::PendingReview,
    ];

    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Strict membership check: only the three defined codes are accepted.
    /// Undefined codes, including 4 through 6, are rejected.
    pub fn from_code(code: i16) -> Result<Self> {
        match code {
            1 => Ok(CommentStatus::Trash),
            2 => Ok(CommentStatus::Publish),
            3 => Ok(CommentStatus::PendingReview),
            other => Err(ModelError::InvalidStatus(other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommentStatus::Trash => "trash",
            CommentStatus::Publish => "publish",
            CommentStatus::PendingReview => "pending_review",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite author value, stored as the `author_name` / `author_email`
/// column pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: Some(email.into()),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} <{}>", self.name, email),
            None => f.write_str(&self.name),
        }
    }
}

/// A moderated comment attached to at most one parent object.
///
/// `kind` names the relation through which the parent is reached (e.g.
/// `media`). It is stamped when the comment is attached; an unattached
/// comment carries the empty string.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub kind: String,
    pub subject: Option<String>,
    pub status: CommentStatus,
    pub author: Author,
    pub author_ip: Option<IpNetwork>,
    pub body: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl Comment {
    /// Whether this comment has been attached to a parent relation.
    pub fn is_attached(&self) -> bool {
        !self.kind.is_empty()
    }
}

/// Insert payload for a new comment.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewComment {
    pub subject: Option<String>,
    pub status: CommentStatus,
    pub author: Author,
    pub author_ip: Option<IpNetwork>,
    pub body: String,
}

impl NewComment {
    /// Build a comment pending review, validating the author name and body
    /// are non-empty.
    pub fn new(author: Author, body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        if author.name.trim().is_empty() {
            return Err(ModelError::InvalidComment(
                "author name must not be empty".into(),
            ));
        }
        if body.trim().is_empty() {
            return Err(ModelError::InvalidComment(
                "body must not be empty".into(),
            ));
        }
        Ok(Self {
            subject: None,
            status: CommentStatus::PendingReview,
            author,
            author_ip: None,
            body,
        })
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn status(mut self, status: CommentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn author_ip(mut self, ip: IpNetwork) -> Self {
        self.author_ip = Some(ip);
        self
    }
}
