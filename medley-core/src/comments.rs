//! Parent relations a comment can be attached through.
//!
//! Every parent kind gets its own join table following one convention:
//! composite primary key of (parent id, comment id) plus a UNIQUE
//! constraint on the comment id, so a comment has at most one parent.
//! Attaching through a relation stamps the relation's tag onto the
//! comment's `kind` column; that tag is later the only thing needed to
//! resolve the parent again.

/// Static descriptor of one comment parent relation.
///
/// Table and column names are spliced into SQL as identifiers, so they are
/// `'static` and never come from runtime data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRelation {
    /// Tag stamped onto `comments.kind` at attach time.
    pub tag: &'static str,
    /// Table the parent rows live in.
    pub parent_table: &'static str,
    /// Join-table column referencing the parent.
    pub parent_column: &'static str,
    /// The join table itself.
    pub join_table: &'static str,
}

impl CommentRelation {
    /// Comments on media files.
    pub const MEDIA: CommentRelation = CommentRelation {
        tag: "media",
        parent_table: "media_files",
        parent_column: "media_file_id",
        join_table: "media_files_comments",
    };

    const ALL: &'static [CommentRelation] = &[Self::MEDIA];

    /// Resolve a `kind` tag to its relation. Unknown tags resolve to
    /// `None`; callers treat that as "no parent", not an error.
    pub fn lookup(tag: &str) -> Option<&'static CommentRelation> {
        Self::ALL.iter().find(|relation| relation.tag == tag)
    }
}
