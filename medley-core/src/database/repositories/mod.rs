pub mod comments;
pub mod storage;

pub use comments::CommentRepository;
pub use storage::StorageRepository;
