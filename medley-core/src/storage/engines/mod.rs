pub mod local;
pub mod remote;

pub use local::{LocalFileConfig, LocalFileStorage};
pub use remote::{RemoteUrlConfig, RemoteUrlStorage};
