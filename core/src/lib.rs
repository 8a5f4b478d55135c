pub mod api;
pub mod cli;
pub mod composer;
pub mod config;
pub mod events;
pub mod feed;
pub mod files;
pub mod ipc;
pub mod notify;
pub mod page;
pub mod session;
pub mod view;

pub use api::{ApiError, HttpApi, PostsApi};
pub use page::{HomePage, PageContext};
