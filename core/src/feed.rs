//! Feed state and the transitions that mutate it.
//!
//! Every change to the held feed goes through [`reduce`], which takes the
//! current state and one event and returns the next state. It does no I/O, so
//! the network-facing code in [`crate::page`] only decides *which* event to
//! apply.

use feed_api::{Post, PostUpdated};
use std::collections::HashSet;

/// Ordered posts plus the initial-load flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    posts: Vec<Post>,
    loading: bool,
}

impl Feed {
    /// A feed that has not been loaded yet.
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            loading: true,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == id)
    }
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that happened to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Initial retrieval succeeded.
    Loaded(Vec<Post>),
    /// Initial retrieval failed; only the loading flag changes.
    LoadFailed,
    /// A post was created by this page.
    Published(Post),
    /// The server reported a new like count for one post.
    LikesChanged { id: String, likes_count: u64 },
    /// A broadcast partial update arrived.
    Patched(PostUpdated),
}

/// Apply one event to the feed.
pub fn reduce(mut feed: Feed, event: FeedEvent) -> Feed {
    match event {
        FeedEvent::Loaded(mut posts) => {
            let mut seen = HashSet::new();
            posts.retain(|p| seen.insert(p.id.clone()));
            feed.posts = posts;
            feed.loading = false;
        }
        FeedEvent::LoadFailed => feed.loading = false,
        FeedEvent::Published(post) => {
            feed.posts.retain(|p| p.id != post.id);
            feed.posts.insert(0, post);
        }
        FeedEvent::LikesChanged { id, likes_count } => {
            if let Some(post) = feed.get_mut(&id) {
                post.likes_count = likes_count;
            }
        }
        FeedEvent::Patched(PostUpdated {
            id: Some(id),
            post: Some(patch),
        }) => {
            if let Some(post) = feed.get_mut(&id) {
                post.merge(&patch);
            }
        }
        // payload without id or patch
        FeedEvent::Patched(_) => {}
    }
    feed
}
