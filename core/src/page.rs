//! The home page controller: feed, composer and like actions wired to the
//! remote API, the notification sink and the update bus.

use crate::{
    api::PostsApi,
    composer::{Composer, Draft, Phase, PublishError},
    events::EventBus,
    feed::{reduce, Feed, FeedEvent},
    files::PendingFile,
    notify::{Notifier, Severity},
    session::Session,
    view::{ComposerView, PageView, PostCard},
};
use feed_api::{Post, PostUpdated, POST_UPDATED};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Collaborators injected into a page when it mounts.
#[derive(Clone)]
pub struct PageContext {
    pub api: Arc<dyn PostsApi>,
    pub notifier: Arc<dyn Notifier>,
    pub session: Arc<Session>,
    pub bus: Arc<EventBus<PostUpdated>>,
}

/// Feed plus a version counter bumped on every applied event.
struct FeedCell {
    feed: Mutex<Feed>,
    version: watch::Sender<u64>,
}

impl FeedCell {
    fn dispatch(&self, event: FeedEvent) {
        {
            let mut feed = self.feed.lock();
            let current = std::mem::take(&mut *feed);
            *feed = reduce(current, event);
        }
        self.version.send_modify(|v| *v += 1);
    }
}

/// Settles the initial load. If the loading task unwinds before a result
/// arrives, the feed still leaves the loading state. An aborted task
/// settles nothing.
struct LoadGuard {
    cell: Option<Arc<FeedCell>>,
}

impl LoadGuard {
    fn settle(mut self, event: FeedEvent) {
        if let Some(cell) = self.cell.take() {
            cell.dispatch(event);
        }
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.take() {
            if std::thread::panicking() {
                warn!("feed load panicked");
                cell.dispatch(FeedEvent::LoadFailed);
            }
        }
    }
}

pub struct HomePage {
    ctx: PageContext,
    cell: Arc<FeedCell>,
    composer: Arc<Mutex<Composer>>,
    subscription: Uuid,
    tasks: Vec<JoinHandle<()>>,
}

impl HomePage {
    /// Register for updates and start loading the feed. Must be called from
    /// within a tokio runtime.
    pub fn mount(ctx: PageContext) -> Self {
        let (version, _) = watch::channel(0);
        let cell = Arc::new(FeedCell {
            feed: Mutex::new(Feed::new()),
            version,
        });

        let mut subscription = ctx.bus.subscribe(POST_UPDATED);
        let subscription_id = subscription.id();
        let listener = {
            let cell = cell.clone();
            tokio::spawn(async move {
                while let Some(update) = subscription.recv().await {
                    if let Some(id) = update.id.as_deref() {
                        if !cell.feed.lock().contains(id) {
                            debug!(post = id, "update for post not in feed");
                        }
                    }
                    cell.dispatch(FeedEvent::Patched(update));
                }
            })
        };

        let loader = {
            let cell = cell.clone();
            let api = ctx.api.clone();
            tokio::spawn(async move {
                let guard = LoadGuard { cell: Some(cell) };
                let event = match api.fetch_posts().await {
                    Ok(posts) => {
                        info!(count = posts.len(), "feed loaded");
                        FeedEvent::Loaded(posts)
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to load feed");
                        FeedEvent::LoadFailed
                    }
                };
                guard.settle(event);
            })
        };

        Self {
            ctx,
            cell,
            composer: Arc::new(Mutex::new(Composer::default())),
            subscription: subscription_id,
            tasks: vec![listener, loader],
        }
    }

    /// Wait until the initial load has settled.
    pub async fn ready(&self) {
        let mut changes = self.changes();
        while self.is_loading() {
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Receiver that ticks every time the feed is touched.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.cell.version.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.cell.feed.lock().is_loading()
    }

    pub fn feed(&self) -> Feed {
        self.cell.feed.lock().clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.cell.feed.lock().posts().to_vec()
    }

    pub fn composer_visible(&self) -> bool {
        self.ctx.session.current_user().is_some()
    }

    pub fn draft(&self) -> Draft {
        self.composer.lock().draft().clone()
    }

    pub fn is_publishing(&self) -> bool {
        self.composer.lock().phase() == Phase::Publishing
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.composer.lock().set_title(title);
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.composer.lock().set_content(content);
    }

    pub fn select_files(&self, files: Vec<PendingFile>) {
        self.composer.lock().select_files(files);
    }

    /// Upload the selected files (if any), create the post and prepend it.
    /// On failure the draft is left as it was and an error is notified.
    pub async fn publish(&self) -> Result<Post, PublishError> {
        if !self.composer_visible() {
            return Err(PublishError::SignedOut);
        }
        let (draft, _publishing) = Composer::begin(&self.composer)?;
        match self.submit(&draft).await {
            Ok(post) => {
                info!(post = %post.id, "post published");
                self.cell.dispatch(FeedEvent::Published(post.clone()));
                self.composer.lock().reset_draft();
                self.ctx.notifier.notify("Post published", Severity::Success);
                Ok(post)
            }
            Err(err) => {
                warn!(error = %err, "publish failed");
                self.ctx.notifier.notify("Failed to publish", Severity::Error);
                Err(err)
            }
        }
    }

    async fn submit(&self, draft: &Draft) -> Result<Post, PublishError> {
        let attachments = if draft.files.is_empty() {
            Vec::new()
        } else {
            self.ctx
                .api
                .upload_files(&draft.files)
                .await
                .map_err(PublishError::Upload)?
        };
        self.ctx
            .api
            .create_post(&draft.to_new_post(attachments))
            .await
            .map_err(PublishError::Create)
    }

    /// Toggle the like on a post and adopt the count the server reports.
    /// Failures leave the feed untouched and are not shown to the user.
    pub async fn toggle_like(&self, id: &str) -> Option<u64> {
        match self.ctx.api.toggle_like(id).await {
            Ok(resp) => {
                self.cell.dispatch(FeedEvent::LikesChanged {
                    id: id.to_string(),
                    likes_count: resp.likes_count,
                });
                Some(resp.likes_count)
            }
            Err(err) => {
                debug!(post = id, error = %err, "like toggle failed");
                None
            }
        }
    }

    /// Render projection, or `None` while the initial load is pending.
    pub fn render(&self) -> Option<PageView> {
        let feed = self.cell.feed.lock();
        if feed.is_loading() {
            return None;
        }
        let cards = feed.posts().iter().map(PostCard::from_post).collect();
        drop(feed);
        let composer = self
            .composer_visible()
            .then(|| ComposerView::from_composer(&self.composer.lock()));
        Some(PageView { composer, cards })
    }

    /// Tear the page down. Equivalent to dropping it.
    pub fn unmount(self) {
        info!("home page unmounted");
    }
}

impl Drop for HomePage {
    fn drop(&mut self) {
        self.ctx.bus.unsubscribe(POST_UPDATED, self.subscription);
        for task in &self.tasks {
            task.abort();
        }
    }
}
