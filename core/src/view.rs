//! Render projection of the home page.
//!
//! Front ends draw these values; nothing here knows about markup.

use crate::composer::{Composer, Phase};
use feed_api::Post;
use std::fmt;
use time::macros::format_description;

/// Content longer than this many characters is cut in the feed.
pub const EXCERPT_LIMIT: usize = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Image(String),
    Initial(char),
}

/// One feed card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub author_name: Option<String>,
    pub avatar: Avatar,
    pub date: Option<String>,
    pub excerpt: String,
    /// Whether the excerpt was cut and needs a "view more" link.
    pub truncated: bool,
    pub likes: u64,
    pub attachments: usize,
}

impl PostCard {
    pub fn from_post(post: &Post) -> Self {
        let author = post.author.as_ref();
        let avatar = match author.and_then(|a| a.avatar_url.clone()) {
            Some(url) => Avatar::Image(url),
            None => Avatar::Initial(
                author
                    .and_then(|a| a.name.chars().next())
                    .unwrap_or('U'),
            ),
        };
        let date = post
            .created_at
            .and_then(|t| t.format(format_description!("[year]-[month]-[day]")).ok());
        let (excerpt, truncated) = excerpt(&post.content);
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            author_name: author.map(|a| a.name.clone()).filter(|n| !n.is_empty()),
            avatar,
            date,
            excerpt,
            truncated,
            likes: post.likes_count,
            attachments: post.attachments.len(),
        }
    }
}

/// Cut `content` to [`EXCERPT_LIMIT`] characters, appending an ellipsis when
/// anything was removed.
pub fn excerpt(content: &str) -> (String, bool) {
    match content.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => (format!("{}…", &content[..cut]), true),
        None => (content.to_string(), false),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerView {
    pub title: String,
    pub content: String,
    pub files: Vec<String>,
    pub button_label: &'static str,
    pub button_enabled: bool,
}

impl ComposerView {
    pub fn from_composer(composer: &Composer) -> Self {
        let draft = composer.draft();
        Self {
            title: draft.title.clone(),
            content: draft.content.clone(),
            files: draft.files.iter().map(|f| f.name.clone()).collect(),
            button_label: composer.button_label(),
            button_enabled: composer.phase() == Phase::Idle,
        }
    }
}

/// Everything the page shows once loaded. The composer is `None` for
/// signed-out visitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub composer: Option<ComposerView>,
    pub cards: Vec<PostCard>,
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(composer) = &self.composer {
            writeln!(f, "[{}] {} file(s) selected", composer.button_label, composer.files.len())?;
        }
        if self.cards.is_empty() {
            return writeln!(f, "(no posts)");
        }
        for card in &self.cards {
            let avatar = match &card.avatar {
                Avatar::Image(url) => url.clone(),
                Avatar::Initial(c) => c.to_string(),
            };
            writeln!(f, "{:>4}  {} ({})", card.likes, card.title, card.id)?;
            writeln!(
                f,
                "      By {} [{}] · {}",
                card.author_name.as_deref().unwrap_or("unknown"),
                avatar,
                card.date.as_deref().unwrap_or("-")
            )?;
            writeln!(f, "      {}", card.excerpt)?;
            if card.truncated {
                writeln!(f, "      View more: /posts/{}", card.id)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_api::Author;
    use time::macros::datetime;

    fn post() -> Post {
        Post {
            id: "p1".into(),
            title: "Hello".into(),
            content: "short".into(),
            author: Some(Author {
                id: None,
                name: "ada".into(),
                avatar_url: None,
            }),
            created_at: Some(datetime!(2024-03-01 10:00 UTC)),
            likes_count: 2,
            attachments: Vec::new(),
        }
    }

    #[test]
    fn short_content_is_whole() {
        let card = PostCard::from_post(&post());
        assert_eq!(card.excerpt, "short");
        assert!(!card.truncated);
        assert_eq!(card.date.as_deref(), Some("2024-03-01"));
        assert_eq!(card.likes, 2);
    }

    #[test]
    fn long_content_is_cut_on_char_boundary() {
        let exact = "é".repeat(EXCERPT_LIMIT);
        assert_eq!(excerpt(&exact), (exact.clone(), false));
        let long = format!("{exact}tail");
        let (text, cut) = excerpt(&long);
        assert!(cut);
        assert_eq!(text, format!("{exact}…"));
    }

    #[test]
    fn avatar_falls_back_to_initial_then_u() {
        let mut p = post();
        assert_eq!(PostCard::from_post(&p).avatar, Avatar::Initial('a'));
        p.author.as_mut().unwrap().avatar_url = Some("https://cdn/a.png".into());
        assert_eq!(
            PostCard::from_post(&p).avatar,
            Avatar::Image("https://cdn/a.png".into())
        );
        p.author = None;
        let card = PostCard::from_post(&p);
        assert_eq!(card.avatar, Avatar::Initial('U'));
        assert_eq!(card.author_name, None);
    }
}
