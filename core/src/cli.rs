use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line interface for the homefeed client.
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Override the API base URL.
    #[arg(long)]
    pub api_url: Option<String>,
    /// Bearer token sent with every request.
    #[arg(long)]
    pub token: Option<String>,
    /// Name of the signed-in user; the composer is disabled without one.
    #[arg(long)]
    pub user: Option<String>,
    /// Enable or disable logging (true/false).
    #[arg(long)]
    pub logging: Option<bool>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load and print the home feed (the default).
    Feed,
    /// Publish a new post.
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// File to attach; repeat for several.
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Toggle your like on a post.
    Like { id: String },
    /// Print the feed, then apply `post:updated` JSON lines read from stdin.
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_publish_with_files() {
        let cli = Cli::parse_from([
            "homefeed", "--user", "ada", "publish", "--title", "T", "--file", "a.png", "--file",
            "b.pdf",
        ]);
        assert_eq!(cli.user.as_deref(), Some("ada"));
        assert_eq!(
            cli.command,
            Some(Command::Publish {
                title: "T".into(),
                content: String::new(),
                files: vec!["a.png".into(), "b.pdf".into()],
            })
        );
    }

    #[test]
    fn command_is_optional() {
        let cli = Cli::parse_from(["homefeed", "--logging", "false"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.logging, Some(false));
    }
}
