use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use feed_api::PostUpdated;
use tokio::io::BufReader;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use homefeed::{
    cli::{Cli, Command},
    config::Config,
    events::EventBus,
    files::PendingFile,
    ipc,
    notify::LogNotifier,
    session::{Session, User},
    HomePage, HttpApi, PageContext,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let session = match &cfg.user {
        Some(name) => Session::signed_in(User {
            name: name.clone(),
            avatar_url: None,
        }),
        None => Session::signed_out(),
    };
    let bus: Arc<EventBus<PostUpdated>> = Arc::new(EventBus::new());
    let ctx = PageContext {
        api: Arc::new(HttpApi::from_settings(&cfg.api).context("failed to build http client")?),
        notifier: Arc::new(LogNotifier),
        session: Arc::new(session),
        bus: bus.clone(),
    };
    let page = HomePage::mount(ctx);
    page.ready().await;

    match cli.command.unwrap_or(Command::Feed) {
        Command::Feed => print_page(&page),
        Command::Publish {
            title,
            content,
            files,
        } => {
            let mut selected = Vec::with_capacity(files.len());
            for path in &files {
                selected.push(PendingFile::from_path(path).await?);
            }
            page.set_title(title);
            page.set_content(content);
            page.select_files(selected);
            let post = page.publish().await?;
            println!("published {} ({} attachment(s))", post.id, post.attachments.len());
        }
        Command::Like { id } => match page.toggle_like(&id).await {
            Some(count) => println!("{id}: {count} like(s)"),
            None => warn!(post = %id, "like was not applied"),
        },
        Command::Watch => {
            let input = BufReader::new(tokio::io::stdin());
            ipc::watch(&page, &bus, input, &mut std::io::stdout()).await?;
        }
    }
    page.unmount();
    Ok(())
}

fn print_page(page: &HomePage) {
    if let Some(view) = page.render() {
        print!("{view}");
    }
}
