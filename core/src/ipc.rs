use crate::{events::EventBus, page::HomePage};
use anyhow::Result;
use feed_api::{PostUpdated, POST_UPDATED};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, warn};

/// Read the next line-delimited JSON `post:updated` payload. Blank lines are
/// skipped and malformed lines are logged and skipped. Returns `None` at end
/// of input. Safe to use inside `tokio::select!`.
pub async fn next_update<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> Result<Option<PostUpdated>> {
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(update) => return Ok(Some(update)),
            Err(err) => warn!(error = %err, "ignoring malformed update"),
        }
    }
    Ok(None)
}

/// Forward updates read from `input` onto the bus and write a frame to `out`
/// each time the page changes. At end of input the final frame is written
/// only after every forwarded update has been applied.
pub async fn watch<R, W>(
    page: &HomePage,
    bus: &EventBus<PostUpdated>,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write_frame(page, out)?;
    let mut lines = input.lines();
    let mut changes = page.changes();
    let base = *changes.borrow_and_update();
    let mut forwarded = 0u64;
    loop {
        tokio::select! {
            update = next_update(&mut lines) => match update? {
                Some(update) => {
                    if bus.publish(POST_UPDATED, update) > 0 {
                        forwarded += 1;
                    }
                }
                None => break,
            },
            changed = changes.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                write_frame(page, out)?;
            }
        }
    }

    // each forwarded update bumps the version exactly once
    debug!(forwarded, "end of update stream");
    while *changes.borrow_and_update() < base + forwarded {
        if changes.changed().await.is_err() {
            break;
        }
    }
    write_frame(page, out)?;
    Ok(())
}

fn write_frame<W: Write>(page: &HomePage, out: &mut W) -> Result<()> {
    if let Some(view) = page.render() {
        write!(out, "{view}")?;
        out.flush()?;
    }
    Ok(())
}
