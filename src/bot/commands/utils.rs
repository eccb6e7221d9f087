//! Reply helpers shared by the command modules.

use crate::{
    bot::Context,
    errors::{Error, Result},
};

/// Discord's message length limit, minus room for code fences.
pub(crate) const MESSAGE_LIMIT: usize = 1900;

/// Joins lines into messages no longer than `limit` characters.
///
/// A single line longer than `limit` gets a message of its own.
pub(crate) fn chunk_lines<S: AsRef<str>>(lines: &[S], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in lines {
        let line = line.as_ref();
        let needed = if current.is_empty() {
            line.chars().count()
        } else {
            current.chars().count() + 1 + line.chars().count()
        };
        if needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Embed limits enforced by Discord, in characters.
pub(crate) const EMBED_DESCRIPTION_LIMIT: usize = 4096;
pub(crate) const EMBED_FIELD_LIMIT: usize = 1024;
pub(crate) const EMBED_TOTAL_LIMIT: usize = 6000;

/// Joins `lines` and `tail` with newlines in at most `max_chars` characters.
///
/// Lines that do not fit are replaced by a `…and N more` line; `tail` (a total, say) is
/// always kept. Only a `tail` that alone exceeds the limit gets cut.
pub(crate) fn fit_lines<S: AsRef<str>>(lines: &[S], tail: Option<&str>, max_chars: usize) -> String {
    let len = |text: &str| text.chars().count();
    let tail_len = tail.map_or(0, |t| len(t) + 1);
    let full: usize = lines.iter().map(|l| len(l.as_ref()) + 1).sum::<usize>() + tail_len;

    let mut kept: Vec<String> = Vec::with_capacity(lines.len() + 2);
    if full.saturating_sub(1) <= max_chars {
        kept.extend(lines.iter().map(|l| l.as_ref().to_string()));
    } else {
        let mut used = tail_len;
        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let marker = more_marker(lines.len() - i - 1);
            if used + len(line) + 1 + len(&marker) > max_chars {
                break;
            }
            kept.push(line.to_string());
            used += len(line) + 1;
        }
        kept.push(more_marker(lines.len() - kept.len()));
    }
    if let Some(tail) = tail {
        kept.push(tail.to_string());
    }
    truncate_chars(&kept.join("\n"), max_chars)
}

fn more_marker(hidden: usize) -> String {
    format!("…and {hidden} more")
}

/// Cuts `text` to `max_chars` characters, ending in `…` when something was cut.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Sends `lines` as one or more messages.
pub(crate) async fn say_lines<S: AsRef<str>>(ctx: Context<'_>, lines: &[S]) -> Result<()> {
    for chunk in chunk_lines(lines, MESSAGE_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Reports input errors to the user and propagates everything else to `on_error`.
pub(crate) async fn reply_error(ctx: Context<'_>, error: Error) -> Result<()> {
    if error.is_user_facing() {
        ctx.say(format!("❌ {error}")).await?;
        Ok(())
    } else {
        Err(error)
    }
}
