//! Interactive terminal loop over the chat orchestrator.

use std::io::Write;

use ldm_chat::{AssistantReply, ChatError, ChatOrchestrator};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const PROMPT: &str = "Enter your query (or type 'exit' to quit): ";

/// Read queries line by line until `exit` or end of input.
///
/// Upstream and validation errors are reported inline and the loop
/// continues. Only I/O failures end it early.
pub async fn run<R, W>(
    orchestrator: &ChatOrchestrator,
    user_id: &str,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match orchestrator.handle_message(user_id, query).await {
            Ok(exchange) => writeln!(out, "{}", render_reply(&exchange.reply))?,
            Err(ChatError::EmptyQuery) => continue,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Query failed");
                writeln!(out, "Error: {}", e)?;
            }
        }
    }
    Ok(())
}

fn render_reply(reply: &AssistantReply) -> String {
    match reply {
        AssistantReply::Conversational(text) => text.clone(),
        AssistantReply::ModelUpdate(model) => {
            serde_json::to_string_pretty(model).unwrap_or_else(|e| format!("<unprintable model: {}>", e))
        }
    }
}
