//! One-shot chat command.

use anyhow::Result;
use console::style;

use parley_types::config::StorageBackendKind;
use parley_types::session::SessionId;

use crate::state::AppState;

/// Run one exchange in-process and print the reply.
///
/// # Examples
///
/// ```bash
/// parley chat "What is WAL mode?"
/// parley chat "And why use it?" --session 01936f5e-...
/// ```
pub async fn send_message(
    state: &AppState,
    message: String,
    session: Option<String>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let session_id = session.filter(|s| !s.is_empty()).map(SessionId::from);
    let reply = match state.chat_service.exchange(message, session_id).await {
        Ok(reply) => reply,
        Err(err) => {
            if let Some(kept) = err.retained_session() {
                eprintln!(
                    "  {} {}",
                    style("user turn saved in session").dim(),
                    style(kept.as_str()).yellow()
                );
            }
            return Err(err.into());
        }
    };

    if json {
        let out = serde_json::json!({
            "message": reply.message,
            "session_id": reply.session_id,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("assistant").cyan().bold(), reply.message);
    if !quiet {
        println!();
        println!(
            "  {} {}",
            style("session").dim(),
            style(reply.session_id.as_str()).yellow()
        );
        if state.chat_service.store().kind() == StorageBackendKind::Memory {
            println!(
                "  {}",
                style("(in-memory store: this session ends with the process)").dim()
            );
        }
    }
    println!();

    Ok(())
}
