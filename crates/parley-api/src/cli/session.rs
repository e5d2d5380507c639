//! Session transcript CLI command.

use anyhow::{Context, Result};
use console::style;

use parley_types::session::{Role, SessionId};

use crate::state::AppState;

/// Print the stored transcript of a session, oldest turn first.
pub async fn show_session(state: &AppState, session_id: &str, json: bool) -> Result<()> {
    let record = state
        .chat_service
        .transcript(&SessionId::from(session_id))
        .await
        .with_context(|| format!("could not load session '{session_id}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Session {}",
        style("💬").bold(),
        style(record.session_id.as_str()).cyan()
    );
    println!(
        "  {}",
        style(format!(
            "created {} · updated {} · {} turns",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.updated_at.format("%Y-%m-%d %H:%M"),
            record.context.len()
        ))
        .dim()
    );
    println!();

    if record.context.is_empty() {
        println!("  {} No turns yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    for turn in &record.context {
        let label = match turn.role {
            Role::User => style("you").green().bold(),
            Role::Assistant => style("assistant").cyan().bold(),
        };
        println!("  {label} {}", turn.content);
    }
    println!();

    Ok(())
}
