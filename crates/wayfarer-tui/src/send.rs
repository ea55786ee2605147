// ABOUTME: Non-interactive send command for scripting
// ABOUTME: Streams the answer to stdout and exits when the turn ends

use std::io::Write;

use anyhow::{bail, Result};

use wayfarer_client::Connection;
use wayfarer_core::types::Role;
use wayfarer_core::SessionState;

use crate::app::to_session_event;
use crate::config::Config;

/// Run the send command
pub async fn run(config: &Config, message: &str) -> Result<()> {
    let session_id = config
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let (connection, mut events) = Connection::open(&config.server_url, &session_id)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to {}: {}", config.server_url, e))?;

    let mut state = SessionState::new();
    state.push_user_message(message.to_string());
    if !connection.send_request(message)? {
        bail!("connection is not ready to send");
    }

    // Print answer fragments as the reducer accumulates them
    let mut stdout = std::io::stdout();
    let mut printed = 0;
    loop {
        let Some(event) = events.recv().await else {
            bail!("connection closed before an answer arrived");
        };
        let turn_ended = state.apply(to_session_event(event));
        if let Some(answer) = &state.pending_answer {
            if answer.content.len() > printed {
                print!("{}", &answer.content[printed..]);
                stdout.flush().ok();
                printed = answer.content.len();
            }
        }
        if turn_ended {
            break;
        }
    }
    connection.end_turn();
    connection.close();

    match state.transcript.last() {
        Some(msg) if msg.role == Role::Assistant => {
            if printed == 0 {
                // Answer arrived as one travel plan frame, print it whole
                println!("{}", msg.content);
            } else {
                println!();
            }
            Ok(())
        }
        Some(msg) if msg.role == Role::System => bail!("{}", msg.content),
        _ => bail!("the turn ended without an answer"),
    }
}
