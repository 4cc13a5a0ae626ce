// Presentation boundary: turns raw terminal input into session actions and
// session views back into text.

use crate::error::RoastError;
use crate::models::{Role, SessionView, TargetBinding, Turn};
use crate::state::Session;
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP: &str = "Commands: /reset starts over, /history shows the conversation, /quit exits.";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reset,
    History,
    Help,
    Quit,
    Text(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/reset" => Command::Reset,
            "/history" => Command::History,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Text(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

pub fn render_turn(turn: &Turn) -> String {
    match turn.role() {
        Role::System => format!("(persona) {}", turn.content()),
        Role::User => format!("you> {}", turn.content()),
        Role::Assistant => format!("roaster> {}", turn.content()),
    }
}

pub fn render_target(target: &TargetBinding) -> String {
    if target.has_known_relation() {
        format!("Roasting {} (your {})", target.name(), target.relation())
    } else {
        format!("Roasting {}", target.name())
    }
}

pub fn render_view(view: &SessionView) -> String {
    let mut out = String::new();
    match &view.target {
        Some(target) => out.push_str(&render_target(target)),
        None => out.push_str("No target yet."),
    }
    out.push('\n');
    for turn in &view.turns {
        out.push_str(&render_turn(turn));
        out.push('\n');
    }
    out
}

/// User-facing text for an error; the session stays usable afterwards.
pub fn describe_error(err: &RoastError) -> String {
    if err.is_validation() {
        format!("⚠️  {}", err)
    } else {
        format!("❌ {} You can try again.", err)
    }
}

async fn say<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Interactive loop: collect a target, show the roast, then relay chat
/// messages until input ends or the user quits.
pub async fn run_terminal<R, W>(session: &mut Session, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    say(&mut writer, "🔥 Hinglish Roast Generator 🔥\n").await?;
    say(&mut writer, &format!("{}\n", HELP)).await?;

    loop {
        let bound = session.target().is_some();
        let prompt = if bound { "you> " } else { "Enter target name: " };
        say(&mut writer, prompt).await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let text = match Command::parse(&line) {
            Command::Quit => break,
            Command::Reset => {
                session.reset();
                say(&mut writer, "Conversation reset.\n").await?;
                continue;
            }
            Command::History => {
                say(&mut writer, &render_view(&session.view())).await?;
                continue;
            }
            Command::Help => {
                say(&mut writer, &format!("{}\n", HELP)).await?;
                continue;
            }
            Command::Text(text) => text,
        };

        if bound {
            log::debug!("Relaying chat message ({} chars)", text.len());
            match session.send_message(&text).await {
                Ok(view) => {
                    if let Some(reply) = view.turns.last() {
                        say(&mut writer, &format!("{}\n", render_turn(reply))).await?;
                    }
                }
                Err(e) => say(&mut writer, &format!("{}\n", describe_error(&e))).await?,
            }
            continue;
        }

        // Check the name before asking for anything else
        if let Err(e) = TargetBinding::new(&text, "") {
            say(&mut writer, &format!("{}\n", describe_error(&e))).await?;
            continue;
        }

        say(&mut writer, "Relation with the target (optional): ").await?;
        let Some(relation) = lines.next_line().await? else {
            break;
        };
        if Command::parse(&relation) == Command::Quit {
            break;
        }

        say(&mut writer, "Cooking up some savage roast...\n").await?;
        match session.submit_roast(&text, &relation).await {
            Ok(view) => {
                if let Some(target) = &view.target {
                    say(&mut writer, &format!("{}\n", render_target(target))).await?;
                }
                say(&mut writer, "Here's the Roast:\n").await?;
                if let Some(roast) = view.turns.last() {
                    say(&mut writer, &format!("{}\n", roast.content())).await?;
                }
            }
            Err(e) => say(&mut writer, &format!("{}\n", describe_error(&e))).await?,
        }
    }

    say(&mut writer, "Bye!\n").await?;
    Ok(())
}
