use std::io::Write;
use std::sync::Arc;

use adk_client::{AgentClient, Session};
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Echoes snapshots to a terminal without repeating what is already shown
pub struct SnapshotPrinter<W: Write> {
    out: W,
    shown: String,
}

impl<W: Write> SnapshotPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown: String::new(),
        }
    }

    /// Print only the new tail when `text` extends what is on screen,
    /// otherwise start a fresh line with the whole text
    pub fn show(&mut self, text: &str) -> std::io::Result<()> {
        match text.strip_prefix(self.shown.as_str()) {
            Some(tail) if !self.shown.is_empty() => write!(self.out, "{}", tail)?,
            _ => {
                if !self.shown.is_empty() {
                    writeln!(self.out)?;
                }
                write!(self.out, "{}", text)?;
            }
        }
        self.shown.clear();
        self.shown.push_str(text);
        self.out.flush()
    }

    /// Close the current reply; `final_text` covers replies that produced no snapshot
    pub fn finish(&mut self, final_text: &str) -> std::io::Result<()> {
        if self.shown.is_empty() && !final_text.is_empty() {
            write!(self.out, "{}", final_text)?;
        }
        writeln!(self.out)?;
        self.shown.clear();
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn render_session(session: &Session, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        out,
        "Session {} ({} / {})",
        session.id, session.app_name, session.user_id
    )?;
    if let Some(updated) = session.last_updated() {
        writeln!(out, "Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }
    if session.state.is_empty() {
        writeln!(out, "State: (empty)")?;
    } else {
        writeln!(out, "State:")?;
        for (key, value) in &session.state {
            writeln!(out, "  {} = {}", key, value)?;
        }
    }
    writeln!(out, "Events: {}", session.events.len())
}

enum Command<'a> {
    Quit,
    Session,
    Apps,
    Send(&'a str),
    Empty,
}

fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "" => Command::Empty,
        "/quit" | "/exit" => Command::Quit,
        "/session" => Command::Session,
        "/apps" => Command::Apps,
        message => Command::Send(message),
    }
}

/// Read messages from `input` until EOF or `/quit`, streaming each reply to `out`.
///
/// A failed send is reported and the loop continues.
pub async fn run<R, W>(client: Arc<dyn AgentClient>, input: R, out: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let mut lines = input.lines();
    let mut printer = SnapshotPrinter::new(out);

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Session => match client.get_session().await {
                Ok(session) => render_session(&session, &mut printer.out)?,
                Err(e) => writeln!(printer.out, "Error: {}", e)?,
            },
            Command::Apps => match client.list_apps().await {
                Ok(apps) => writeln!(printer.out, "Apps: {}", apps.join(", "))?,
                Err(e) => writeln!(printer.out, "Error: {}", e)?,
            },
            Command::Send(message) => {
                tracing::debug!(len = message.len(), "Sending message");
                write!(printer.out, "Agent: ")?;

                let mut shown = Ok(());
                let result = client
                    .send_message(message, &mut |text: &str| {
                        if shown.is_ok() {
                            shown = printer.show(text);
                        }
                    })
                    .await;
                shown?;

                match result {
                    Ok(text) => printer.finish(&text)?,
                    Err(e) => {
                        printer.finish("")?;
                        writeln!(printer.out, "Error: failed to send message: {}", e)?;
                    }
                }
            }
        }
    }

    Ok(printer.into_inner())
}
