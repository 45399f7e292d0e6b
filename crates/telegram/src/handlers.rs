use {
    secrecy::ExposeSecret,
    std::sync::Arc,
    teloxide::types::Message,
    tracing::{error, info},
};

use postdesk_parser::{ParserSettings, parse};

use crate::{
    command::Command,
    export,
    session::{ChatSession, SessionMode},
    state::BotState,
};

/// What a message asks the bot to do. Everything except `Export` is
/// decided synchronously under the session lock.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Reply(String),
    Export,
    Ignore,
}

/// The session state machine. Pure: no I/O, no locking, no awaits.
///
/// Unrecognized commands, and recognized commands whose guard fails, fall
/// back to the free-text path: appended while collecting, ignored
/// otherwise.
pub fn apply(
    session: &mut ChatSession,
    settings: &ParserSettings,
    password: &str,
    text: &str,
) -> Action {
    if let Some(command) = Command::parse(text)
        && command.is_allowed(session)
    {
        return apply_command(session, settings, command);
    }
    apply_text(session, password, text)
}

fn apply_command(
    session: &mut ChatSession,
    settings: &ParserSettings,
    command: Command,
) -> Action {
    match command {
        Command::Start => {
            if session.authorized {
                Action::Reply(format!("Already authorized.\n{}", Command::hint(session)))
            } else {
                Action::Reply("Enter the password.".into())
            }
        },
        Command::Collect => {
            session.mode = SessionMode::Collecting;
            Action::Reply("Collecting. Paste links; send /done when finished.".into())
        },
        Command::Done => {
            session.mode = SessionMode::Idle;
            Action::Reply(format!(
                "Stopped collecting, {} lines total.\n{}",
                session.line_count(),
                Command::hint(session)
            ))
        },
        Command::Format => {
            let outcome = parse(&session.input_text, settings);
            session.apply_format(&outcome);
            Action::Reply(format!(
                "{} links, {} duplicates.\n{}",
                session.links.len(),
                session.duplicate_links.len(),
                Command::hint(session)
            ))
        },
        Command::Links => {
            session.mode = SessionMode::ListingLinks;
            session.list_index = 0;
            Action::Reply(format!("{}\n{}", session.render_page(), Command::hint(session)))
        },
        Command::Duplicates => {
            session.mode = SessionMode::ListingDuplicates;
            session.list_index = 0;
            Action::Reply(format!("{}\n{}", session.render_page(), Command::hint(session)))
        },
        Command::Next => {
            session.page_forward();
            Action::Reply(format!("{}\n{}", session.render_page(), Command::hint(session)))
        },
        Command::Prev => {
            session.page_backward();
            Action::Reply(format!("{}\n{}", session.render_page(), Command::hint(session)))
        },
        Command::Export => {
            // export always returns the session to idle, whatever happens
            session.mode = SessionMode::Idle;
            if session.input_text.trim().is_empty() {
                Action::Reply("Nothing to export. Collect some links first.".into())
            } else {
                Action::Export
            }
        },
        Command::Status => Action::Reply(format!(
            "Mode: {}. {} input lines, {} links, {} duplicates.\n{}",
            session.mode.describe(),
            session.line_count(),
            session.links.len(),
            session.duplicate_links.len(),
            Command::hint(session)
        )),
    }
}

fn apply_text(session: &mut ChatSession, password: &str, text: &str) -> Action {
    if !session.authorized {
        if !password.is_empty() && text.trim() == password {
            session.authorized = true;
            return Action::Reply(format!("Authorized.\n{}", Command::hint(session)));
        }
        return Action::Reply("Not authorized. Send /start first.".into());
    }

    match session.mode {
        SessionMode::Collecting => {
            let lines = session.append_text(text);
            Action::Reply(format!("{lines} lines collected."))
        },
        _ => Action::Ignore,
    }
}

/// Handle one incoming update. The session lock is scoped to the pure
/// transition; the export pipeline runs on a snapshot of the input text.
pub async fn handle_message(state: Arc<BotState>, message: Message) {
    let Some(text) = message.text() else {
        return;
    };
    let chat_id = message.chat.id;

    let password = state.config.telegram.password.expose_secret().to_string();
    let action = state.with_session(chat_id, |session| {
        apply(session, &state.config.notes, &password, text)
    });

    let result = match action {
        Action::Ignore => Ok(()),
        Action::Reply(reply) => state.outbound.send_text(chat_id, &reply).await,
        Action::Export => run_export(&state, chat_id).await,
    };
    if let Err(e) = result {
        error!(chat_id = chat_id.0, error = %e, "failed to handle message");
    }
}

async fn run_export(state: &Arc<BotState>, chat_id: teloxide::types::ChatId) -> crate::Result<()> {
    let Some(session) = state.session_snapshot(chat_id) else {
        return Ok(());
    };

    state
        .outbound
        .send_text(chat_id, "Export started, this can take a while.")
        .await?;

    let outcome = export::run(
        &session.input_text,
        &state.config.notes,
        Arc::clone(&state.source),
        Arc::clone(&state.cache),
        &state.config.report.dir,
    )
    .await;

    match outcome {
        Ok(outcome) => {
            info!(
                chat_id = chat_id.0,
                folder = %outcome.folder.display(),
                resolved = outcome.resolved,
                failed = outcome.failed,
                "export delivered"
            );
            state.outbound.send_document(chat_id, &outcome.report).await?;
            state
                .outbound
                .send_document(chat_id, &outcome.failed_report)
                .await?;
            state
                .outbound
                .send_text(
                    chat_id,
                    &format!(
                        "Done: {} resolved, {} failed. Files are in {}.",
                        outcome.resolved,
                        outcome.failed,
                        outcome.folder.display()
                    ),
                )
                .await
        },
        Err(e) => {
            error!(chat_id = chat_id.0, error = %e, "export failed");
            state
                .outbound
                .send_text(chat_id, &format!("Export failed: {e}"))
                .await
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const PASSWORD: &str = "hunter2";

    fn settings() -> ParserSettings {
        ParserSettings::default()
    }

    fn step(session: &mut ChatSession, text: &str) -> Action {
        apply(session, &settings(), PASSWORD, text)
    }

    fn reply(session: &mut ChatSession, text: &str) -> String {
        match step(session, text) {
            Action::Reply(reply) => reply,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    fn authorized_session() -> ChatSession {
        let mut session = ChatSession::new(10);
        session.authorized = true;
        session
    }

    #[test]
    fn auth_gate_blocks_everything_but_start() {
        let mut session = ChatSession::new(10);

        assert!(reply(&mut session, "/status").contains("Not authorized"));
        assert_eq!(reply(&mut session, "/start"), "Enter the password.");

        assert!(reply(&mut session, "wrong").contains("Not authorized"));
        assert!(!session.authorized);

        assert!(reply(&mut session, PASSWORD).starts_with("Authorized."));
        assert!(session.authorized);
    }

    #[test]
    fn collect_appends_and_done_stops() {
        let mut session = authorized_session();

        reply(&mut session, "/collect");
        assert_eq!(session.mode, SessionMode::Collecting);

        assert_eq!(reply(&mut session, "t.me/a/1\nt.me/b/2"), "2 lines collected.");
        assert_eq!(reply(&mut session, "t.me/c/3"), "3 lines collected.");

        assert!(reply(&mut session, "/done").starts_with("Stopped collecting, 3 lines"));
        assert_eq!(session.mode, SessionMode::Idle);
    }

    #[test]
    fn text_outside_collecting_is_ignored() {
        let mut session = authorized_session();
        assert_eq!(step(&mut session, "t.me/a/1"), Action::Ignore);
        assert!(session.input_text.is_empty());
    }

    #[test]
    fn format_splits_duplicates_and_enables_listing() {
        let mut session = authorized_session();
        session.input_text = "t.me/a/1 спорт\nt.me/b/2\nt.me/b/2 музыка".into();

        let summary = reply(&mut session, "/format");
        assert!(summary.starts_with("1 links, 2 duplicates."));
        assert!(summary.contains("/links"));
        assert!(summary.contains("/duplicates"));

        let page = reply(&mut session, "/links");
        assert!(page.starts_with("1. https://t.me/a/1 спорт"));
        assert_eq!(session.mode, SessionMode::ListingLinks);

        let page = reply(&mut session, "/duplicates");
        assert!(page.contains("t.me/b/2"));
        assert_eq!(session.mode, SessionMode::ListingDuplicates);
    }

    #[test]
    fn paging_commands_are_guarded_by_bounds() {
        let mut session = authorized_session();
        session.links = (0..25).map(|n| format!("t.me/ch/{n}")).collect();

        reply(&mut session, "/links");
        // guard-failed command falls back to the free-text no-op
        assert_eq!(step(&mut session, "/prev"), Action::Ignore);
        assert_eq!(session.list_index, 0);

        let page = reply(&mut session, "/next");
        assert!(page.contains("11. "));
        assert_eq!(session.list_index, 10);
    }

    #[test]
    fn export_requires_input() {
        let mut session = authorized_session();
        assert!(reply(&mut session, "/export").starts_with("Nothing to export"));

        session.input_text = "t.me/a/1".into();
        assert_eq!(step(&mut session, "/export"), Action::Export);
    }

    #[test]
    fn export_returns_session_to_idle() {
        let mut session = authorized_session();
        reply(&mut session, "/collect");
        reply(&mut session, "t.me/a/1");

        assert_eq!(step(&mut session, "/export"), Action::Export);
        assert_eq!(session.mode, SessionMode::Idle);

        // no longer collecting: stray text after the export is ignored
        assert_eq!(step(&mut session, "t.me/b/2"), Action::Ignore);
        assert_eq!(session.input_text, "t.me/a/1");
    }

    #[test]
    fn status_reports_session_counters() {
        let mut session = authorized_session();
        session.input_text = "t.me/a/1\nt.me/b/2".into();
        session.links.push("x".into());

        let status = reply(&mut session, "/status");
        assert!(status.contains("Mode: idle"));
        assert!(status.contains("2 input lines"));
        assert!(status.contains("1 links"));
    }

    #[test]
    fn empty_password_never_authorizes() {
        let mut session = ChatSession::new(10);
        let action = apply(&mut session, &settings(), "", "");
        assert!(matches!(action, Action::Reply(_)));
        assert!(!session.authorized);
    }
}
