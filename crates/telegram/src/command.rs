use crate::session::{ChatSession, SessionMode};

/// Operator commands. Guard conditions live in [`Command::is_allowed`];
/// dispatch happens in the handlers module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Collect,
    Done,
    Format,
    Links,
    Duplicates,
    Next,
    Prev,
    Export,
    Status,
}

impl Command {
    /// All commands, in the order they are advertised to Telegram.
    pub const ALL: &[Command] = &[
        Self::Start,
        Self::Collect,
        Self::Done,
        Self::Format,
        Self::Links,
        Self::Duplicates,
        Self::Next,
        Self::Prev,
        Self::Export,
        Self::Status,
    ];

    /// Parse a message as a command. `/links@my_bot` is accepted the same
    /// as `/links`; anything not starting with `/` is free text.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let name = rest.split_whitespace().next().unwrap_or("");
        let name = name.split('@').next().unwrap_or("");
        Self::ALL.iter().copied().find(|c| c.token() == name)
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Collect => "collect",
            Self::Done => "done",
            Self::Format => "format",
            Self::Links => "links",
            Self::Duplicates => "duplicates",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Export => "export",
            Self::Status => "status",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Start => "authorize this chat",
            Self::Collect => "start collecting pasted links",
            Self::Done => "stop collecting",
            Self::Format => "canonicalize input and split out duplicates",
            Self::Links => "page through the collected links",
            Self::Duplicates => "page through quarantined duplicates",
            Self::Next => "next page",
            Self::Prev => "previous page",
            Self::Export => "build and send the report files",
            Self::Status => "show session state",
        }
    }

    /// Whether the command makes sense in the session's current state.
    pub fn is_allowed(self, session: &ChatSession) -> bool {
        if self == Self::Start {
            return true;
        }
        if !session.authorized {
            return false;
        }
        match self {
            Self::Start => true,
            Self::Collect | Self::Format | Self::Export | Self::Status => true,
            Self::Done => session.mode == SessionMode::Collecting,
            Self::Links => !session.links.is_empty(),
            Self::Duplicates => !session.duplicate_links.is_empty(),
            Self::Next => session.can_page_forward(),
            Self::Prev => session.can_page_backward(),
        }
    }

    /// The commands currently available, for appending to replies.
    pub fn available(session: &ChatSession) -> Vec<Command> {
        Self::ALL
            .iter()
            .copied()
            .filter(|c| c.is_allowed(session))
            .collect()
    }

    /// Render the available commands as a one-line hint.
    pub fn hint(session: &ChatSession) -> String {
        let tokens: Vec<String> = Self::available(session)
            .iter()
            .map(|c| format!("/{}", c.token()))
            .collect();
        format!("Commands: {}", tokens.join(" "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn authorized() -> ChatSession {
        let mut session = ChatSession::new(10);
        session.authorized = true;
        session
    }

    #[test]
    fn parses_plain_and_addressed_commands() {
        assert_eq!(Command::parse("/links"), Some(Command::Links));
        assert_eq!(Command::parse("/links@postdesk_bot"), Some(Command::Links));
        assert_eq!(Command::parse("  /status  "), Some(Command::Status));
        assert_eq!(Command::parse("links"), None);
        assert_eq!(Command::parse("/unknown"), None);
    }

    #[test]
    fn start_is_always_allowed() {
        let session = ChatSession::new(10);
        assert!(Command::Start.is_allowed(&session));
        assert!(!Command::Collect.is_allowed(&session));
        assert!(!Command::Status.is_allowed(&session));
    }

    #[test]
    fn done_requires_collecting_mode() {
        let mut session = authorized();
        assert!(!Command::Done.is_allowed(&session));
        session.mode = SessionMode::Collecting;
        assert!(Command::Done.is_allowed(&session));
    }

    #[test]
    fn list_commands_require_nonempty_lists() {
        let mut session = authorized();
        assert!(!Command::Links.is_allowed(&session));
        assert!(!Command::Duplicates.is_allowed(&session));
        session.links.push("x".into());
        assert!(Command::Links.is_allowed(&session));
        assert!(!Command::Duplicates.is_allowed(&session));
    }

    #[test]
    fn paging_follows_list_bounds() {
        let mut session = authorized();
        session.links = (0..15).map(|n| n.to_string()).collect();
        session.mode = SessionMode::ListingLinks;
        assert!(Command::Next.is_allowed(&session));
        assert!(!Command::Prev.is_allowed(&session));
        session.page_forward();
        assert!(!Command::Next.is_allowed(&session));
        assert!(Command::Prev.is_allowed(&session));
    }

    #[test]
    fn hint_lists_slash_tokens() {
        let session = authorized();
        let hint = Command::hint(&session);
        assert!(hint.starts_with("Commands: /start"));
        assert!(hint.contains("/collect"));
        assert!(!hint.contains("/done"));
    }
}
