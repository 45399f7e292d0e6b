use postdesk_parser::ParseOutcome;

/// What the session is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Idle,
    /// Free text is appended to the accumulated input.
    Collecting,
    /// Paging through the primary link list.
    ListingLinks,
    /// Paging through the quarantined duplicates.
    ListingDuplicates,
}

impl SessionMode {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Collecting => "collecting links",
            Self::ListingLinks => "listing links",
            Self::ListingDuplicates => "listing duplicates",
        }
    }
}

/// Per-operator session state. Never shared between chats; each chat gets
/// its own lazily created copy of the defaults.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub authorized: bool,
    pub mode: SessionMode,
    /// Raw accumulated input text. `/format` rewrites it canonically; all
    /// derived lists come from this text, never the other way around.
    pub input_text: String,
    pub links: Vec<String>,
    pub duplicate_links: Vec<String>,
    pub list_index: usize,
    pub list_page_lines: usize,
}

impl ChatSession {
    pub fn new(list_page_lines: usize) -> Self {
        Self {
            authorized: false,
            mode: SessionMode::default(),
            input_text: String::new(),
            links: Vec::new(),
            duplicate_links: Vec::new(),
            list_index: 0,
            list_page_lines: list_page_lines.max(1),
        }
    }

    pub fn line_count(&self) -> usize {
        self.input_text.lines().count()
    }

    /// Append free text to the accumulated input. Returns the new line
    /// count.
    pub fn append_text(&mut self, text: &str) -> usize {
        if !self.input_text.is_empty() {
            self.input_text.push('\n');
        }
        self.input_text.push_str(text);
        self.line_count()
    }

    /// Replace the accumulated text with the canonical form and refresh the
    /// derived lists. The only place lists are ever derived.
    pub fn apply_format(&mut self, outcome: &ParseOutcome) {
        self.links = outcome
            .records
            .iter()
            .map(postdesk_parser::LinkRecord::formatted)
            .collect();
        self.duplicate_links = outcome.duplicates.clone();
        self.input_text = outcome.formatted_text();
        self.list_index = 0;
    }

    fn current_list(&self) -> Option<&[String]> {
        match self.mode {
            SessionMode::ListingLinks => Some(&self.links),
            SessionMode::ListingDuplicates => Some(&self.duplicate_links),
            _ => None,
        }
    }

    pub fn can_page_forward(&self) -> bool {
        self.current_list()
            .is_some_and(|list| self.list_index + self.list_page_lines < list.len())
    }

    pub fn can_page_backward(&self) -> bool {
        self.current_list().is_some() && self.list_index > 0
    }

    /// Advance one page, clamped to `len − 1`.
    pub fn page_forward(&mut self) {
        if let Some(list) = self.current_list() {
            let last = list.len().saturating_sub(1);
            self.list_index = (self.list_index + self.list_page_lines).min(last);
        }
    }

    /// Go back one page, clamped to 0.
    pub fn page_backward(&mut self) {
        self.list_index = self.list_index.saturating_sub(self.list_page_lines);
    }

    /// Render the current page: 1-based positions, ellipsis markers when
    /// entries exist before or after the page.
    pub fn render_page(&self) -> String {
        let Some(list) = self.current_list() else {
            return String::new();
        };
        let end = (self.list_index + self.list_page_lines).min(list.len());

        let mut lines = Vec::new();
        if self.list_index > 0 {
            lines.push("…".to_string());
        }
        for (offset, entry) in list[self.list_index..end].iter().enumerate() {
            lines.push(format!("{}. {entry}", self.list_index + offset + 1));
        }
        if end < list.len() {
            lines.push("…".to_string());
        }
        lines.join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn listing_session(entries: usize, page: usize) -> ChatSession {
        let mut session = ChatSession::new(page);
        session.authorized = true;
        session.links = (1..=entries).map(|n| format!("link{n}")).collect();
        session.mode = SessionMode::ListingLinks;
        session
    }

    #[test]
    fn append_returns_line_count() {
        let mut session = ChatSession::new(10);
        assert_eq!(session.append_text("a\nb"), 2);
        assert_eq!(session.append_text("c"), 3);
        assert_eq!(session.input_text, "a\nb\nc");
    }

    #[test]
    fn page_forward_clamps_to_last_entry() {
        let mut session = listing_session(5, 3);
        session.page_forward();
        assert_eq!(session.list_index, 3);
        assert!(!session.can_page_forward());
        session.page_forward();
        assert_eq!(session.list_index, 4);
    }

    #[test]
    fn page_backward_clamps_to_zero() {
        let mut session = listing_session(5, 3);
        assert!(!session.can_page_backward());
        session.list_index = 4;
        session.page_backward();
        assert_eq!(session.list_index, 1);
        session.page_backward();
        assert_eq!(session.list_index, 0);
    }

    #[test]
    fn render_first_page_has_trailing_ellipsis_only() {
        let session = listing_session(5, 2);
        assert_eq!(session.render_page(), "1. link1\n2. link2\n…");
    }

    #[test]
    fn render_middle_page_has_both_ellipses() {
        let mut session = listing_session(5, 2);
        session.list_index = 2;
        assert_eq!(session.render_page(), "…\n3. link3\n4. link4\n…");
    }

    #[test]
    fn render_last_page_has_leading_ellipsis_only() {
        let mut session = listing_session(5, 2);
        session.list_index = 4;
        assert_eq!(session.render_page(), "…\n5. link5");
    }

    #[test]
    fn single_page_has_no_ellipses() {
        let session = listing_session(2, 10);
        assert_eq!(session.render_page(), "1. link1\n2. link2");
    }

    #[test]
    fn apply_format_rewrites_text_and_lists() {
        let mut session = ChatSession::new(10);
        session.input_text = "t.me/a/1 спорт\nt.me/b/2\nt.me/b/2 музыка".into();
        let outcome =
            postdesk_parser::parse(&session.input_text, &postdesk_parser::ParserSettings::default());

        session.apply_format(&outcome);
        assert_eq!(session.links, vec!["https://t.me/a/1 спорт"]);
        assert_eq!(session.duplicate_links.len(), 2);
        assert!(session.input_text.contains("\n\n"));
        assert_eq!(session.list_index, 0);
    }

    #[test]
    fn zero_page_size_is_bumped_to_one() {
        let session = ChatSession::new(0);
        assert_eq!(session.list_page_lines, 1);
    }
}
