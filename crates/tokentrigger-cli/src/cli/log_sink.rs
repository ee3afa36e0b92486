//! Terminal log sink for trigger executions.

use console::Term;

use tokentrigger_core::context::LogSink;

/// Writes run log lines to a terminal stream.
///
/// Job links become OSC 8 hyperlinks when the stream is an interactive
/// terminal, plain `text (url)` otherwise.
pub struct ConsoleLogSink {
    term: Term,
    links: bool,
}

impl ConsoleLogSink {
    pub fn stdout() -> Self {
        Self::for_term(Term::stdout())
    }

    pub fn stderr() -> Self {
        Self::for_term(Term::stderr())
    }

    fn for_term(term: Term) -> Self {
        let links = term.is_term();
        Self { term, links }
    }
}

impl LogSink for ConsoleLogSink {
    fn line(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            tracing::debug!("failed to write log line: {e}");
        }
    }

    fn hyperlink(&self, url: &str, text: &str) -> String {
        if self.links {
            osc8_link(url, text)
        } else {
            format!("{text} ({url})")
        }
    }
}

fn osc8_link(url: &str, text: &str) -> String {
    format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
}
