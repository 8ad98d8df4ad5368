//! Terminal output for docmerge commands.

use console::{Style, Term};
use docmerge_fields::FieldKind;

/// Terminal output formatter.
///
/// Status lines go to stderr so merged XML and field listings on stdout stay
/// pipeable.
pub(crate) struct Output {
    status: Term,
    listing: Term,
    ok: Style,
    notice: Style,
    failure: Style,
    kind: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            status: Term::stderr(),
            listing: Term::stdout(),
            ok: Style::new().green().for_stderr(),
            notice: Style::new().yellow().for_stderr(),
            failure: Style::new().red().bold().for_stderr(),
            kind: Style::new().cyan(),
        }
    }

    /// Plain status line.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.status.write_line(msg);
    }

    /// One listed merge field: its kind, then its expression.
    pub(crate) fn field(&self, kind: FieldKind, expression: &str) {
        let label = format!("{kind:<8}");
        let _ = self
            .listing
            .write_line(&format!("{}{expression}", self.kind.apply_to(label)));
    }

    pub(crate) fn success(&self, msg: &str) {
        let _ = self.status.write_line(&self.ok.apply_to(msg).to_string());
    }

    pub(crate) fn warning(&self, msg: &str) {
        let _ = self.status.write_line(&self.notice.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        let _ = self.status.write_line(&self.failure.apply_to(msg).to_string());
    }
}
