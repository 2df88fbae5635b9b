//! Directive tag scanning.
//!
//! Grammar, matched leftmost-first over raw body bytes:
//!
//! ```text
//! <get>REF</get>        plain internal GET
//! <xhrget>REF</xhrget>  internal GET carrying the ajax marker
//! ```
//!
//! - REF is the shortest run of non-newline bytes up to the first closing tag
//! - the opening tag alone decides the kind; `</get>` and `</xhrget>` both close
//! - an opening tag without a closing tag on the same line is left as literal text

use std::ops::Range;
use std::sync::LazyLock;

use regex::bytes::Regex;

/// Pattern for a single directive tag. Group 1 is the kind, group 2 the reference.
pub const DIRECTIVE_PATTERN: &str = r"(?-s)<(get|xhrget)>(.*?)</(?:get|xhrget)>";

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DIRECTIVE_PATTERN).expect("directive pattern is valid"));

/// Kind of directive, decided by the opening tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `<get>`: plain internal GET.
    Get,
    /// `<xhrget>`: internal GET marked as an XMLHttpRequest.
    XhrGet,
}

impl DirectiveKind {
    pub fn is_ajax(self) -> bool {
        matches!(self, DirectiveKind::XhrGet)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveKind::Get => "get",
            DirectiveKind::XhrGet => "xhrget",
        }
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directive tag found in a body. Borrows the reference from the scanned bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    /// Byte range of the whole tag, opening to closing.
    pub span: Range<usize>,
    pub kind: DirectiveKind,
    /// Raw enclosed reference, `path[?query]`.
    pub reference: &'a [u8],
}

/// Find every directive in `body`, left to right, non-overlapping.
pub fn scan(body: &[u8]) -> impl Iterator<Item = Directive<'_>> {
    DIRECTIVE.captures_iter(body).filter_map(|caps| {
        let whole = caps.get(0)?;
        let kind = match caps.get(1)?.as_bytes() {
            b"xhrget" => DirectiveKind::XhrGet,
            _ => DirectiveKind::Get,
        };
        Some(Directive {
            span: whole.range(),
            kind,
            reference: caps.get(2)?.as_bytes(),
        })
    })
}
