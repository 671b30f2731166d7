//! Link input grammar and normalization.
//!
//! # Responsibility
//! - Turn raw operator input into a link choice plus optional comment.
//! - Normalize free text into absolute links against one link template.
//!
//! # Invariants
//! - [`SKIP_MARKER`] and [`COMMENT_DELIMITER`] are only interpreted here.
//! - A normalized link is empty, the skip marker, or starts with one of
//!   [`URL_PREFIXES`].

/// Link value recorded when the operator skips an entity.
pub const SKIP_MARKER: &str = "-";
/// Separates the link from a free-form comment in operator input.
pub const COMMENT_DELIMITER: &str = "***";
pub const URL_PREFIXES: [&str; 2] = ["http://", "https://"];
pub const DEFAULT_LINK_TEMPLATE: &str = "https://en.wikipedia.org/wiki/{}";

const TEMPLATE_PLACEHOLDER: &str = "{}";

/// What the operator chose for an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChoice {
    /// Skip marker; accepted without existence validation.
    Skip,
    /// No link exists for this entity.
    Empty,
    /// Absolute link that must be validated before commit.
    Url(String),
}

impl LinkChoice {
    /// Interprets a link value as stored in the ledger.
    pub fn from_stored(link: &str) -> Self {
        match link {
            SKIP_MARKER => Self::Skip,
            "" => Self::Empty,
            other => Self::Url(other.to_string()),
        }
    }

    /// Link value written to the ledger.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Skip => SKIP_MARKER,
            Self::Empty => "",
            Self::Url(link) => link.as_str(),
        }
    }
}

/// Parsed operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub choice: LinkChoice,
    pub comment: Option<String>,
}

/// Returns whether `link` already carries an URL scheme prefix.
pub fn is_absolute_link(link: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| link.starts_with(prefix))
}

/// Replaces whitespace with underscores and qualifies relative names
/// against `template`.
///
/// `template` uses `{}` as placeholder; a template without placeholder is
/// treated as a prefix.
pub fn normalize_link(raw: &str, template: &str) -> String {
    let link: String = raw
        .trim()
        .chars()
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .collect();
    if link.is_empty() || is_absolute_link(&link) {
        return link;
    }
    if template.contains(TEMPLATE_PLACEHOLDER) {
        template.replacen(TEMPLATE_PLACEHOLDER, &link, 1)
    } else {
        format!("{template}{link}")
    }
}

/// Splits raw input into link and comment, then normalizes the link.
///
/// - blank input yields an empty link without comment;
/// - input starting with the delimiter yields an empty link with comment;
/// - `link *** comment` splits on the first ` ***`;
/// - the skip marker is kept verbatim.
pub fn parse_user_input(raw: &str, template: &str) -> UserInput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UserInput {
            choice: LinkChoice::Empty,
            comment: None,
        };
    }

    if let Some(comment) = trimmed.strip_prefix(COMMENT_DELIMITER) {
        return UserInput {
            choice: LinkChoice::Empty,
            comment: non_empty(comment),
        };
    }

    let separator = format!(" {COMMENT_DELIMITER}");
    let (link, comment) = match trimmed.split_once(separator.as_str()) {
        Some((link, comment)) => (link.trim(), non_empty(comment)),
        None => (trimmed, None),
    };

    let choice = if link == SKIP_MARKER {
        LinkChoice::Skip
    } else {
        LinkChoice::from_stored(&normalize_link(link, template))
    };
    UserInput { choice, comment }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        normalize_link, parse_user_input, LinkChoice, DEFAULT_LINK_TEMPLATE, SKIP_MARKER,
    };

    #[test]
    fn normalize_qualifies_names_against_template() {
        assert_eq!(
            normalize_link(" Jim Lehrer ", DEFAULT_LINK_TEMPLATE),
            "https://en.wikipedia.org/wiki/Jim_Lehrer"
        );
    }

    #[test]
    fn normalize_is_idempotent_on_absolute_links() {
        assert_eq!(
            normalize_link("https://x.com/y", DEFAULT_LINK_TEMPLATE),
            "https://x.com/y"
        );
        let once = normalize_link("New York City", DEFAULT_LINK_TEMPLATE);
        assert_eq!(normalize_link(&once, DEFAULT_LINK_TEMPLATE), once);
    }

    #[test]
    fn normalize_keeps_empty_and_supports_prefix_templates() {
        assert_eq!(normalize_link("   ", DEFAULT_LINK_TEMPLATE), "");
        assert_eq!(
            normalize_link("Q42", "https://www.wikidata.org/wiki/"),
            "https://www.wikidata.org/wiki/Q42"
        );
    }

    #[test]
    fn parse_splits_link_and_comment() {
        let input = parse_user_input("Jim Lehrer *** anchor of the NewsHour", DEFAULT_LINK_TEMPLATE);
        assert_eq!(
            input.choice,
            LinkChoice::Url("https://en.wikipedia.org/wiki/Jim_Lehrer".to_string())
        );
        assert_eq!(input.comment.as_deref(), Some("anchor of the NewsHour"));
    }

    #[test]
    fn parse_delimiter_prefix_yields_empty_link_with_comment() {
        let input = parse_user_input("*** no article exists", DEFAULT_LINK_TEMPLATE);
        assert_eq!(input.choice, LinkChoice::Empty);
        assert_eq!(input.comment.as_deref(), Some("no article exists"));
    }

    #[test]
    fn parse_keeps_skip_marker_verbatim() {
        let input = parse_user_input(" - ", DEFAULT_LINK_TEMPLATE);
        assert_eq!(input.choice, LinkChoice::Skip);
        assert_eq!(input.choice.as_str(), SKIP_MARKER);

        let with_comment = parse_user_input("- *** unclear reference", DEFAULT_LINK_TEMPLATE);
        assert_eq!(with_comment.choice, LinkChoice::Skip);
        assert_eq!(with_comment.comment.as_deref(), Some("unclear reference"));
    }

    #[test]
    fn parse_blank_input_is_empty_without_comment() {
        let input = parse_user_input("  ", DEFAULT_LINK_TEMPLATE);
        assert_eq!(input.choice, LinkChoice::Empty);
        assert_eq!(input.comment, None);
    }
}
