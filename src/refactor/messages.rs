//! Message catalog for user-facing conflict and notice texts.
//!
//! Templates use positional placeholders (`{0}`, `{1}`, ...). Unknown keys
//! format as the key itself so a missing entry is visible but harmless.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

pub const ALREADY_OVERRIDDEN: &str = "0.is.already.overridden.in.1";
pub const USES_PUSHED_DOWN: &str = "0.uses.1.which.is.pushed.down";
pub const ALREADY_EXISTS: &str = "0.already.exists.in.1";
pub const MOVE_INTO_ITSELF: &str = "cannot.move.0.into.itself";
pub const NOT_RELOCATABLE: &str = "0.cannot.be.moved";
pub const NOT_A_DIRECTORY: &str = "0.is.not.a.directory";
pub const SYMBOL_CLASH: &str = "0.would.be.named.1.like.2";
pub const ERROR_TITLE: &str = "error.title";

const STANDARD: &[(&str, &str)] = &[
    (ALREADY_OVERRIDDEN, "{0} is already overridden in {1}"),
    (USES_PUSHED_DOWN, "{0} uses {1}, which is pushed down"),
    (ALREADY_EXISTS, "{0} already exists in {1}"),
    (MOVE_INTO_ITSELF, "Cannot move {0} into itself"),
    (NOT_RELOCATABLE, "{0} cannot be moved"),
    (NOT_A_DIRECTORY, "{0} is not a directory"),
    (SYMBOL_CLASH, "{0} would be known as {1}, which already names {2}"),
    (ERROR_TITLE, "Error"),
];

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("placeholder pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    /// The built-in English texts.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            messages: STANDARD
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    /// Replace or add templates.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        for (key, template) in overrides {
            self.messages.insert(key.clone(), template.clone());
        }
        self
    }

    #[must_use]
    pub fn template<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).map_or(key, String::as_str)
    }

    /// Render `key` with positional arguments. Placeholders without an
    /// argument are left as written.
    #[must_use]
    pub fn format(&self, key: &str, args: &[&str]) -> String {
        placeholder()
            .replace_all(self.template(key), |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i))
                    .map_or_else(|| caps[0].to_string(), |arg| (*arg).to_string())
            })
            .into_owned()
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
