//! Turning engine answers into what the editor displays.
//!
//! Language differences are data, not branches: each language may register a
//! [`FormatPolicy`] and everything else falls back to [`DEFAULT_POLICY`].

mod calltip;
mod completion;

pub use calltip::{format_call_tip, wrap_tip, CallTip, TIP_PADDING};
pub use completion::{category, format_completions};

/// One row of the completion popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// Text shown in the list.
    pub label: String,
    /// Snippet inserted when the row is chosen.
    pub insertion: String,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, insertion: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            insertion: insertion.into(),
        }
    }
}

/// How completion names are rewritten for display and insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTransform {
    Identity,
    /// Variables get a `$` sigil, except after `->`/`::` member access.
    PhpVariables,
}

/// Completion trigger type for which PHP variables keep their bare name.
pub const PHP_MEMBER_TRIGGER: &str = "php-complete-object-members";

/// Per-language formatting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatPolicy {
    pub name_transform: NameTransform,
    /// Kinds that get a `($0)` call placeholder.
    pub callable_kinds: &'static [&'static str],
    /// Typed characters that close the completion popup.
    pub stop_chars: &'static str,
}

impl FormatPolicy {
    pub fn is_callable(&self, kind: &str) -> bool {
        self.callable_kinds.contains(&kind)
    }

    pub fn is_stop_char(&self, c: char) -> bool {
        self.stop_chars.contains(c)
    }

    /// Name as displayed and inserted, before `$` escaping.
    pub fn display_name(&self, kind: &str, name: &str, trigger_type: Option<&str>) -> String {
        match self.name_transform {
            NameTransform::PhpVariables
                if kind == "variable" && trigger_type != Some(PHP_MEMBER_TRIGGER) =>
            {
                format!("${name}")
            }
            _ => name.to_string(),
        }
    }
}

pub const DEFAULT_POLICY: FormatPolicy = FormatPolicy {
    name_transform: NameTransform::Identity,
    callable_kinds: &["function"],
    stop_chars: " ~`!@#%^&*()-=+{}[]|\\;:'\",<>?/",
};

pub const PHP_POLICY: FormatPolicy = FormatPolicy {
    name_transform: NameTransform::PhpVariables,
    callable_kinds: &["function"],
    stop_chars: " ~`!@#%^&*()=+{}[]|\\;'\",.?/",
};

static POLICIES: &[(&str, FormatPolicy)] = &[("PHP", PHP_POLICY)];

/// Formatting policy for `language`.
pub fn policy_for(language: &str) -> &'static FormatPolicy {
    POLICIES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, policy)| policy)
        .unwrap_or(&DEFAULT_POLICY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_lookup() {
        assert_eq!(policy_for("PHP"), &PHP_POLICY);
        assert_eq!(policy_for("Python"), &DEFAULT_POLICY);
    }

    #[test]
    fn test_php_variable_names() {
        let php = policy_for("PHP");
        assert_eq!(php.display_name("variable", "user", None), "$user");
        assert_eq!(
            php.display_name("variable", "user", Some(PHP_MEMBER_TRIGGER)),
            "user"
        );
        assert_eq!(php.display_name("function", "strlen", None), "strlen");
        assert_eq!(
            DEFAULT_POLICY.display_name("variable", "user", None),
            "user"
        );
    }

    #[test]
    fn test_stop_chars() {
        assert!(DEFAULT_POLICY.is_stop_char('('));
        assert!(DEFAULT_POLICY.is_stop_char(' '));
        assert!(!DEFAULT_POLICY.is_stop_char('.'));
        assert!(!DEFAULT_POLICY.is_stop_char('a'));
        assert!(!PHP_POLICY.is_stop_char('>'));
        assert!(!PHP_POLICY.is_stop_char(':'));
        assert!(PHP_POLICY.is_stop_char('.'));
    }
}
