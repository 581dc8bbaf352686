//! Placeholder templates.
//!
//! Templates use `{name}` placeholders. Host-specific placeholders are
//! filled first by the host's [`TemplateResolver`]; the bridge then fills its
//! own keys in the order given.

use crate::player::PlayerRef;

/// Host collaborator that fills host-owned placeholders for a player.
pub trait TemplateResolver: Send + Sync {
    fn resolve(&self, subject: &PlayerRef, template: &str) -> String;
}

/// Resolver for hosts without a placeholder service.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughResolver;

impl TemplateResolver for PassthroughResolver {
    fn resolve(&self, _subject: &PlayerRef, template: &str) -> String {
        template.to_string()
    }
}

/// Replace each `{key}` with its value, one key at a time.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill() {
        let out = fill(
            "[{type}] {player}: {message}",
            &[("type", "G"), ("player", "Steve"), ("message", "hi {type}")],
        );
        // Later keys are not re-expanded inside earlier values' output.
        assert_eq!(out, "[G] Steve: hi {type}");
    }

    #[test]
    fn test_fill_repeats_and_missing() {
        assert_eq!(fill("{a}{a}{b}", &[("a", "x")]), "xx{b}");
        assert_eq!(fill("plain", &[("a", "x")]), "plain");
    }

    #[test]
    fn test_passthrough() {
        let player = PlayerRef::new(uuid::Uuid::nil(), "Steve", "world");
        assert_eq!(PassthroughResolver.resolve(&player, "%rank% {player}"), "%rank% {player}");
    }
}
