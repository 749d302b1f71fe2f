//! Persona system prompt.
//!
//! The template is plain text with two placeholders, `{personality}` and
//! `{language}`, substituted verbatim. Anything in braces that looks like
//! an identifier but is not one of those is rejected up front, so a typo in
//! `config.toml` fails at startup instead of leaking into every prompt.

use parley_types::config::DEFAULT_SYSTEM_TEMPLATE;
use parley_types::error::ConfigError;
use parley_types::session::Persona;

const PLACEHOLDERS: [&str; 2] = ["personality", "language"];

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        if let Some(unknown) = placeholder_names(&template).find(|n| !PLACEHOLDERS.contains(n)) {
            return Err(ConfigError::Invalid(format!(
                "unknown placeholder '{{{unknown}}}' in system template"
            )));
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Single pass, so braces inside the persona text are never re-expanded.
    pub fn render(&self, persona: &Persona) -> String {
        let mut out = String::with_capacity(self.template.len() + 32);
        let mut rest = self.template.as_str();
        while let Some(idx) = rest.find('{') {
            out.push_str(&rest[..idx]);
            let tail = &rest[idx..];
            if let Some(after) = tail.strip_prefix("{personality}") {
                out.push_str(&persona.personality);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{language}") {
                out.push_str(&persona.language);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_SYSTEM_TEMPLATE.to_string(),
        }
    }
}

/// Identifier-shaped `{name}` tokens in `template`.
fn placeholder_names(template: &str) -> impl Iterator<Item = &str> {
    template.split('{').skip(1).filter_map(|chunk| {
        let (name, _) = chunk.split_once('}')?;
        let is_ident = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        is_ident.then_some(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_renders_persona() {
        let prompt = PromptTemplate::default().render(&Persona::new("humorous and witty", "Spanish"));
        assert_eq!(
            prompt,
            "You are a helpful assistant with a humorous and witty personality. \
             Answer all questions to the best of your ability in Spanish."
        );
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let template = PromptTemplate::new("{language} only. Reply in {language}.").unwrap();
        assert_eq!(
            template.render(&Persona::new("x", "French")),
            "French only. Reply in French."
        );
    }

    #[test]
    fn test_persona_text_is_verbatim() {
        let template = PromptTemplate::new("Be {personality}.").unwrap();
        let rendered = template.render(&Persona::new("{language} & <b>bold</b>", "English"));
        assert_eq!(rendered, "Be {language} & <b>bold</b>.");
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = PromptTemplate::new("You are {name}.").unwrap_err();
        assert!(err.to_string().contains("{name}"));
    }

    #[test]
    fn test_non_identifier_braces_allowed() {
        assert!(PromptTemplate::new("Answer as JSON like {\"a\": 1} in {language}.").is_ok());
    }
}
