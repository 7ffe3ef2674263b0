//! script sink: substitutes notification fields into a pre-parsed command
//! template, then runs it as a child process.
//!
//! Grounded on `heyu.notifier`'s script driver (invoked via `subprocess` in
//! the original); the template is compiled once at construction so an
//! unknown field name or an unescaped brace fails at startup rather than on
//! the first notification (spec.md §4.5: "validated once at startup").

use tokio::process::Command;

use super::Notification;
use crate::error::{NotifierError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Application,
    Summary,
    Body,
    Category,
    Urgency,
}

impl Field {
    fn from_name(name: &str) -> Option<Field> {
        match name {
            "id" => Some(Field::Id),
            "application" => Some(Field::Application),
            "summary" => Some(Field::Summary),
            "body" => Some(Field::Body),
            "category" => Some(Field::Category),
            "urgency" => Some(Field::Urgency),
            _ => None,
        }
    }
}

fn compile_token(token: &str) -> Result<Vec<TemplatePart>> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = token.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(NotifierError::UnescapedBrace);
                }
                let field = Field::from_name(name.trim())
                    .ok_or_else(|| NotifierError::UnknownTemplateField(name.clone()))?;
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Field(field));
            }
            '}' => return Err(NotifierError::UnescapedBrace),
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    Ok(parts)
}

fn render(parts: &[TemplatePart], notification: &Notification) -> String {
    let mut out = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(s) => out.push_str(s),
            TemplatePart::Field(Field::Id) => out.push_str(&notification.id),
            TemplatePart::Field(Field::Application) => out.push_str(&notification.application),
            TemplatePart::Field(Field::Summary) => out.push_str(&notification.summary),
            TemplatePart::Field(Field::Body) => out.push_str(&notification.body),
            TemplatePart::Field(Field::Category) => {
                out.push_str(notification.category.as_deref().unwrap_or(""))
            }
            TemplatePart::Field(Field::Urgency) => out.push_str(&notification.urgency.to_string()),
        }
    }
    out
}

pub struct ScriptSink {
    argv: Vec<Vec<TemplatePart>>,
}

impl ScriptSink {
    /// Compiles a whitespace-separated command template, e.g.
    /// `notify-send {summary} {body}`.
    pub fn compile(template: &str) -> Result<Self> {
        let argv = template
            .split_whitespace()
            .map(compile_token)
            .collect::<Result<Vec<_>>>()?;
        if argv.is_empty() {
            return Err(NotifierError::UnknownTemplateField(String::new()));
        }
        Ok(ScriptSink { argv })
    }

    pub async fn show(&mut self, notification: &Notification) -> Result<()> {
        let rendered: Vec<String> = self
            .argv
            .iter()
            .map(|parts| render(parts, notification))
            .collect();
        let (program, args) = rendered.split_first().expect("compile() rejects empty templates");
        let status = Command::new(program).args(args).status().await?;
        if !status.success() {
            tracing::warn!(?status, "script sink command exited non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Notification {
        Notification {
            id: "abc".to_string(),
            application: "chat".to_string(),
            summary: "hi".to_string(),
            body: "there".to_string(),
            category: None,
            urgency: heyu_proto::Urgency::Normal,
        }
    }

    #[test]
    fn compiles_and_renders_known_fields() {
        let sink = ScriptSink::compile("echo {summary} {body}").unwrap();
        let rendered: Vec<String> = sink.argv.iter().map(|p| render(p, &sample())).collect();
        assert_eq!(rendered, vec!["echo", "hi", "there"]);
    }

    #[test]
    fn rejects_unknown_field() {
        assert!(ScriptSink::compile("echo {nonsense}").is_err());
    }

    #[test]
    fn rejects_unescaped_brace() {
        assert!(ScriptSink::compile("echo {summary").is_err());
    }

    #[test]
    fn escaped_braces_are_literal() {
        let sink = ScriptSink::compile("echo {{literal}}").unwrap();
        let rendered: Vec<String> = sink.argv.iter().map(|p| render(p, &sample())).collect();
        assert_eq!(rendered, vec!["echo", "{literal}"]);
    }
}
