use crate::{Event, InternalError, RelayError};
use handlebars::Handlebars;
use serde_json::{Map, Value};

pub const TYPE_PLACEHOLDER: &str = "${type}";
pub const DATA_PLACEHOLDER: &str = "${data}";

pub trait TemplateExt {
    /// Substitutes the event into a user-authored body template.
    fn render(&self, template: &str, event: &Event) -> Result<String, RelayError>;

    /// Renders the template and parses the result as the request payload.
    fn render_as_json(&self, template: &str, event: &Event) -> Result<Value, RelayError> {
        let rendered = self.render(template, event)?;

        serde_json::from_str(&rendered).map_err(|e| {
            InternalError::template_substitution_error(
                &format!("Rendered body is not valid JSON: {e}"),
                Some("parse"),
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct BodyTemplate {
    template: Handlebars<'static>,
}

impl Default for BodyTemplate {
    fn default() -> Self {
        let mut template = Handlebars::new();
        template.set_strict_mode(true);
        template.register_escape_fn(handlebars::no_escape);
        Self { template }
    }
}

impl TemplateExt for BodyTemplate {
    fn render(&self, template: &str, event: &Event) -> Result<String, RelayError> {
        let compiled = compile(template);
        let data = event.event_data.to_string();

        let mut context = Map::with_capacity(compiled.literals.len() + 4);
        context.insert("type_quoted".into(), quote(&event.event_type)?.into());
        context.insert("type_escaped".into(), escape(&event.event_type)?.into());
        context.insert("data_escaped".into(), escape(&data)?.into());
        context.insert("data_raw".into(), data.into());
        for (i, literal) in compiled.literals.into_iter().enumerate() {
            context.insert(format!("lit_{i}"), literal.into());
        }

        self.template
            .render_template(&compiled.template, &Value::Object(context))
            .map_err(|e| {
                InternalError::template_substitution_error(&e.to_string(), Some("render"))
            })
    }
}

/// Where a placeholder sits relative to the JSON grammar of the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    InsideString,
    Bare,
}

/// A body template translated for handlebars.
///
/// `template` only ever contains generated expressions. The user's literal
/// text travels in `literals` and is referenced as `lit_<index>`, so nothing
/// the user wrote is read as handlebars syntax.
#[derive(Debug, Default, PartialEq, Eq)]
struct Compiled {
    template: String,
    literals: Vec<String>,
}

impl Compiled {
    fn push_literal(&mut self, literal: &mut String) {
        if literal.is_empty() {
            return;
        }
        self.template
            .push_str(&format!("{{{{{{lit_{}}}}}}}", self.literals.len()));
        self.literals.push(std::mem::take(literal));
    }
}

/// Each placeholder is mapped to a pre-escaped context value chosen by whether
/// it appears inside a JSON string literal of the template.
fn compile(template: &str) -> Compiled {
    let mut compiled = Compiled::default();
    let mut literal = String::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        let placeholder = [TYPE_PLACEHOLDER, DATA_PLACEHOLDER]
            .into_iter()
            .find(|p| rest.starts_with(*p));

        if let Some(placeholder) = placeholder {
            let position = if in_string {
                Position::InsideString
            } else {
                Position::Bare
            };
            compiled.push_literal(&mut literal);
            compiled.template.push_str(expression(placeholder, position));
            escaped = false;
            rest = &rest[placeholder.len()..];
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        }

        literal.push(c);
        rest = &rest[c.len_utf8()..];
    }

    compiled.push_literal(&mut literal);
    compiled
}

fn expression(placeholder: &str, position: Position) -> &'static str {
    match (placeholder, position) {
        (TYPE_PLACEHOLDER, Position::InsideString) => "{{{type_escaped}}}",
        (TYPE_PLACEHOLDER, Position::Bare) => "{{{type_quoted}}}",
        (_, Position::InsideString) => "{{{data_escaped}}}",
        (_, Position::Bare) => "{{{data_raw}}}",
    }
}

fn quote(value: &str) -> Result<String, RelayError> {
    serde_json::to_string(value)
        .map_err(|e| InternalError::serialize_error(&e.to_string(), Some("quote")))
}

fn escape(value: &str) -> Result<String, RelayError> {
    let quoted = quote(value)?;
    Ok(quoted[1..quoted.len() - 1].to_string())
}
