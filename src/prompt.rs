use crate::error::{Result, RoastError};
use crate::models::TargetBinding;

pub const TARGET_NAME_VAR: &str = "target_name";
pub const RELATION_VAR: &str = "relation";

/// Instruction sent once per conversation to produce the opening roast.
pub const ROAST_TEMPLATE: &str = "You are the ultimate roast master AI.
Roast the person in Hinglish using witty sarcasm.

Target Details:
- Name: {target_name}
- Relation (if given): {relation}

Roasting Rules:
1. Directly address {target_name} in the roast.
2. If the relation is not \"unknown\", use it to make the roast more personal. Otherwise ignore it.
3. Mix Hindi and English the way friends actually talk.
4. Be savage and funny, but never attack race, religion, caste or gender.
5. Keep it to a few punchy lines.

Now generate a savage Hinglish roast for {target_name} (relation: {relation}):";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// A text template with `{name}` placeholders.
///
/// Rendering is a single pass over the template. Substituted values are
/// inserted verbatim and never scanned again. A `{` that does not open a
/// `{identifier}` marker is kept as literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    /// Builds a template, checking that its placeholders and the declared
    /// input variables match exactly.
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Result<Self> {
        let template = template.into();
        let input_variables: Vec<String> = input_variables.iter().map(|v| v.to_string()).collect();

        for segment in parse(&template) {
            if let Segment::Placeholder(name) = segment {
                if !input_variables.iter().any(|v| v == name) {
                    return Err(RoastError::configuration(format!(
                        "prompt template uses undeclared placeholder '{{{}}}'",
                        name
                    )));
                }
            }
        }
        let placeholders: Vec<&str> = parse(&template)
            .into_iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name),
                Segment::Literal(_) => None,
            })
            .collect();
        if let Some(unused) = input_variables
            .iter()
            .find(|v| !placeholders.contains(&v.as_str()))
        {
            return Err(RoastError::configuration(format!(
                "prompt template never uses declared variable '{}'",
                unused
            )));
        }

        Ok(Self {
            template,
            input_variables,
        })
    }

    /// The built-in roast instruction.
    pub fn roast() -> Result<Self> {
        Self::new(ROAST_TEMPLATE, &[TARGET_NAME_VAR, RELATION_VAR])
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Substitutes every placeholder. All declared variables must be given.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        for segment in parse(&self.template) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .iter()
                        .find(|(key, _)| *key == name)
                        .map(|(_, value)| *value)
                        .ok_or_else(|| {
                            RoastError::configuration(format!(
                                "no value supplied for prompt placeholder '{{{}}}'",
                                name
                            ))
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Renders the template for a bound target.
    pub fn render_for(&self, target: &TargetBinding) -> Result<String> {
        self.render(&[
            (TARGET_NAME_VAR, target.name()),
            (RELATION_VAR, target.relation()),
        ])
    }
}

fn parse(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if is_identifier(&after[..close]) => {
                if open > 0 {
                    segments.push(Segment::Literal(&rest[..open]));
                }
                segments.push(Segment::Placeholder(&after[..close]));
                rest = &after[close + 1..];
            }
            _ => {
                segments.push(Segment::Literal(&rest[..=open]));
                rest = after;
            }
        }
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    segments
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
