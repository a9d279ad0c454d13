//! `{placeholder}` substitution for goals, descriptions and search queries
//!
//! Rules:
//! - `{name}` where `name` is ASCII alphanumeric/underscore and present in the
//!   variables is replaced by its value
//! - Unknown placeholders, stray braces and anything else pass through verbatim
//! - Substituted values are inserted literally and never rescanned

/// Name of the placeholder every run provides
pub const OBJECTIVE: &str = "objective";

/// `{objective}`, ready to use as a template
pub const OBJECTIVE_PLACEHOLDER: &str = "{objective}";

/// Ordered set of named template values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    vars: Vec<(String, String)>,
}

impl TemplateVars {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding only the run objective
    pub fn for_objective(objective: impl Into<String>) -> Self {
        let mut vars = Self::new();
        vars.insert(OBJECTIVE, objective);
        vars
    }

    /// Insert or replace a value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.vars.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.vars.push((name, value)),
        }
    }

    /// Builder form of [`TemplateVars::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The run objective, if set
    pub fn objective(&self) -> Option<&str> {
        self.get(OBJECTIVE)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Substitute known `{name}` placeholders in a single pass
pub fn render(template: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        match after_open.find('}') {
            Some(close) => {
                let name = &after_open[..close];
                match vars.get(name).filter(|_| is_placeholder_name(name)) {
                    Some(value) => {
                        out.push_str(value);
                        rest = &after_open[close + 1..];
                    }
                    None => {
                        // Keep the brace and continue scanning after it so a
                        // nested `{{objective}` still finds the inner placeholder
                        out.push('{');
                        rest = after_open;
                    }
                }
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Placeholder names used in a template that `vars` does not define
pub fn unknown_placeholders<'a>(template: &'a str, vars: &TemplateVars) -> Vec<&'a str> {
    let mut unknown = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('}') else {
            break;
        };
        let name = &after_open[..close];
        if is_placeholder_name(name) && vars.get(name).is_none() && !unknown.contains(&name) {
            unknown.push(name);
        }
        rest = after_open;
    }

    unknown
}
