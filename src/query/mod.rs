//! Typed construction of GraphQL operation text.
//!
//! Arguments are held as [`InputValue`]s and rendered with proper escaping,
//! so generated names or ids can never break out of a string literal.

use std::fmt;

#[cfg(test)]
mod builder_proptest;

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    List(Vec<InputValue>),
    Object(InputObject),
}

impl InputValue {
    pub fn enum_value(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("null"),
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Int(i) => out.push_str(&i.to_string()),
            Self::Float(f) => out.push_str(&render_float(*f)),
            Self::String(s) => out.push_str(&escape_string(s)),
            Self::Enum(e) => out.push_str(e),
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.render(out);
                }
                out.push(']');
            }
            Self::Object(object) => object.render(out),
        }
    }
}

fn render_float(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    let text = value.to_string();
    if text.contains('.') || text.contains('e') {
        text
    } else {
        format!("{text}.0")
    }
}

/// GraphQL string literals accept the JSON escape set, so JSON encoding
/// yields a valid literal for any input.
pub fn escape_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for InputValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for InputValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<InputObject> for InputValue {
    fn from(value: InputObject) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<InputValue>> for InputValue {
    fn from(value: Vec<InputValue>) -> Self {
        Self::List(value)
    }
}

/// An input object literal. Field order is preserved as inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputObject {
    fields: Vec<(String, InputValue)>,
}

impl InputObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any earlier value under the same name
    pub fn field(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<InputValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Fields of `other` win over fields already present
    pub fn merge(mut self, other: &InputObject) -> Self {
        for (name, value) in &other.fields {
            self.set(name.clone(), value.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    fn render(&self, out: &mut String) {
        out.push('{');
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push_str(": ");
            value.render(out);
        }
        out.push('}');
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    name: String,
    arguments: Vec<(String, InputValue)>,
    children: Vec<Selection>,
}

impl Selection {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    pub fn with(mut self, child: Selection) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.name);
        render_arguments(&self.arguments, out);
        render_selection_set(&self.children, out);
    }
}

/// Inserts a dotted path (`company.id`) into a selection list, merging with
/// fields already selected.
fn insert_path(selections: &mut Vec<Selection>, path: &str) {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let Some(head) = segments.next() else {
        return;
    };
    let rest: Vec<&str> = segments.collect();

    let index = match selections.iter().position(|s| s.name == head) {
        Some(index) => index,
        None => {
            selections.push(Selection::field(head));
            selections.len() - 1
        }
    };
    if !rest.is_empty() {
        insert_path(&mut selections[index].children, &rest.join("."));
    }
}

fn render_arguments(arguments: &[(String, InputValue)], out: &mut String) {
    if arguments.is_empty() {
        return;
    }
    out.push('(');
    for (i, (name, value)) in arguments.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(name);
        out.push_str(": ");
        value.render(out);
    }
    out.push(')');
}

fn render_selection_set(selections: &[Selection], out: &mut String) {
    if selections.is_empty() {
        return;
    }
    out.push_str(" {");
    for selection in selections {
        out.push(' ');
        selection.render(out);
    }
    out.push_str(" }");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

/// A single root-field operation, e.g.
/// `mutation { upsertCompany(input: {name1: "x"}) { company { id } } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    kind: OperationKind,
    field: String,
    arguments: Vec<(String, InputValue)>,
    selection: Vec<Selection>,
}

impl Operation {
    pub fn new(kind: OperationKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            arguments: Vec::new(),
            selection: Vec::new(),
        }
    }

    pub fn query(field: impl Into<String>) -> Self {
        Self::new(OperationKind::Query, field)
    }

    pub fn mutation(field: impl Into<String>) -> Self {
        Self::new(OperationKind::Mutation, field)
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.arguments.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.arguments.push((name, value)),
        }
        self
    }

    /// Selects a dotted field path
    pub fn select(mut self, path: &str) -> Self {
        insert_path(&mut self.selection, path);
        self
    }

    pub fn select_all<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            insert_path(&mut self.selection, path.as_ref());
        }
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection.push(selection);
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn field_name(&self) -> &str {
        &self.field
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push_str(self.kind.keyword());
        out.push_str(" { ");
        out.push_str(&self.field);
        render_arguments(&self.arguments, &mut out);
        render_selection_set(&self.selection, &mut out);
        out.push_str(" }");
        out
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
