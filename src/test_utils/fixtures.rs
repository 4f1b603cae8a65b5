//! A stateful fake of the API under test, served by [`FakeGraphQlServer`].
//!
//! It understands just enough of the query text the harness renders to keep
//! companies in memory and answer the built-in suites.

use super::fake_server::{FakeGraphQlServer, RecordedRequest};
use serde_json::{json, Deserializer, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeCompany {
    pub id: String,
    pub name1: String,
    pub integration_key: Option<String>,
}

impl FakeCompany {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name1": self.name1,
            "integrationKey": self.integration_key,
        })
    }
}

#[derive(Debug, Default)]
struct State {
    companies: BTreeMap<String, FakeCompany>,
    next_id: u64,
}

/// In-memory backend. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
    validation_status: u16,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// Validation errors are answered with HTTP 200
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            validation_status: 200,
        }
    }

    /// Validation errors are answered with `status` instead of 200
    pub fn with_validation_status(mut self, status: u16) -> Self {
        self.validation_status = status;
        self
    }

    pub fn serve(self) -> FakeGraphQlServer {
        FakeGraphQlServer::json(move |request| self.handle(request))
    }

    pub fn seed_company(&self, name1: &str) -> String {
        let mut state = self.state.lock().expect("backend state poisoned");
        insert_company(&mut state, name1.to_string(), None)
    }

    pub fn seed_company_with_key(&self, name1: &str, integration_key: &str) -> String {
        let mut state = self.state.lock().expect("backend state poisoned");
        insert_company(&mut state, name1.to_string(), Some(integration_key.to_string()))
    }

    pub fn companies(&self) -> Vec<FakeCompany> {
        let state = self.state.lock().expect("backend state poisoned");
        state.companies.values().cloned().collect()
    }

    pub fn company(&self, id: &str) -> Option<FakeCompany> {
        let state = self.state.lock().expect("backend state poisoned");
        state.companies.get(id).cloned()
    }

    pub fn handle(&self, request: &RecordedRequest) -> (u16, Value) {
        if request.header("x-tenant-id").is_none() && request.header("authorization").is_none() {
            return (401, errors("Not authenticated"));
        }

        let query = request.query();
        let Some(field) = root_field(&query) else {
            return (400, errors("Syntax error: no operation"));
        };
        let args = root_arguments(&query);
        let is_mutation = query.trim_start().starts_with("mutation");

        if is_mutation {
            if let Some(reason) = validation_problem(args) {
                return (self.validation_status, errors(&reason));
            }
        }

        let mut state = self.state.lock().expect("backend state poisoned");
        match field.as_str() {
            "__typename" => (200, json!({"data": {"__typename": "Query"}})),
            "companies" => {
                let search = args.and_then(|a| string_arg(a, "search")).unwrap_or_default();
                let matches: Vec<Value> = state
                    .companies
                    .values()
                    .filter(|c| {
                        c.name1.contains(&search)
                            || c.integration_key.as_deref().is_some_and(|k| k.contains(&search))
                    })
                    .map(FakeCompany::to_json)
                    .collect();
                (200, json!({"data": {"companies": matches}}))
            }
            "company" => {
                let id = args.and_then(|a| string_arg(a, "id")).unwrap_or_default();
                match state.companies.get(&id) {
                    Some(company) => (200, json!({"data": {"company": company.to_json()}})),
                    None => (
                        200,
                        json!({"data": {"company": null}, "errors": [{"message": "Company not found", "path": ["company"]}]}),
                    ),
                }
            }
            "upsertCompany" => upsert_company(&mut state, args.unwrap_or_default()),
            "deleteCompany" => {
                let id = args.and_then(|a| string_arg(a, "id")).unwrap_or_default();
                let result = if state.companies.remove(&id).is_some() {
                    json!({"code": "SUCCESS", "error": null})
                } else {
                    json!({"code": "NOT_FOUND", "error": "Company not found"})
                };
                (200, json!({"data": {"deleteCompany": result}}))
            }
            "upsertPayoutSettings" => (
                200,
                json!({"data": {"upsertPayoutSettings": {"code": "SUCCESS", "error": null}}}),
            ),
            "deletePaymentMethod" => (
                200,
                json!({"data": null, "errors": [{"message": "Payment method not found", "path": ["deletePaymentMethod"]}]}),
            ),
            other => (
                self.validation_status,
                errors(&format!("Cannot query field \"{other}\"")),
            ),
        }
    }
}

fn errors(message: &str) -> Value {
    json!({"errors": [{"message": message}]})
}

fn insert_company(state: &mut State, name1: String, integration_key: Option<String>) -> String {
    state.next_id += 1;
    let id = format!("company-{}", state.next_id);
    state.companies.insert(
        id.clone(),
        FakeCompany {
            id: id.clone(),
            name1,
            integration_key,
        },
    );
    id
}

fn upsert_company(state: &mut State, args: &str) -> (u16, Value) {
    let name1 = string_arg(args, "name1");
    let integration_key = string_arg(args, "integrationKey");

    let existing = match string_arg(args, "id") {
        Some(id) if state.companies.contains_key(&id) => Some(id),
        Some(_) => {
            return (
                200,
                json!({"data": {"upsertCompany": null}, "errors": [{"message": "Company not found"}]}),
            )
        }
        None => integration_key.as_ref().and_then(|key| {
            state
                .companies
                .values()
                .find(|c| c.integration_key.as_ref() == Some(key))
                .map(|c| c.id.clone())
        }),
    };

    let id = match existing {
        Some(id) => {
            if let Some(company) = state.companies.get_mut(&id) {
                if let Some(name1) = name1 {
                    company.name1 = name1;
                }
                if integration_key.is_some() {
                    company.integration_key = integration_key;
                }
            }
            id
        }
        None => {
            let Some(name1) = name1 else {
                return (
                    200,
                    json!({"data": {"upsertCompany": null}, "errors": [{"message": "name1 is required"}]}),
                );
            };
            insert_company(state, name1, integration_key)
        }
    };

    let company = state.companies.get(&id).map(FakeCompany::to_json);
    (
        200,
        json!({"data": {"upsertCompany": {"code": "SUCCESS", "error": null, "company": company}}}),
    )
}

fn validation_problem(args: Option<&str>) -> Option<String> {
    let Some(args) = args else {
        return Some("Field argument \"input\" is required".to_string());
    };
    let bare = strip_strings(args);
    let compact: String = bare.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.contains(":{}") {
        return Some("Input must not be empty".to_string());
    }
    if compact.contains(":true") || compact.contains(":false") {
        return Some("Expected type String, found a Boolean".to_string());
    }
    None
}

/// Name of the first field under the operation's root selection set
pub fn root_field(query: &str) -> Option<String> {
    let start = query.find('{')? + 1;
    let name: String = query[start..]
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!name.is_empty()).then_some(name)
}

/// Text between the root field's parentheses, if it has any
pub fn root_arguments(query: &str) -> Option<&str> {
    let field = root_field(query)?;
    let after_brace = query.find('{')? + 1;
    let field_at = after_brace + query[after_brace..].find(&field)? + field.len();
    let rest = &query[field_at..];
    let open = rest.len() - rest.trim_start().len();
    if !rest[open..].starts_with('(') {
        return None;
    }

    let body = &rest[open + 1..];
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '{' | '[' => depth += 1,
            ')' if depth == 0 => return Some(&body[..i]),
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// First string literal passed as `name: "..."` anywhere in `args`
pub fn string_arg(args: &str, name: &str) -> Option<String> {
    let needle = format!("{name}:");
    let mut from = 0;
    while let Some(pos) = args[from..].find(&needle) {
        let at = from + pos;
        from = at + needle.len();
        let boundary = args[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        if !boundary {
            continue;
        }
        let value = args[from..].trim_start();
        if value.starts_with('"') {
            return Deserializer::from_str(value)
                .into_iter::<String>()
                .next()
                .and_then(|parsed| parsed.ok());
        }
    }
    None
}

fn strip_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => {
                    in_string = false;
                    out.push('"');
                }
                _ => {}
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }
    out
}
