//! Fixture entity helpers: search-or-create, generic create/update/delete
//! and delete-with-confirmation.

use crate::assertions::{confirm_code, success_payload, SUCCESS_CODE};
use crate::client::{Request, Transport};
use crate::error::{ErrorBuilder, HarnessError, Result};
use crate::graphql::{lookup_path, value_as_id, Response};
use crate::logging::log_entity_lifecycle;
use crate::query::{InputObject, Operation};
use serde_json::Value;

pub mod entity;
pub mod names;

pub use entity::{EntityReference, EntitySpec, EntityState};
pub use names::NameGenerator;

/// Fields selected on delete results
pub const DELETE_RESULT_FIELDS: [&str; 2] = ["code", "error"];

/// Sends a delete mutation and requires the success sentinel with no
/// populated `error`. Failures are returned to the caller; nothing is retried.
pub fn post_and_confirm_delete(
    transport: &dyn Transport,
    template: &Request,
    mutation_text: &str,
    mutation_name: &str,
) -> Result<()> {
    let response = transport.send(&template.with_body(mutation_text))?;
    confirm_code(&response, mutation_name, SUCCESS_CODE)?;
    Ok(())
}

/// Lifecycle operations for one kind of entity against one endpoint.
pub struct EntityLifecycle<'a> {
    transport: &'a dyn Transport,
    template: &'a Request,
    spec: &'a EntitySpec,
}

impl<'a> EntityLifecycle<'a> {
    pub fn new(transport: &'a dyn Transport, template: &'a Request, spec: &'a EntitySpec) -> Self {
        Self {
            transport,
            template,
            spec,
        }
    }

    pub fn spec(&self) -> &EntitySpec {
        self.spec
    }

    fn send(&self, operation: &Operation) -> Result<Response> {
        self.transport.send(&self.template.with_operation(operation))
    }

    fn list_item_path(&self, field: &str) -> String {
        match &self.spec.list_path {
            Some(list) => format!("{list}.{field}"),
            None => field.to_string(),
        }
    }

    pub fn search_operation(&self, name: &str) -> Operation {
        self.search_by_operation(&self.spec.name_field, name)
    }

    fn search_by_operation(&self, field: &str, value: &str) -> Operation {
        let mut operation = Operation::query(&self.spec.query_field)
            .arg(&self.spec.search_argument, value)
            .select(&self.list_item_path(&self.spec.id_field))
            .select(&self.list_item_path(&self.spec.name_field));
        if field != self.spec.name_field {
            operation = operation.select(&self.list_item_path(field));
        }
        operation
    }

    /// Id of the first entity, in server order, whose name equals `name`
    pub fn search(&self, name: &str) -> Result<Option<String>> {
        self.search_by(&self.spec.name_field, name)
    }

    /// Id of the first entity, in server order, whose `field` equals `value`.
    /// The value doubles as the search term.
    pub fn search_by(&self, field: &str, value: &str) -> Result<Option<String>> {
        let operation = self.search_by_operation(field, value);
        let response = self.send(&operation)?;
        if !response.ok_status_code() || response.has_errors() {
            return Err(ErrorBuilder::setup(&self.spec.entity)
                .message(format!(
                    "search failed with HTTP {}: {}",
                    response.http_status(),
                    response.first_error_message().unwrap_or("no error message")
                ))
                .query(response.query())
                .build());
        }

        let result = response.field(&self.spec.query_field);
        let list = match (&self.spec.list_path, result) {
            (Some(path), Some(result)) => lookup_path(result, path),
            (None, result) => result,
            (Some(_), None) => None,
        };
        let Some(items) = list.and_then(Value::as_array) else {
            return Ok(None);
        };

        Ok(items
            .iter()
            .filter(|item| item.get(field).and_then(Value::as_str) == Some(value))
            .find_map(|item| item.get(&self.spec.id_field).and_then(value_as_id)))
    }

    /// Returns the existing entity named `name`, creating it when the search
    /// comes back empty. Any failure is fatal for the test's setup.
    pub fn search_or_create(&self, name: &str) -> Result<EntityReference> {
        if let Some(id) = self.search(name)? {
            log_entity_lifecycle(&self.spec.entity, &id, "found");
            return Ok(EntityReference::found(id, name));
        }
        self.create(name, &InputObject::new())
    }

    pub fn creation_operation(&self, name: &str, extra: &InputObject) -> Operation {
        let input = InputObject::new()
            .field(&self.spec.name_field, name)
            .merge(&self.spec.extra_input)
            .merge(extra);
        Operation::mutation(&self.spec.creation_mutation)
            .arg("input", input)
            .select(&self.spec.payload_path(&self.spec.id_field))
            .select(&self.spec.payload_path(&self.spec.name_field))
    }

    pub fn create(&self, name: &str, extra: &InputObject) -> Result<EntityReference> {
        let operation = self.creation_operation(name, extra);
        let response = self.send(&operation)?;
        let id = self.extract_id(&response).map_err(|reason| {
            ErrorBuilder::setup(&self.spec.entity)
                .message(reason)
                .query(response.query())
                .build()
        })?;
        log_entity_lifecycle(&self.spec.entity, &id, "created");
        Ok(EntityReference::created(id, name))
    }

    /// Reads the new entity's id out of a creation or upsert response
    pub fn extract_id(&self, response: &Response) -> std::result::Result<String, String> {
        let id_path = self.spec.payload_path(&self.spec.id_field);
        let payload = success_payload(response, &self.spec.creation_mutation, &[id_path.as_str()])
            .map_err(|failure| failure.to_string())?;
        lookup_path(payload, &id_path)
            .and_then(value_as_id)
            .ok_or_else(|| format!("{id_path} is not an id"))
    }

    /// The id under `data[mutation]`, whatever else the response carries.
    /// A server may have created the entity even when the rest of the
    /// payload fails its assertions.
    pub fn payload_id(&self, response: &Response, mutation: &str) -> Option<String> {
        let id_path = self.spec.payload_path(&self.spec.id_field);
        response
            .field(mutation)
            .and_then(|payload| lookup_path(payload, &id_path))
            .and_then(value_as_id)
    }

    /// Sends `changes` for the entity `id` through the update mutation (or
    /// the creation mutation when the API upserts). The caller judges the
    /// response.
    pub fn update(&self, id: &str, changes: &InputObject, selection: &[&str]) -> Result<Response> {
        let mutation = self
            .spec
            .update_mutation
            .as_deref()
            .unwrap_or(&self.spec.creation_mutation);
        let input = InputObject::new().field(&self.spec.id_field, id).merge(changes);
        let operation = Operation::mutation(mutation)
            .arg("input", input)
            .select_all(selection);
        self.send(&operation)
    }

    pub fn delete_operation(&self, id: &str) -> Result<Operation> {
        let mutation = self.spec.delete_mutation.as_deref().ok_or_else(|| {
            HarnessError::lifecycle(&self.spec.entity, "no delete mutation configured")
        })?;
        Ok(Operation::mutation(mutation)
            .arg("input", InputObject::new().field(&self.spec.id_field, id))
            .select_all(DELETE_RESULT_FIELDS))
    }

    /// Deletes an entity this run created and clears its reference
    pub fn delete(&self, entity: &mut EntityReference) -> Result<()> {
        if !entity.needs_teardown() {
            return Err(HarnessError::lifecycle(
                &self.spec.entity,
                format!("{} was not created by this run", entity.display_name()),
            ));
        }
        let operation = self.delete_operation(entity.id())?;
        let id = entity.id().to_string();
        post_and_confirm_delete(
            self.transport,
            self.template,
            &operation.render(),
            operation.field_name(),
        )?;
        entity.mark_deleted()?;
        log_entity_lifecycle(&self.spec.entity, &id, "deleted");
        Ok(())
    }

    /// Teardown for one entity. Found entities are left alone. A failed
    /// delete is logged and handed back for reporting, never raised.
    pub fn teardown(&self, entity: &mut EntityReference) -> Option<HarnessError> {
        if !entity.needs_teardown() {
            if entity.state() != EntityState::Deleted && !entity.id().is_empty() {
                log_entity_lifecycle(&self.spec.entity, entity.id(), "kept");
            }
            return None;
        }
        match self.delete(entity) {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    entity = self.spec.entity.as_str(),
                    id = entity.id(),
                    error = %err,
                    "Teardown delete failed"
                );
                Some(HarnessError::teardown(
                    format!("{} {}", self.spec.entity, entity.display_name()),
                    err.to_string(),
                ))
            }
        }
    }

    /// The entity as the lookup query returns it, or `None` when the server
    /// reports it missing.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Value>> {
        let lookup = self.spec.lookup_field.as_deref().ok_or_else(|| {
            HarnessError::lifecycle(&self.spec.entity, "no lookup query configured")
        })?;
        let operation = Operation::query(lookup)
            .arg(&self.spec.id_field, id)
            .select(&self.spec.id_field);
        let response = self.send(&operation)?;
        if !response.ok_status_code() {
            return Err(ErrorBuilder::assertion(lookup)
                .reason(format!("lookup failed with HTTP {}", response.http_status()))
                .response(&response)
                .into_error());
        }
        Ok(response.field(lookup).cloned())
    }
}
