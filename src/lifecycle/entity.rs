use crate::error::{HarnessError, Result};
use crate::query::InputObject;

/// Where a fixture entity is in its life within one test.
///
/// `Absent -> {Found | Created} -> UnderTest -> Deleted`; only created
/// entities may reach `Deleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Absent,
    Found,
    Created,
    UnderTest,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    id: String,
    display_name: String,
    created_by_this_run: bool,
    state: EntityState,
}

impl EntityReference {
    pub fn absent(display_name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            display_name: display_name.into(),
            created_by_this_run: false,
            state: EntityState::Absent,
        }
    }

    pub fn found(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            created_by_this_run: false,
            state: EntityState::Found,
        }
    }

    pub fn created(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            created_by_this_run: true,
            state: EntityState::Created,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_by_this_run(&self) -> bool {
        self.created_by_this_run
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Found entities are shared fixture data and are never deleted
    pub fn needs_teardown(&self) -> bool {
        self.created_by_this_run && !self.id.is_empty()
    }

    pub fn mark_under_test(&mut self) -> Result<()> {
        match self.state {
            EntityState::Found | EntityState::Created => {
                self.state = EntityState::UnderTest;
                Ok(())
            }
            EntityState::UnderTest => Ok(()),
            other => Err(HarnessError::lifecycle(
                &self.display_name,
                format!("cannot put an entity under test from {other:?}"),
            )),
        }
    }

    /// Records a successful delete and clears the id so a second teardown
    /// is a no-op.
    pub fn mark_deleted(&mut self) -> Result<()> {
        if !self.created_by_this_run {
            return Err(HarnessError::lifecycle(
                &self.display_name,
                "refusing to delete an entity this run did not create",
            ));
        }
        match self.state {
            EntityState::Created | EntityState::UnderTest => {
                self.id.clear();
                self.state = EntityState::Deleted;
                Ok(())
            }
            other => Err(HarnessError::lifecycle(
                &self.display_name,
                format!("cannot delete from {other:?}"),
            )),
        }
    }
}

/// How one kind of fixture entity is searched for, created, updated and
/// deleted on the API under test.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub entity: String,
    /// List query searched by name, e.g. `companies`
    pub query_field: String,
    pub search_argument: String,
    /// Path from the query result to the list of matches, if nested
    pub list_path: Option<String>,
    /// Single-entity query by id, used to confirm deletion
    pub lookup_field: Option<String>,
    pub creation_mutation: String,
    pub update_mutation: Option<String>,
    pub delete_mutation: Option<String>,
    pub name_field: String,
    pub id_field: String,
    /// Sub-object of the mutation payload that carries the entity
    pub alt_info_field: Option<String>,
    /// Extra input merged into every creation, e.g. a required type
    pub extra_input: InputObject,
}

impl EntitySpec {
    pub fn new(
        entity: impl Into<String>,
        query_field: impl Into<String>,
        creation_mutation: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            query_field: query_field.into(),
            search_argument: "search".to_string(),
            list_path: None,
            lookup_field: None,
            creation_mutation: creation_mutation.into(),
            update_mutation: None,
            delete_mutation: None,
            name_field: "name".to_string(),
            id_field: "id".to_string(),
            alt_info_field: None,
            extra_input: InputObject::new(),
        }
    }

    pub fn search_argument(mut self, argument: impl Into<String>) -> Self {
        self.search_argument = argument.into();
        self
    }

    pub fn list_path(mut self, path: impl Into<String>) -> Self {
        self.list_path = Some(path.into());
        self
    }

    pub fn lookup_field(mut self, field: impl Into<String>) -> Self {
        self.lookup_field = Some(field.into());
        self
    }

    pub fn update_mutation(mut self, mutation: impl Into<String>) -> Self {
        self.update_mutation = Some(mutation.into());
        self
    }

    pub fn delete_mutation(mut self, mutation: impl Into<String>) -> Self {
        self.delete_mutation = Some(mutation.into());
        self
    }

    pub fn name_field(mut self, field: impl Into<String>) -> Self {
        self.name_field = field.into();
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn alt_info_field(mut self, field: impl Into<String>) -> Self {
        self.alt_info_field = Some(field.into());
        self
    }

    pub fn extra_input(mut self, input: InputObject) -> Self {
        self.extra_input = input;
        self
    }

    /// `company.id` when the payload nests the entity, `id` otherwise
    pub fn payload_path(&self, field: &str) -> String {
        match &self.alt_info_field {
            Some(alt) => format!("{alt}.{field}"),
            None => field.to_string(),
        }
    }
}
