//! `upsertCompany` / `deleteCompany`: validation, round trip, update of a
//! fixture company, and delete followed by a not-found lookup.

use crate::assertions::{confirm_field_eq, confirm_success};
use crate::error::{ErrorBuilder, Result};
use crate::lifecycle::{EntityReference, EntitySpec};
use crate::poll::{wait_until, CancelToken, PollConfig, PollOutcome};
use crate::query::{InputObject, Operation};
use crate::suite::{nominal_cases, validation_cases, NominalTarget, Suite, TestContext, ValidationTarget};
use serde_json::json;
use std::time::Duration;

pub const NAME: &str = "company";

const ROUND_TRIP_NAME: &str = "Cypress Test Company";
const ROUND_TRIP_KEY: &str = "cypressTest1";
const FULL_SELECTION: [&str; 3] = ["company.id", "company.name1", "company.integrationKey"];

pub fn company_spec() -> EntitySpec {
    EntitySpec::new("company", "companies", "upsertCompany")
        .name_field("name1")
        .alt_info_field("company")
        .delete_mutation("deleteCompany")
        .lookup_field("company")
}

pub fn suite() -> Suite {
    let spec = company_spec();
    let nominal = NominalTarget::mutation("upsertCompany", |ctx| {
        let name = ctx.names().next("Harness Company");
        let key = name.to_lowercase().replace(' ', "-");
        Ok(InputObject::new().field("name1", name).field("integrationKey", key))
    })
    .minimal(["company.id"])
    .full(FULL_SELECTION)
    .track(spec.clone());

    Suite::new(NAME)
        .describe("Company upsert, update and delete")
        .entity_fixture(spec, "Harness Fixture Company")
        .cases(validation_cases(
            &ValidationTarget::mutation("upsertCompany", "name1").select(["company.id"]),
        ))
        .cases(nominal_cases(&nominal))
        .case("upsertCompany round trip returns what was sent", round_trip)
        .case("upsertCompany updates the fixture company", update_fixture)
        .case("deleteCompany removes the company", delete_then_lookup)
}

/// `upsertCompany` matches on `integrationKey`, so the fixed key may land on
/// a company that already exists. That company is updated but never deleted.
fn round_trip(ctx: &mut TestContext) -> Result<()> {
    let spec = company_spec();
    let existing = ctx.lifecycle(&spec).search_by("integrationKey", ROUND_TRIP_KEY)?;
    let operation = Operation::mutation("upsertCompany")
        .arg(
            "input",
            InputObject::new()
                .field("name1", ROUND_TRIP_NAME)
                .field("integrationKey", ROUND_TRIP_KEY),
        )
        .select_all(FULL_SELECTION);
    let response = ctx.send(&operation)?;

    let upserted = ctx.lifecycle(&spec).payload_id(&response, "upsertCompany");
    if let Some(id) = upserted {
        let reference = if existing.as_deref() == Some(id.as_str()) {
            EntityReference::found(id, ROUND_TRIP_NAME)
        } else {
            EntityReference::created(id, ROUND_TRIP_NAME)
        };
        ctx.track(spec, reference);
    }

    confirm_success(&response, "upsertCompany", &FULL_SELECTION)?;
    confirm_field_eq(&response, "upsertCompany", "company.name1", &json!(ROUND_TRIP_NAME))?;
    confirm_field_eq(&response, "upsertCompany", "company.integrationKey", &json!(ROUND_TRIP_KEY))?;
    Ok(())
}

fn update_fixture(ctx: &mut TestContext) -> Result<()> {
    let spec = company_spec();
    let id = ctx.fixture_id()?;
    let key = format!("harness-{}", ctx.names().run_tag());
    let response = ctx.lifecycle(&spec).update(
        &id,
        &InputObject::new().field("integrationKey", key.as_str()),
        &["company.id", "company.integrationKey"],
    )?;
    confirm_field_eq(&response, "upsertCompany", "company.id", &json!(id))?;
    confirm_field_eq(&response, "upsertCompany", "company.integrationKey", &json!(key))?;
    Ok(())
}

fn delete_then_lookup(ctx: &mut TestContext) -> Result<()> {
    let spec = company_spec();
    let id = ctx.fixture_id()?;
    ctx.delete_fixture()?;

    let lifecycle = ctx.lifecycle(&spec);
    let outcome = wait_until(
        &PollConfig::with_timeout(Duration::from_secs(10)),
        &CancelToken::new(),
        || Ok(lifecycle.find_by_id(&id)?.is_none().then_some(())),
    )?;
    match outcome {
        PollOutcome::Ready(()) => Ok(()),
        PollOutcome::TimedOut { attempts, .. } => Err(ErrorBuilder::assertion("company")
            .reason(format!("company {id} still found after {attempts} lookups"))
            .into_error()),
        PollOutcome::Cancelled { .. } => Err(ErrorBuilder::assertion("company")
            .reason("lookup cancelled")
            .into_error()),
    }
}
