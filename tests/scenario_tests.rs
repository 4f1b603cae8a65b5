//! The built-in suites end to end against an in-process backend.

mod common;

use common::env_for;
use gql_harness::assertions::{confirm_code, confirm_error, confirm_success, SUCCESS_CODE};
use gql_harness::suite::CaseStatus;
use gql_harness::suites::{builtin_suites, company, payment_method, payout_settings};
use gql_harness::test_utils::fake_server::FakeGraphQlServer;
use gql_harness::test_utils::fixtures::FakeBackend;
use gql_harness::{InputObject, Operation, SuiteRunner, Transport};
use serde_json::json;

const ROUND_TRIP_CASE: &str = "upsertCompany round trip returns what was sent";

#[test]
fn test_builtin_suites_pass_when_errors_come_back_with_200() {
    let backend = FakeBackend::new();
    let server = backend.clone().serve();
    let summary = SuiteRunner::new(env_for(&server)).run_all(&builtin_suites());

    for report in &summary.suites {
        assert!(report.is_success(), "{:#?}", report);
        for case in &report.cases {
            assert!(case.teardown_errors.is_empty(), "{:#?}", case);
        }
    }
    // Every company a test created was deleted again
    assert!(backend.companies().is_empty(), "{:?}", backend.companies());
}

#[test]
fn test_builtin_suites_pass_when_errors_come_back_with_400() {
    let backend = FakeBackend::new().with_validation_status(400);
    let server = backend.clone().serve();
    let env = env_for(&server).expect_http_200(false);
    let summary = SuiteRunner::new(env).run_all(&builtin_suites());

    assert!(summary.is_success(), "{:#?}", summary);
    assert!(backend.companies().is_empty());
}

#[test]
fn test_wrong_status_contract_fails_validation_cases_only() {
    let server = FakeBackend::new().with_validation_status(400).serve();
    let report = payment_method::suite().run(&env_for(&server));

    let failed: Vec<_> = report
        .cases
        .iter()
        .filter(|c| c.status == CaseStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 3);
    for case in failed {
        let message = case.message.as_deref().unwrap();
        assert!(message.contains("expected a 2xx status, got 400"), "{message}");
        assert!(message.contains("mutation { deletePaymentMethod"), "{message}");
    }
    assert!(report
        .case("deletePaymentMethod rejects an unknown id")
        .unwrap()
        .passed());
}

#[test]
fn test_found_fixture_is_not_deleted() {
    let backend = FakeBackend::new();
    let server = backend.clone().serve();
    // The first fixture name this environment will ask for
    let shared = backend.seed_company("Harness Fixture Company itest-1");

    let suite = gql_harness::Suite::new("shared fixture")
        .entity_fixture(company::company_spec(), "Harness Fixture Company")
        .case("uses the existing company", move |ctx| {
            assert_eq!(ctx.fixture_id()?, shared);
            Ok(())
        });
    let report = suite.run(&env_for(&server));

    assert!(report.is_success(), "{:#?}", report);
    assert_eq!(backend.companies().len(), 1);
}

#[test]
fn test_zero_argument_mutation_is_rejected() {
    let server = FakeBackend::new().serve();
    let env = env_for(&server);
    let transport = env.transport.clone();

    let operation = Operation::mutation("upsertCompany").select("company.id");
    let response = transport.send(&env.template.with_operation(&operation)).unwrap();

    confirm_error(&response, "upsertCompany", true).unwrap();
    let failure = confirm_error(&response, "upsertCompany", false).unwrap_err();
    assert_eq!(failure.query, operation.render());
}

#[test]
fn test_company_round_trip() {
    let backend = FakeBackend::new();
    let server = backend.clone().serve();
    let env = env_for(&server);

    let operation = Operation::mutation("upsertCompany")
        .arg(
            "input",
            InputObject::new()
                .field("name1", "Cypress Test Company")
                .field("integrationKey", "cypressTest1"),
        )
        .select_all(["company.id", "company.name1", "company.integrationKey"]);
    let response = env.transport.send(&env.template.with_operation(&operation)).unwrap();

    confirm_success(
        &response,
        "upsertCompany",
        &["company.id", "company.name1", "company.integrationKey"],
    )
    .unwrap();
    let stored = backend.companies().remove(0);
    assert_eq!(stored.name1, "Cypress Test Company");
    assert_eq!(stored.integration_key.as_deref(), Some("cypressTest1"));
}

#[test]
fn test_payout_settings_with_empty_token() {
    let server = FakeBackend::new().serve();
    let env = env_for(&server);
    let operation = Operation::mutation("upsertPayoutSettings")
        .arg("input", InputObject::new().field("token", ""))
        .select_all(["code", "error"]);
    let response = env.transport.send(&env.template.with_operation(&operation)).unwrap();

    confirm_code(&response, "upsertPayoutSettings", SUCCESS_CODE).unwrap();
    assert!(response.field("upsertPayoutSettings").unwrap()["error"].is_null());
}

#[test]
fn test_payout_settings_sends_configured_provider_account() {
    let server = FakeBackend::new().serve();
    let env = env_for(&server).feature_id(payout_settings::PROVIDER_ACCOUNT_KEY, "acct-9");
    let report = payout_settings::suite().run(&env);
    assert!(report.is_success(), "{:#?}", report);

    let query = server
        .queries()
        .into_iter()
        .find(|q| q.contains("token: \"\""))
        .unwrap();
    assert!(query.contains("paymentProviderAccountId: \"acct-9\""), "{query}");
}

#[test]
fn test_deleting_missing_payment_method() {
    let server = FakeBackend::new().serve();
    let env = env_for(&server);
    let operation = Operation::mutation("deletePaymentMethod")
        .arg("input", InputObject::new().field("id", "does-not-exist"))
        .select_all(["code", "error"]);
    let response = env.transport.send(&env.template.with_operation(&operation)).unwrap();

    assert!(response.ok_status_code());
    assert!(response.has_errors());
    assert!(response.data().is_none());
    confirm_error(&response, "deletePaymentMethod", true).unwrap();
}

#[test]
fn test_company_suite_sends_unique_fixture_names() {
    let server = FakeBackend::new().serve();
    company::suite().run(&env_for(&server));

    let mut names: Vec<String> = server
        .queries()
        .iter()
        .filter(|q| q.starts_with("query { companies("))
        .cloned()
        .collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert!(total > 1);
    assert_eq!(names.len(), total);
}

#[test]
fn test_round_trip_keeps_company_that_already_had_the_key() {
    let backend = FakeBackend::new();
    let server = backend.clone().serve();
    let shared = backend.seed_company_with_key("Shared Prod Co", "cypressTest1");

    let report = company::suite().run(&env_for(&server));

    assert!(report.case(ROUND_TRIP_CASE).unwrap().passed(), "{:#?}", report);
    let kept = backend.company(&shared).expect("shared company was deleted");
    assert_eq!(kept.integration_key.as_deref(), Some("cypressTest1"));
    assert_eq!(backend.companies().len(), 1);
    let delete = format!("deleteCompany(input: {{id: \"{shared}\"}})");
    assert!(!server.queries().iter().any(|q| q.contains(&delete)));
}

#[test]
fn test_round_trip_deletes_company_when_payload_is_incomplete() {
    let backend = FakeBackend::new();
    let inner = backend.clone();
    let server = FakeGraphQlServer::json(move |request| {
        let query = request.query();
        if query.starts_with("mutation { upsertCompany") && query.contains("cypressTest1") {
            return (
                200,
                json!({"data": {"upsertCompany": {"company": {
                    "id": "c-77",
                    "name1": "Cypress Test Company",
                    "integrationKey": null
                }}}}),
            );
        }
        inner.handle(request)
    });

    let report = company::suite().run(&env_for(&server));

    let case = report.case(ROUND_TRIP_CASE).unwrap();
    assert_eq!(case.status, CaseStatus::Failed);
    assert!(case.message.as_deref().unwrap().contains("integrationKey"), "{case:#?}");
    assert!(server
        .queries()
        .iter()
        .any(|q| q.starts_with("mutation { deleteCompany(input: {id: \"c-77\"})")));
}
