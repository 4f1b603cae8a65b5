//! `upsertPayoutSettings`: validation and the empty-token success path.

use crate::assertions::{confirm_code, SUCCESS_CODE};
use crate::error::{ErrorBuilder, Result};
use crate::query::{InputObject, Operation};
use crate::suite::{validation_cases, Suite, TestContext, ValidationTarget};
use serde_json::Value;

pub const NAME: &str = "payout-settings";

const RESULT_FIELDS: [&str; 2] = ["code", "error"];

/// Feature id sent along when the run is configured with one
pub const PROVIDER_ACCOUNT_KEY: &str = "payment_provider_account_id";

pub fn suite() -> Suite {
    Suite::new(NAME)
        .describe("Payout settings upsert")
        .cases(validation_cases(
            &ValidationTarget::mutation("upsertPayoutSettings", "token").select(RESULT_FIELDS),
        ))
        .case("upsertPayoutSettings accepts an empty token", empty_token)
}

pub fn empty_token_input(ctx: &TestContext) -> InputObject {
    let input = InputObject::new().field("token", "");
    match ctx.feature_id(PROVIDER_ACCOUNT_KEY) {
        Ok(account) => input.field("paymentProviderAccountId", account),
        Err(_) => input,
    }
}

fn empty_token(ctx: &mut TestContext) -> Result<()> {
    let operation = Operation::mutation("upsertPayoutSettings")
        .arg("input", empty_token_input(ctx))
        .select_all(RESULT_FIELDS);
    let response = ctx.send(&operation)?;
    confirm_code(&response, "upsertPayoutSettings", SUCCESS_CODE)?;

    let error = response
        .field("upsertPayoutSettings")
        .and_then(|payload| payload.get("error"));
    if !matches!(error, None | Some(Value::Null)) {
        return Err(ErrorBuilder::assertion("upsertPayoutSettings")
            .reason("expected error to be null")
            .response(&response)
            .into_error());
    }
    Ok(())
}
