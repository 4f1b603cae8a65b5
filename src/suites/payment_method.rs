//! `deletePaymentMethod`: validation and deleting an id that does not exist.

use crate::assertions::confirm_error;
use crate::error::Result;
use crate::lifecycle::DELETE_RESULT_FIELDS;
use crate::query::{InputObject, Operation};
use crate::suite::{validation_cases, Suite, TestContext, ValidationTarget};

pub const NAME: &str = "payment-method";

const MISSING_ID: &str = "00000000-0000-0000-0000-000000000000";

pub fn suite() -> Suite {
    Suite::new(NAME)
        .describe("Payment method delete")
        .cases(validation_cases(
            &ValidationTarget::mutation("deletePaymentMethod", "id").select(DELETE_RESULT_FIELDS),
        ))
        .case("deletePaymentMethod rejects an unknown id", delete_missing)
}

/// The server answers 2xx with `errors` and no data, whatever the run's
/// validation contract is.
fn delete_missing(ctx: &mut TestContext) -> Result<()> {
    let operation = Operation::mutation("deletePaymentMethod")
        .arg("input", InputObject::new().field("id", MISSING_ID))
        .select_all(DELETE_RESULT_FIELDS);
    let response = ctx.send(&operation)?;
    confirm_error(&response, "deletePaymentMethod", true)?;
    Ok(())
}
