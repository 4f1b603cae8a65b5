//! Suites shipped with the harness, runnable from the CLI by name.

use crate::suite::Suite;

pub mod company;
pub mod payment_method;
pub mod payout_settings;

/// Every built-in suite, in the order `gqlh run` executes them
pub fn builtin_suites() -> Vec<Suite> {
    vec![
        company::suite(),
        payout_settings::suite(),
        payment_method::suite(),
    ]
}

pub fn suite_names() -> Vec<&'static str> {
    vec![company::NAME, payout_settings::NAME, payment_method::NAME]
}

pub fn find_suite(name: &str) -> Option<Suite> {
    match name {
        company::NAME => Some(company::suite()),
        payout_settings::NAME => Some(payout_settings::suite()),
        payment_method::NAME => Some(payment_method::suite()),
        _ => None,
    }
}
