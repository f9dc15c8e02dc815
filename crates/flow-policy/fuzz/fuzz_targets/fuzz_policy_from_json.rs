//! Fuzz target for PolicySet::from_json
//!
//! Loading arbitrary input must never panic, and anything that loads must
//! respect the load-time limits and evaluate without panicking.

#![no_main]

use flow_policy::{
    EvaluationContext, PolicySet, MAX_POLICIES_PER_SET, MAX_RULES_PER_POLICY,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(set) = PolicySet::from_json(data) else {
        return;
    };

    assert!(set.len() <= MAX_POLICIES_PER_SET);
    for policy in set.policies() {
        assert!(policy.rules().len() <= MAX_RULES_PER_POLICY);
        assert!(policy.validate().is_ok());
    }

    let _ = flow_policy::decide(set.policies(), &EvaluationContext::new("invoice.read", "invoice:1"));
});
