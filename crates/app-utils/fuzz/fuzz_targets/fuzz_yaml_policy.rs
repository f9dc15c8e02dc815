//! Fuzz target for YamlParser::parse
//!
//! Arbitrary strings must never panic the YAML loader, and any set that
//! loads must respect the load-time limits:
//! - MAX_POLICIES_PER_SET = 256
//! - MAX_RULES_PER_POLICY = 1024
//! - MAX_TARGET_PATTERN_LENGTH = 256

#![no_main]

use app_utils::{Error, PolicyParser, YamlParser};
use flow_policy::{
    decide, EvaluationContext, PolicyError, MAX_POLICIES_PER_SET, MAX_RULES_PER_POLICY,
    MAX_TARGET_PATTERN_LENGTH,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    match YamlParser.parse(data) {
        Ok(set) => {
            assert!(set.len() <= MAX_POLICIES_PER_SET);

            for policy in set.policies() {
                assert!(policy.rules().len() <= MAX_RULES_PER_POLICY);
                assert!(policy.validate().is_ok(), "parsed policy failed validation");

                for rule in policy.rules() {
                    assert!(rule.target.as_str().len() <= MAX_TARGET_PATTERN_LENGTH);
                }
            }

            // Evaluation is total over anything that loads
            let ctx = EvaluationContext::new("invoice.read", "invoice:1");
            let _ = decide(set.policies(), &ctx);
        }
        Err(Error::YamlParseError(_)) => {
            // Malformed YAML or a limit violation raised during deserialization
        }
        Err(Error::Policy(PolicyError::TooManyPolicies { attempted, max })) => {
            assert!(attempted > max);
        }
        Err(_) => {}
    }
});
