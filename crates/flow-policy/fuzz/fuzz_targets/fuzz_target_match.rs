//! Fuzz target for target pattern matching
//!
//! Matching must be total and agree with the prefix law for trailing
//! wildcards.

#![no_main]

use arbitrary::Arbitrary;
use flow_policy::{matches, TargetPattern};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct MatchInput {
    pattern: String,
    target: String,
}

fuzz_target!(|input: MatchInput| {
    let result = matches(&input.pattern, &input.target);

    if input.pattern == input.target {
        assert!(result, "literal pattern must cover itself");
    } else if let Some(prefix) = input.pattern.strip_suffix('*') {
        let expected = !input.target.is_empty() && input.target.starts_with(prefix);
        assert_eq!(result, expected);
    } else {
        assert!(!result);
    }

    if let Ok(pattern) = TargetPattern::new(input.pattern.as_str()) {
        assert_eq!(pattern.matches(&input.target), result);
    }
});
