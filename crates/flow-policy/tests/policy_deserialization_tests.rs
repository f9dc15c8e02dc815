//! Loading policy documents from JSON and TOML

use flow_policy::{
    decide, Authorizer, Condition, ConditionGroup, Decision, Effect, EvaluationContext, Operator, PolicyError,
    PolicySet, Rule, Value, MAX_FIELD_PATH_SEGMENTS, MAX_POLICIES_PER_SET,
    MAX_TARGET_PATTERN_LENGTH,
};

const NESTED_JSON: &str = r#"
[
  {
    "name": "invoices",
    "flow": [
      { "effect": "allow", "action": "invoice.read", "target": "invoice:*" },
      {
        "effect": "allow",
        "action": "invoice.approve",
        "target": "invoice:*",
        "when": { "all": [ { "field": "context.amount", "operator": "lte", "value": 5000 } ] }
      }
    ]
  },
  {
    "flow": [
      { "effect": "deny", "action": "invoice.approve", "target": "invoice:inv-999" }
    ]
  }
]
"#;

fn approve(target: &str, amount: i64) -> EvaluationContext {
    EvaluationContext::new("invoice.approve", target)
        .with_context([("amount", amount)].into_iter().collect::<Value>())
}

#[test]
fn test_nested_json_document() {
    let set = PolicySet::from_json(NESTED_JSON).unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.policies()[0].name(), Some("invoices"));
    assert_eq!(set.policies()[1].name(), None);
    assert_eq!(set.rules().count(), 3);

    assert_eq!(set.policies()[0].rules()[0], Rule::allow("invoice.read", "invoice:*"));
    assert_eq!(
        set.policies()[0].rules()[1].when,
        Some(ConditionGroup::all([Condition::lte("context.amount", 5000)]))
    );

    assert_eq!(decide(set.policies(), &approve("invoice:inv-101", 3000)), Decision::Allow);
    assert_eq!(decide(set.policies(), &approve("invoice:inv-101", 9000)), Decision::Deny);
    assert_eq!(decide(set.policies(), &approve("invoice:inv-999", 10)), Decision::Deny);
}

#[test]
fn test_bare_rule_entries_and_mixed_shapes() {
    let json = r#"
    [
      { "effect": "allow", "action": "users.read", "target": "users:101" },
      { "flow": [ { "effect": "deny", "action": "users.read", "target": "users:999" } ] }
    ]
    "#;
    let set = PolicySet::from_json(json).unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.policies()[0].rules().len(), 1);
    assert_eq!(set.policies()[0].rules()[0].effect, Effect::Allow);
    assert_eq!(set.policies()[1].rules()[0].effect, Effect::Deny);

    let read = |target| EvaluationContext::new("users.read", target);
    assert_eq!(decide(set.policies(), &read("users:101")), Decision::Allow);
    assert_eq!(decide(set.policies(), &read("users:999")), Decision::Deny);
    assert_eq!(decide(set.policies(), &read("users:5")), Decision::Deny);
}

#[test]
fn test_any_group_and_operator_aliases() {
    let json = r#"
    [
      {
        "effect": "allow",
        "action": "invoice.approve",
        "target": "invoice:*",
        "when": {
          "any": [
            { "field": "context.amount", "operator": "<", "value": 100 },
            { "field": "user.role", "operator": "in", "value": ["admin", "finance"] }
          ]
        }
      }
    ]
    "#;
    let set = PolicySet::from_json(json).unwrap();
    let group = set.policies()[0].rules()[0].when.as_ref().unwrap();
    assert_eq!(group.conditions()[0].operator, Operator::Lt);
    assert_eq!(group.conditions()[1].operator, Operator::In);

    let finance = approve("invoice:1", 9000)
        .with_user([("role", "finance")].into_iter().collect::<Value>());
    let guest = approve("invoice:1", 9000)
        .with_user([("role", "guest")].into_iter().collect::<Value>());

    assert_eq!(set.decide(&finance), Decision::Allow);
    assert_eq!(set.decide(&guest), Decision::Deny);
}

#[test]
fn test_unknown_operator_loads_but_never_matches() {
    let json = r#"
    [
      {
        "effect": "deny",
        "action": "invoice.read",
        "target": "invoice:*",
        "when": { "all": [ { "field": "context.amount", "operator": "between", "value": 1 } ] }
      },
      { "effect": "allow", "action": "invoice.read", "target": "invoice:*" }
    ]
    "#;
    let set = PolicySet::from_json(json).unwrap();
    let rule = &set.policies()[0].rules()[0];
    assert_eq!(rule.when.as_ref().unwrap().conditions()[0].operator, Operator::Unknown);

    let ctx = EvaluationContext::new("invoice.read", "invoice:1")
        .with_context([("amount", 1)].into_iter().collect::<Value>());
    assert_eq!(decide(set.policies(), &ctx), Decision::Allow);
}

#[test]
fn test_empty_documents() {
    assert!(PolicySet::from_json("[]").unwrap().is_empty());

    let set = PolicySet::from_json(r#"[ { "flow": [] } ]"#).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(
        decide(set.policies(), &EvaluationContext::new("invoice.read", "invoice:1")),
        Decision::Deny
    );

    assert!(PolicySet::from_toml("").unwrap().is_empty());
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(matches!(
        PolicySet::from_json("{ not json"),
        Err(PolicyError::JsonError(_))
    ));
    // Unknown effect
    assert!(PolicySet::from_json(
        r#"[ { "effect": "maybe", "action": "a", "target": "b" } ]"#
    )
    .is_err());
    // A set must be a sequence
    assert!(PolicySet::from_json(
        r#"{ "effect": "allow", "action": "a", "target": "b" }"#
    )
    .is_err());
}

#[test]
fn test_empty_action_is_rejected() {
    let json = r#"[ { "effect": "allow", "action": "", "target": "invoice:*" } ]"#;
    assert!(PolicySet::from_json(json).is_err());
}

#[test]
fn test_target_pattern_limit() {
    let long = "x".repeat(MAX_TARGET_PATTERN_LENGTH + 1);
    let json = format!(r#"[ {{ "effect": "allow", "action": "a", "target": "{long}" }} ]"#);
    assert!(PolicySet::from_json(&json).is_err());

    let fits = "x".repeat(MAX_TARGET_PATTERN_LENGTH);
    let json = format!(r#"[ {{ "effect": "allow", "action": "a", "target": "{fits}" }} ]"#);
    assert!(PolicySet::from_json(&json).is_ok());
}

#[test]
fn test_field_path_limit() {
    let deep = vec!["k"; MAX_FIELD_PATH_SEGMENTS + 1].join(".");
    let rule = Rule::allow("a", "b").when(ConditionGroup::all([Condition::equals(deep, 1)]));
    assert!(matches!(
        rule.validate(),
        Err(PolicyError::FieldPathTooLong { .. })
    ));

    let json = serde_json::to_string(&[rule]).unwrap();
    assert!(PolicySet::from_json(&json).is_err());
}

#[test]
fn test_policy_count_limit() {
    let entry = r#"{ "effect": "allow", "action": "a", "target": "b" }"#;
    let entries = vec![entry; MAX_POLICIES_PER_SET + 1].join(",");
    let json = format!("[{entries}]");

    match PolicySet::from_json(&json) {
        Err(PolicyError::JsonError(e)) => {
            assert!(e.to_string().contains("maximum"));
        }
        other => panic!("expected limit error, got {other:?}"),
    }

    let entries = vec![entry; MAX_POLICIES_PER_SET].join(",");
    assert!(PolicySet::from_json(&format!("[{entries}]")).is_ok());
}

#[test]
fn test_toml_document() {
    let toml_str = r#"
        [[policies]]
        name = "invoices"

        [[policies.flow]]
        effect = "allow"
        action = "invoice.approve"
        target = "invoice:*"

        [policies.flow.when]
        all = [ { field = "context.amount", operator = "lte", value = 5000 } ]

        [[policies]]
        effect = "deny"
        action = "invoice.approve"
        target = "invoice:inv-999"
    "#;
    let set = PolicySet::from_toml(toml_str).unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.policies()[0].name(), Some("invoices"));
    assert_eq!(decide(set.policies(), &approve("invoice:inv-1", 5000)), Decision::Allow);
    assert_eq!(decide(set.policies(), &approve("invoice:inv-1", 5001)), Decision::Deny);
    assert_eq!(decide(set.policies(), &approve("invoice:inv-999", 1)), Decision::Deny);
}

#[test]
fn test_json_and_toml_preserve_decisions() {
    let original = PolicySet::from_json(NESTED_JSON).unwrap();

    let from_json = PolicySet::from_json(&original.to_json().unwrap()).unwrap();
    let from_toml = PolicySet::from_toml(&original.to_toml().unwrap()).unwrap();
    assert_eq!(from_json, original);
    assert_eq!(from_toml, original);
}

#[test]
fn test_malformed_toml_is_rejected() {
    assert!(matches!(
        PolicySet::from_toml("[[policies]\nflow = 3"),
        Err(PolicyError::TomlError(_))
    ));
}

#[test]
fn test_misspelled_keys_are_rejected() {
    // A misspelled `when` must not load as an unconditional allow
    let misspelled_when = r#"[{
        "effect": "allow", "action": "invoice.approve", "target": "invoice:*",
        "When": { "all": [ { "field": "context.amount", "operator": "lte", "value": 5000 } ] }
    }]"#;
    assert!(PolicySet::from_json(misspelled_when).is_err());

    let misspelled_all = r#"[{
        "effect": "allow", "action": "invoice.approve", "target": "invoice:*",
        "when": { "alll": [ { "field": "context.amount", "operator": "lte", "value": 5000 } ] }
    }]"#;
    assert!(PolicySet::from_json(misspelled_all).is_err());

    let misspelled_operand = r#"[{
        "effect": "allow", "action": "invoice.approve", "target": "invoice:*",
        "when": { "all": [ { "field": "context.amount", "operator": "lte", "value": 5000, "unit": "eur" } ] }
    }]"#;
    assert!(PolicySet::from_json(misspelled_operand).is_err());

    let nested = r#"[{ "flow": [
        { "effect": "allow", "action": "invoice.approve", "target": "invoice:*", "condition": {} }
    ] }]"#;
    assert!(PolicySet::from_json(nested).is_err());

    let toml_str = r#"
        [[policies]]
        effect = "allow"
        action = "invoice.approve"
        target = "invoice:*"

        [policies.When]
        all = [ { field = "context.amount", operator = "lte", value = 5000 } ]
    "#;
    assert!(PolicySet::from_toml(toml_str).is_err());
}

#[test]
fn test_empty_when_is_unconditional() {
    let json = r#"[{ "effect": "allow", "action": "invoice.read", "target": "invoice:*", "when": {} }]"#;
    let set = PolicySet::from_json(json).unwrap();

    assert_eq!(set.policies()[0].rules()[0].when, Some(ConditionGroup::Unconditional));
    assert_eq!(
        decide(set.policies(), &EvaluationContext::new("invoice.read", "invoice:1")),
        Decision::Allow
    );
}

#[test]
fn test_shape_mixups_are_rejected() {
    // Rule fields next to `flow`
    let json = r#"[{ "effect": "deny", "action": "a", "target": "b", "flow": [] }]"#;
    assert!(PolicySet::from_json(json).is_err());

    // A name without `flow`
    let json = r#"[{ "name": "n", "effect": "allow", "action": "a", "target": "b" }]"#;
    assert!(PolicySet::from_json(json).is_err());

    // Neither shape
    let err = PolicySet::from_json("[{}]").unwrap_err();
    assert!(err.to_string().contains("missing `effect`"), "{err}");
}

#[test]
fn test_rule_errors_keep_their_message() {
    let long = "x".repeat(MAX_TARGET_PATTERN_LENGTH + 1);
    let json = format!(
        r#"[ {{ "flow": [ {{ "effect": "allow", "action": "a", "target": "{long}" }} ] }} ]"#
    );
    let err = PolicySet::from_json(&json).unwrap_err();
    assert!(err.to_string().contains("Target pattern exceeds maximum"), "{err}");

    let json = r#"[ { "flow": [ { "effect": "allow", "action": "", "target": "invoice:*" } ] } ]"#;
    let err = PolicySet::from_json(json).unwrap_err();
    assert!(err.to_string().contains("action cannot be empty"), "{err}");

    let json = r#"[ { "effect": "maybe", "action": "a", "target": "b" } ]"#;
    let err = PolicySet::from_json(json).unwrap_err();
    assert!(err.to_string().contains("maybe"), "{err}");
}
