//! Guard behaviour for routes protected by policies

use app_utils::guard::{Guard, GuardError, Principal, RequestParts};
use app_utils::{Error, JsonParser, PolicyParser};
use flow_policy::{Decision, Policy, PolicyError, PolicySet, Rule, Value};

struct User {
    id: &'static str,
    policies: Vec<Policy>,
}

impl Principal for User {
    fn policies(&self) -> &[Policy] {
        &self.policies
    }

    fn attributes(&self) -> Value {
        [("id", self.id)].into_iter().collect()
    }
}

#[derive(Default)]
struct Request {
    id: String,
    body: Option<Value>,
    query: Option<Value>,
}

impl Request {
    fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }
}

impl RequestParts for Request {
    fn body(&self) -> Option<Value> {
        self.body.clone()
    }

    fn query(&self) -> Option<Value> {
        self.query.clone()
    }
}

fn user(rules: impl IntoIterator<Item = Rule>) -> User {
    User {
        id: "u1",
        policies: rules.into_iter().map(Policy::from_rule).collect(),
    }
}

fn invoice_target(req: &Request) -> String {
    format!("invoice:{}", req.id)
}

fn users_target(req: &Request) -> String {
    format!("users:{}", req.id)
}

#[test]
fn allows_invoice_read_with_explicit_allow() {
    let guard = Guard::new("invoice.read", invoice_target);
    let user = user([Rule::allow("invoice.read", "invoice:*")]);

    assert!(guard.check(Some(&user), &Request::with_id("555")).is_ok());
}

#[test]
fn denies_invoice_read_with_deny_policy() {
    let guard = Guard::new("invoice.read", invoice_target);
    let user = user([Rule::deny("invoice.read", "invoice:*")]);

    let err = guard.check(Some(&user), &Request::with_id("555")).unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.body(), r#"{"error":"Forbidden"}"#);
    assert!(matches!(
        err,
        GuardError::Forbidden { ref action, ref target }
            if action == "invoice.read" && target == "invoice:555"
    ));
}

#[test]
fn prefers_deny_when_allow_and_deny_conflict() {
    let guard = Guard::new("invoice.read", invoice_target);
    let user = user([
        Rule::allow("invoice.read", "invoice:*"),
        Rule::deny("invoice.read", "invoice:*"),
    ]);

    let err = guard.check(Some(&user), &Request::with_id("999")).unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[test]
fn allows_deleting_any_user_with_wildcard() {
    let guard = Guard::allow("users.delete", users_target);
    let user = user([Rule::allow("users.delete", "users:*")]);

    assert!(guard.check(Some(&user), &Request::with_id("999")).is_ok());
}

#[test]
fn rejects_missing_principal_before_evaluation() {
    let guard = Guard::new("users.read", |req: &Request| -> String {
        panic!("target computed for unauthenticated request {}", req.id)
    });

    let err = guard
        .check(None::<&User>, &Request::with_id("101"))
        .unwrap_err();
    assert!(matches!(err, GuardError::Unauthenticated));
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.body(), r#"{"error":"Unauthorized"}"#);
    assert_eq!(guard.decide(None::<&User>, &Request::with_id("101")), None);
}

#[test]
fn one_policy_covers_several_routes() {
    let user = user([
        Rule::allow("users.read", "users:*"),
        Rule::deny("invoice.read", "invoice:*"),
        Rule::allow("invoice.update", "invoice:123"),
    ]);

    let list_users = Guard::new("users.read", |_: &Request| "users:*".to_string());
    let read_invoice = Guard::new("invoice.read", invoice_target);
    let update_invoice = Guard::new("invoice.update", invoice_target);

    let req = Request::with_id("123");
    assert!(list_users.check(Some(&user), &req).is_ok());
    assert_eq!(read_invoice.check(Some(&user), &req).unwrap_err().status_code(), 403);
    assert!(update_invoice.check(Some(&user), &req).is_ok());
}

#[test]
fn allows_single_user_read_without_read_all() {
    let guard = Guard::new("users.read", users_target);
    let user = user([Rule::allow("users.read", "users:101")]);

    assert!(guard.check(Some(&user), &Request::with_id("101")).is_ok());
    assert!(guard.check(Some(&user), &Request::with_id("999")).is_err());
}

#[test]
fn denies_update_when_only_read_is_allowed() {
    let guard = Guard::new("invoice.update", invoice_target);
    let reader = user([Rule::allow("invoice.read", "invoice:*")]);
    let writer = user([Rule::allow("invoice.update", "invoice:*")]);
    let single = user([Rule::allow("invoice.update", "invoice:787")]);

    let req = Request::with_id("777");
    assert!(guard.check(Some(&reader), &req).is_err());
    assert!(guard.check(Some(&writer), &req).is_ok());
    assert!(guard.check(Some(&single), &req).is_err());
}

#[test]
fn principal_without_policies_is_forbidden() {
    let guard = Guard::new("invoice.read", invoice_target);
    let user = user([]);

    let err = guard.check(Some(&user), &Request::with_id("1")).unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[test]
fn body_takes_precedence_over_query() {
    let policies = JsonParser
        .parse(
            r#"[{
                "effect": "allow",
                "action": "invoice.approve",
                "target": "invoice:*",
                "when": { "all": [
                    { "field": "context.amount", "operator": "lte", "value": 5000 },
                    { "field": "user.id", "operator": "eq", "value": "u1" }
                ] }
            }]"#,
        )
        .unwrap();
    let user = User {
        id: "u1",
        policies: policies.policies().to_vec(),
    };
    let guard = Guard::new("invoice.approve", invoice_target);

    let small: Value = [("amount", 3000)].into_iter().collect();
    let large: Value = [("amount", 9000)].into_iter().collect();

    let req = Request {
        id: "1".into(),
        body: Some(small.clone()),
        query: Some(large.clone()),
    };
    assert_eq!(guard.decide(Some(&user), &req), Some(Decision::Allow));

    let req = Request {
        id: "1".into(),
        body: None,
        query: Some(large),
    };
    assert_eq!(guard.decide(Some(&user), &req), Some(Decision::Deny));

    let req = Request {
        id: "1".into(),
        body: None,
        query: Some(small),
    };
    assert!(guard.check(Some(&user), &req).is_ok());
}

#[test]
fn loader_faults_map_to_internal_error() {
    let load = || -> Result<PolicySet, GuardError> {
        Ok(JsonParser.parse("{ not a sequence")?)
    };

    let err = load().unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(matches!(
        err,
        GuardError::Internal(Error::Policy(PolicyError::JsonError(_)))
    ));
}
