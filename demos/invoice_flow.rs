//! Invoice Approval Flow Example
//!
//! This example demonstrates the core authorization workflow in flowgate:
//!
//! 1. Load a principal's policies from a YAML document
//! 2. Guard an "approve invoice" route with those policies
//! 3. Evaluate requests and map the outcomes to HTTP statuses
//!
//! Run with: cargo run --example invoice_flow

use flowgate::utils::{PolicyParser, YamlParser};
use flowgate::{Guard, Policy, Principal, RequestParts, Value};

const POLICIES: &str = r#"
- name: approvals
  flow:
    - effect: allow
      action: invoice.read
      target: "invoice:*"
    - effect: allow
      action: invoice.approve
      target: "invoice:*"
      when:
        all:
          - { field: context.amount, operator: lte, value: 5000 }
- effect: deny
  action: invoice.approve
  target: "invoice:inv-999"
"#;

struct User {
    id: String,
    policies: Vec<Policy>,
}

impl Principal for User {
    fn policies(&self) -> &[Policy] {
        &self.policies
    }

    fn attributes(&self) -> Value {
        [("id", self.id.as_str())].into_iter().collect()
    }
}

struct ApproveRequest {
    invoice_id: &'static str,
    amount: i64,
}

impl RequestParts for ApproveRequest {
    fn body(&self) -> Option<Value> {
        Some([("amount", self.amount)].into_iter().collect())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("flowgate - Invoice Approval Flow");
    println!("--------------------------------");
    println!();

    // -------------------------------------------------------------------------
    // Step 1: Load policies
    // -------------------------------------------------------------------------
    // A policy document is a sequence. Entries are either nested policies with
    // a `flow` of rules, or bare rules. Both shapes are used here.

    let set = YamlParser.parse(POLICIES)?;
    let alice = User {
        id: "alice".to_string(),
        policies: set.policies().to_vec(),
    };

    println!("Loaded {} policies, {} rules", set.len(), set.rules().count());
    println!();

    // -------------------------------------------------------------------------
    // Step 2: Guard the route
    // -------------------------------------------------------------------------
    // The target is computed from the request, as a route would interpolate
    // its path parameter.

    let guard = Guard::new("invoice.approve", |req: &ApproveRequest| {
        format!("invoice:{}", req.invoice_id)
    });

    // -------------------------------------------------------------------------
    // Step 3: Evaluate requests
    // -------------------------------------------------------------------------

    // (principal, invoice, amount, expected status)
    let test_cases = [
        // Within the approval limit - ALLOWED
        (Some(&alice), "inv-101", 3000, 200),
        // Over the limit - FORBIDDEN
        (Some(&alice), "inv-101", 9000, 403),
        // Explicitly denied invoice, even within the limit - FORBIDDEN
        (Some(&alice), "inv-999", 100, 403),
        // No principal - UNAUTHENTICATED
        (None, "inv-101", 3000, 401),
    ];

    println!("Evaluating approval requests:");
    println!();

    for (principal, invoice_id, amount, expected) in test_cases {
        let request = ApproveRequest { invoice_id, amount };
        let (status, body) = match guard.check(principal, &request) {
            Ok(()) => (200, r#"{"data":"approved"}"#.to_string()),
            Err(e) => (e.status_code(), e.body()),
        };

        let who = principal.map_or("anonymous", |p| p.id.as_str());
        let check = if status == expected { "OK" } else { "MISMATCH" };

        println!(
            "  {} approve invoice:{} amount={} -> {} {} [{}]",
            who, invoice_id, amount, status, body, check
        );
    }

    println!();
    println!("--------------------------------");
    println!("Authorization flow completed successfully.");

    Ok(())
}
