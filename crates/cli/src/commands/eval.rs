use anyhow::Context;
use app_utils::load_policies;
use colored::*;
use flow_policy::{Decision, Effect, EvaluationContext, PolicyAuthorizer, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments of `flowgate eval`
pub struct EvalRequest {
    pub policies: PathBuf,
    pub action: String,
    pub target: String,
    pub context: Option<PathBuf>,
    pub user: Option<PathBuf>,
    pub explain: bool,
}

fn read_payload(path: Option<&Path>) -> anyhow::Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub fn run(request: &EvalRequest) -> anyhow::Result<Decision> {
    let set = load_policies(&request.policies)
        .with_context(|| format!("Failed to load policies from {}", request.policies.display()))?;

    let ctx = EvaluationContext::new(request.action.as_str(), request.target.as_str())
        .with_user(read_payload(request.user.as_deref())?)
        .with_context(read_payload(request.context.as_deref())?);

    let authorizer = PolicyAuthorizer::new(set.policies());
    let decision = authorizer.decide(&ctx);

    match decision {
        Decision::Allow => println!("{}", "ALLOW".green().bold()),
        Decision::Deny => println!("{}", "DENY".red().bold()),
    }

    if request.explain {
        println!(
            "  {} of {} rules matched {} on {}",
            authorizer.matching_rules(&ctx).count(),
            authorizer.rule_count(),
            ctx.action(),
            ctx.target()
        );
        for (policy, index, rule) in authorizer.rules() {
            if !rule.applies_to(&ctx) {
                continue;
            }
            let label = set.policies()[policy].name().unwrap_or("-");
            let effect = match rule.effect {
                Effect::Allow => "allow".green(),
                Effect::Deny => "deny".red(),
            };
            println!(
                "  {} policy {} ({}) rule {}: {} {} {}",
                "•".bold(),
                policy,
                label,
                index,
                effect,
                rule.action,
                rule.target
            );
        }
    }

    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_eval_reads_policies_and_payloads() {
        let dir = std::env::temp_dir().join(format!("flowgate-eval-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let policies = write(
            &dir,
            "policies.yaml",
            r#"
- effect: allow
  action: invoice.approve
  target: "invoice:*"
  when:
    all:
      - { field: context.amount, operator: lte, value: 5000 }
      - { field: user.team, operator: eq, value: finance }
"#,
        );
        let user = write(&dir, "user.json", r#"{ "team": "finance" }"#);
        let small = write(&dir, "small.json", r#"{ "amount": 3000 }"#);
        let large = write(&dir, "large.json", r#"{ "amount": 9000 }"#);

        let request = |context: &Path| EvalRequest {
            policies: policies.clone(),
            action: "invoice.approve".to_string(),
            target: "invoice:555".to_string(),
            context: Some(context.to_path_buf()),
            user: Some(user.clone()),
            explain: true,
        };

        assert_eq!(run(&request(&small)).unwrap(), Decision::Allow);
        assert_eq!(run(&request(&large)).unwrap(), Decision::Deny);

        let missing = EvalRequest {
            policies: dir.join("missing.toml"),
            ..request(&small)
        };
        assert!(run(&missing).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
