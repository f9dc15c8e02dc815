use anyhow::Context;
use app_utils::load_policies;
use colored::*;
use flow_policy::{ConditionGroup, Operator, PolicySet, Rule};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Something in a policy document that loads but is likely a mistake.
/// Rule and condition numbers are 1-based, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    Duplicate { rule: usize },
    /// An unknown operator in an `all` group, or every condition of an
    /// `any` group unknown
    NeverMatches { rule: usize },
    /// An unknown operator inside an `any` group with other alternatives
    IgnoredCondition { rule: usize, condition: usize },
    NoRules,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { rule } => write!(f, "Rule {} is a duplicate", rule),
            Self::NeverMatches { rule } => {
                write!(f, "Rule {} uses an unknown operator and never matches", rule)
            }
            Self::IgnoredCondition { rule, condition } => write!(
                f,
                "Rule {} condition {} uses an unknown operator and is ignored",
                rule, condition
            ),
            Self::NoRules => write!(f, "No rules: every request will be denied"),
        }
    }
}

pub fn check(file_path: &Path) -> anyhow::Result<()> {
    println!("{} {}", "Checking policies:".bold(), file_path.display());

    let set = load_policies(file_path)
        .with_context(|| format!("Failed to load {}", file_path.display()))?;

    println!("  {} Policies: {}", "✓".green(), set.len());
    println!("  {} Rules: {}", "✓".green(), set.rules().count());

    let warnings = warnings(&set);
    for warning in &warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    println!();
    if warnings.is_empty() {
        println!("{} Policies are valid!", "✓".green().bold());
    } else {
        println!(
            "{} Policies are valid with {} warning(s)",
            "⚠".yellow().bold(),
            warnings.len()
        );
    }

    Ok(())
}

pub fn warnings(set: &PolicySet) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let mut seen_rules = HashSet::new();
    for (i, rule) in set.rules().enumerate() {
        let rule_key = format!("{}:{}:{}:{:?}", rule.effect, rule.action, rule.target, rule.when);
        if !seen_rules.insert(rule_key) {
            warnings.push(Warning::Duplicate { rule: i + 1 });
        }
    }

    for (i, rule) in set.rules().enumerate() {
        unknown_operators(i + 1, rule, &mut warnings);
    }

    if set.rules().next().is_none() {
        warnings.push(Warning::NoRules);
    }

    warnings
}

fn unknown_operators(number: usize, rule: &Rule, warnings: &mut Vec<Warning>) {
    let Some(group) = &rule.when else {
        return;
    };
    let unknown: Vec<usize> = group
        .conditions()
        .iter()
        .enumerate()
        .filter(|(_, condition)| condition.operator == Operator::Unknown)
        .map(|(j, _)| j + 1)
        .collect();
    if unknown.is_empty() {
        return;
    }

    match group {
        // One failing condition fails the conjunction
        ConditionGroup::All(_) => warnings.push(Warning::NeverMatches { rule: number }),
        ConditionGroup::Any(conditions) if unknown.len() == conditions.len() => {
            warnings.push(Warning::NeverMatches { rule: number })
        }
        ConditionGroup::Any(_) => warnings.extend(
            unknown
                .into_iter()
                .map(|condition| Warning::IgnoredCondition { rule: number, condition }),
        ),
        ConditionGroup::Unconditional => {}
    }
}
