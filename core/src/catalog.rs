//! Goal catalog construction for a persona.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::GenerationIssue;
use crate::fallback;
use crate::generation::{TextGenerator, complete_or_none};
use crate::goal::Goal;
use crate::is_health_category;
use crate::normalize::extract_payload;
use crate::persona::Persona;
use crate::prompts::PromptTemplates;
use crate::validate::{Validated, validate_goal_list};

/// Builds an ordered goal catalog: health coverage first, unique ids,
/// never empty.
#[derive(Clone)]
pub struct GoalCatalogBuilder {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptTemplates>,
}

impl GoalCatalogBuilder {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptTemplates>) -> Self {
        Self { generator, prompts }
    }

    pub async fn build(&self, persona: &Persona) -> Validated<Goal> {
        let request = self.prompts.goals.render(&persona_vars(persona));
        let raw = complete_or_none(self.generator.as_ref(), "goal_catalog", request).await;
        let normalized = raw.as_deref().map(extract_payload);

        let mut validated = validate_goal_list(normalized.as_deref(), persona);
        validated.items = order_catalog(validated.items);

        tracing::info!(
            persona = %persona.key,
            goal_count = validated.items.len(),
            fallback = validated.is_fallback(),
            "goal catalog built"
        );
        validated
    }
}

pub(crate) fn persona_vars(persona: &Persona) -> Vec<(&'static str, String)> {
    let products = if persona.current_products.is_empty() {
        "None".to_string()
    } else {
        persona.current_products.join(", ")
    };
    vec![
        ("name", persona.name.clone()),
        ("age", persona.age.to_string()),
        ("occupation", persona.occupation.clone()),
        ("income_range", persona.income_range.clone()),
        ("current_products", products),
        ("financial_status", persona.financial_status.clone()),
        ("risk_profile", persona.risk_profile.clone()),
    ]
}

/// Move health-coverage goals to the front (stable), synthesizing one when
/// absent, then make ids unique.
pub fn order_catalog(goals: Vec<Goal>) -> Vec<Goal> {
    let (mut ordered, rest): (Vec<Goal>, Vec<Goal>) =
        goals.into_iter().partition(Goal::is_health_coverage);
    if ordered.is_empty() {
        let issue = GenerationIssue::InvariantViolation("catalog has no health coverage goal".to_string());
        tracing::debug!(issue_kind = issue.kind(), reason = %issue, "adding default health goal");
        ordered.push(fallback::health_goal());
    }
    ordered.extend(rest);
    dedupe_ids(ordered)
}

/// Later duplicates get a `-2`, `-3`, ... suffix.
fn dedupe_ids(goals: Vec<Goal>) -> Vec<Goal> {
    let mut seen = HashSet::new();
    goals
        .into_iter()
        .map(|mut goal| {
            if !seen.contains(&goal.id) {
                seen.insert(goal.id.clone());
                return goal;
            }
            let mut n = 2;
            while seen.contains(&format!("{}-{n}", goal.id)) {
                n += 1;
            }
            goal.id = format!("{}-{n}", goal.id);
            seen.insert(goal.id.clone());
            goal
        })
        .collect()
}

/// Share (percent) of users in the same age band who pursue goals of this
/// category. Shown as social proof next to a goal.
pub fn popularity_percentage(category: &str, age: u32) -> u8 {
    let category = category.to_lowercase();
    let young = age < 30;
    let pick = |under_30: u8, over_30: u8| if young { under_30 } else { over_30 };

    if is_health_category(&category) {
        pick(70, 65)
    } else if category.contains("emergency") {
        pick(60, 55)
    } else if category.contains("income protection") {
        pick(50, 60)
    } else if category.contains("debt") {
        pick(55, 50)
    } else if category.contains("investment") {
        pick(45, 65)
    } else if category.contains("retirement") {
        pick(30, 70)
    } else if category.contains("life") {
        pick(50, 60)
    } else if category.contains("financial education") {
        pick(65, 60)
    } else {
        50
    }
}
