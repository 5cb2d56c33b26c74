//! Stage-aware quest batch generation.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::GenerationIssue;
use crate::fallback;
use crate::generation::{TextGenerator, complete_or_none};
use crate::goal::Goal;
use crate::normalize::extract_payload;
use crate::persona::Persona;
use crate::prompts::{HEALTH_QUIZ_RULE, PromptTemplates};
use crate::quest::{Quest, Stage};
use crate::validate::{validate_quest_list, validate_supplemental_list};

/// Minimum quiz quests in any batch for a health-coverage goal.
pub const HEALTH_MIN_QUIZZES: usize = 3;
/// Upper bound on quests appended at one milestone.
pub const SUPPLEMENTAL_MAX: usize = 5;

/// A freshly generated quest list for one goal.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QuestBatch {
    pub goal_id: String,
    pub stage: Stage,
    pub quests: Vec<Quest>,
    /// Set when defaults replaced unusable generative output
    #[serde(skip)]
    pub fallback: Option<GenerationIssue>,
    /// Quiz quests added to meet the health-coverage minimum
    pub backfilled_quizzes: usize,
}

pub struct QuestSequencer {
    generator: Arc<dyn TextGenerator>,
    prompts: Arc<PromptTemplates>,
    last_stamp: AtomicI64,
}

impl QuestSequencer {
    pub fn new(generator: Arc<dyn TextGenerator>, prompts: Arc<PromptTemplates>) -> Self {
        Self {
            generator,
            prompts,
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Generate the batch for `goal` at the stage implied by
    /// `completed_for_goal`.
    pub async fn generate(&self, goal: &Goal, persona: &Persona, completed_for_goal: usize) -> QuestBatch {
        let stage = Stage::from_completed(completed_for_goal);
        let health = goal.is_health_coverage();

        let request = self.prompts.quests.render(&[
            ("goal_title", goal.title.clone()),
            ("goal_description", goal.description.clone()),
            ("goal_category", goal.category.clone()),
            ("goal_target_amount", format_amount(goal.target_amount)),
            ("goal_priority", goal.priority.as_str().to_string()),
            ("name", persona.name.clone()),
            ("age", persona.age.to_string()),
            ("occupation", persona.occupation.clone()),
            ("income_range", persona.income_range.clone()),
            ("risk_profile", persona.risk_profile.clone()),
            ("stage", stage.as_str().to_string()),
            ("completed_count", completed_for_goal.to_string()),
            ("stage_focus", stage.focus().to_string()),
            ("health_rule", if health { HEALTH_QUIZ_RULE.to_string() } else { String::new() }),
        ]);
        let raw = complete_or_none(self.generator.as_ref(), "quest_batch", request).await;
        let normalized = raw.as_deref().map(extract_payload);
        let validated = validate_quest_list(normalized.as_deref(), goal, stage);

        let mut quests = validated.items;
        let backfilled_quizzes = if health { backfill_health_quizzes(&mut quests, goal, stage) } else { 0 };
        self.assign_ids(&mut quests, goal, stage);

        tracing::info!(
            goal_id = %goal.id,
            stage = stage.as_str(),
            quest_count = quests.len(),
            backfilled_quizzes,
            fallback = validated.fallback.is_some(),
            "quest batch generated"
        );

        QuestBatch {
            goal_id: goal.id.clone(),
            stage,
            quests,
            fallback: validated.fallback,
            backfilled_quizzes,
        }
    }

    /// Generate the advanced action quests appended when a goal reaches a
    /// completion milestone. Never empty.
    pub async fn generate_supplemental(
        &self,
        goal: &Goal,
        persona: &Persona,
        completed_for_goal: usize,
    ) -> QuestBatch {
        let request = self.prompts.supplemental.render(&[
            ("completed_count", completed_for_goal.to_string()),
            ("goal_category", goal.category.clone()),
            ("goal_title", goal.title.clone()),
            ("name", persona.name.clone()),
        ]);
        let raw = complete_or_none(self.generator.as_ref(), "supplemental_quests", request).await;
        let normalized = raw.as_deref().map(extract_payload);
        let validated = validate_supplemental_list(normalized.as_deref(), goal);

        let mut quests = validated.items;
        quests.truncate(SUPPLEMENTAL_MAX);
        self.assign_ids(&mut quests, goal, Stage::Advanced);

        tracing::info!(
            goal_id = %goal.id,
            persona = %persona.key,
            completed_for_goal,
            quest_count = quests.len(),
            fallback = validated.fallback.is_some(),
            "supplemental quests generated"
        );

        QuestBatch {
            goal_id: goal.id.clone(),
            stage: Stage::Advanced,
            quests,
            fallback: validated.fallback,
            backfilled_quizzes: 0,
        }
    }

    /// `quest_<goal>_<stage>_<ordinal>_<stamp>`. The stamp is the generation
    /// time in milliseconds, strictly increasing per sequencer.
    fn assign_ids(&self, quests: &mut [Quest], goal: &Goal, stage: Stage) {
        let stamp = self.next_stamp();
        for (ordinal, quest) in quests.iter_mut().enumerate() {
            quest.id = format!("quest_{}_{}_{}_{stamp}", goal.id, stage.as_str(), ordinal + 1);
            quest.goal_id = goal.id.clone();
            quest.stage = stage;
        }
    }

    fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last_stamp
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(current) => last = current,
            }
        }
    }
}

/// Append default quizzes (basics, comparison, claims; in that order) until
/// the batch holds the health-coverage minimum. Returns how many were added.
fn backfill_health_quizzes(quests: &mut Vec<Quest>, goal: &Goal, stage: Stage) -> usize {
    let present = quests.iter().filter(|quest| quest.is_quiz()).count();
    let missing = HEALTH_MIN_QUIZZES.saturating_sub(present);
    if missing > 0 {
        let issue = GenerationIssue::InvariantViolation(format!(
            "health batch has {present} quiz quests, needs {HEALTH_MIN_QUIZZES}"
        ));
        tracing::debug!(
            goal_id = %goal.id,
            issue_kind = issue.kind(),
            reason = %issue,
            "backfilling default quizzes"
        );
        quests.extend(fallback::health_quiz_quests(goal, stage).into_iter().take(missing));
    }
    missing
}

fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(value) if value.fract() == 0.0 => format!("{value:.0}"),
        Some(value) => format!("{value:.2}"),
        None => "not specified".to_string(),
    }
}
