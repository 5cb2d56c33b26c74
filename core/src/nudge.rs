//! Next-best-action guidance and free-form coach answers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::GenerationIssue;
use crate::generation::{TextGenerator, complete_or_none};
use crate::goal::Goal;
use crate::ledger::ProgressionLedger;
use crate::normalize::extract_payload;
use crate::persona::Persona;
use crate::prompts::PromptTemplates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl Urgency {
    /// Lenient: "high", "HIGH", "High urgency" all parse.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        if lowered.starts_with("high") {
            Some(Self::High)
        } else if lowered.starts_with("medium") {
            Some(Self::Medium)
        } else if lowered.starts_with("low") {
            Some(Self::Low)
        } else {
            None
        }
    }
}

/// A motivating suggestion for what the persona should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NextBestAction {
    pub message: String,
    pub action: String,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_mention: Option<String>,
    pub motivation: String,
}

impl NextBestAction {
    pub fn default_for(persona: &Persona) -> Self {
        Self {
            message: format!(
                "Great progress, {}! You're building strong financial habits.",
                persona.name
            ),
            action: "Complete your next available quest to continue your journey".to_string(),
            urgency: Urgency::Medium,
            reward_mention: Some("Earn 150+ LifePoints and unlock exclusive rewards!".to_string()),
            motivation: "Every quest completed brings you closer to your financial goals".to_string(),
        }
    }
}

pub async fn next_best_action(
    generator: &dyn TextGenerator,
    prompts: &PromptTemplates,
    persona: &Persona,
    ledger: &ProgressionLedger,
    current_goal: Option<&Goal>,
) -> NextBestAction {
    let goal_context = match current_goal {
        Some(goal) => format!("Current goal: {}", goal.title),
        None => "No goal selected".to_string(),
    };
    let request = prompts.next_best_action.render(&[
        ("name", persona.name.clone()),
        ("age", persona.age.to_string()),
        ("occupation", persona.occupation.clone()),
        ("goal_context", goal_context),
        ("total_points", ledger.total_points().to_string()),
        ("level", ledger.level().to_string()),
        ("completed_count", ledger.completed_count().to_string()),
        ("unlocked_count", ledger.unlocked_products().len().to_string()),
    ]);

    let issue = match complete_or_none(generator, "next_best_action", request).await {
        None => GenerationIssue::ServiceUnavailable("no response for next best action".to_string()),
        Some(raw) => match parse_next_best_action(&extract_payload(&raw)) {
            Ok(action) => return action,
            Err(reason) => GenerationIssue::MalformedPayload(reason),
        },
    };
    tracing::warn!(
        persona = %persona.key,
        issue_kind = issue.kind(),
        reason = %issue,
        "next best action unusable; using default nudge"
    );
    NextBestAction::default_for(persona)
}

fn parse_next_best_action(text: &str) -> Result<NextBestAction, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("not valid JSON: {e}"))?;
    let obj = value.as_object().ok_or("expected a JSON object")?;
    let text_field = |field: &str| {
        obj.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(NextBestAction {
        message: text_field("message").ok_or("missing field 'message'")?,
        action: text_field("action").ok_or("missing field 'action'")?,
        urgency: text_field("urgency")
            .and_then(|raw| Urgency::parse(&raw))
            .unwrap_or(Urgency::Medium),
        reward_mention: text_field("reward_mention"),
        motivation: text_field("motivation").unwrap_or_default(),
    })
}

/// Answer a free-form question in the coach's voice. Falls back to a fixed
/// answer when the service is unreachable.
pub async fn ask_coach(
    generator: &dyn TextGenerator,
    prompts: &PromptTemplates,
    persona: &Persona,
    progress: &str,
    question: &str,
) -> CoachAnswer {
    let request = prompts.coach_chat.render(&[
        ("name", persona.name.clone()),
        ("age", persona.age.to_string()),
        ("occupation", persona.occupation.clone()),
        ("income_range", persona.income_range.clone()),
        ("progress", progress.to_string()),
        ("question", question.trim().to_string()),
    ]);
    match complete_or_none(generator, "coach_chat", request).await {
        Some(answer) => CoachAnswer {
            answer: answer.trim().to_string(),
            generated: true,
        },
        None => CoachAnswer {
            answer: format!(
                "Sorry {}, your coach is unavailable right now. Keep working through your quests \
                 and ask again in a little while.",
                persona.name
            ),
            generated: false,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CoachAnswer {
    pub answer: String,
    /// False when the fixed fallback answer was used
    pub generated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{OfflineGenerator, ScriptedGenerator};
    use crate::persona::find_persona;

    #[tokio::test]
    async fn parses_fenced_nudge() {
        let generator = ScriptedGenerator::new().with_response(
            "```json\n{\"message\": \"Nice!\", \"action\": \"Take the quiz\", \"urgency\": \"high\", \"motivation\": \"Cover matters\"}\n```",
        );
        let tom = find_persona("tom_carter").unwrap();
        let nudge = next_best_action(
            &generator,
            &PromptTemplates::default(),
            &tom,
            &ProgressionLedger::new(),
            None,
        )
        .await;
        assert_eq!(nudge.action, "Take the quiz");
        assert_eq!(nudge.urgency, Urgency::High);
        assert_eq!(nudge.reward_mention, None);
        assert!(generator.requests()[0].system_prompt.contains("No goal selected"));
    }

    #[tokio::test]
    async fn malformed_nudge_falls_back_to_default() {
        let generator = ScriptedGenerator::new().with_response("{\"message\": \"only this\"}");
        let sarah = find_persona("sarah_johnson").unwrap();
        let nudge = next_best_action(
            &generator,
            &PromptTemplates::default(),
            &sarah,
            &ProgressionLedger::new(),
            None,
        )
        .await;
        assert_eq!(nudge, NextBestAction::default_for(&sarah));
        assert!(nudge.message.contains("Sarah"));
    }

    #[tokio::test]
    async fn coach_falls_back_when_offline() {
        let mike = find_persona("mike_rodriguez").unwrap();
        let answer = ask_coach(
            &OfflineGenerator,
            &PromptTemplates::default(),
            &mike,
            "Level 1",
            "Which cover should I get?",
        )
        .await;
        assert!(!answer.generated);
        assert!(answer.answer.contains(&mike.name));
    }

    #[tokio::test]
    async fn coach_question_becomes_user_prompt() {
        let generator = ScriptedGenerator::new().with_response("  Get an individual plan.  ");
        let mike = find_persona("mike_rodriguez").unwrap();
        let answer = ask_coach(&generator, &PromptTemplates::default(), &mike, "Level 1", "Which cover?").await;
        assert_eq!(answer.answer, "Get an individual plan.");
        assert_eq!(generator.requests()[0].user_prompt, "Which cover?");
    }

    #[test]
    fn urgency_parsing_is_lenient() {
        assert_eq!(Urgency::parse("LOW"), Some(Urgency::Low));
        assert_eq!(Urgency::parse("Medium priority"), Some(Urgency::Medium));
        assert_eq!(Urgency::parse("urgent"), None);
    }
}
