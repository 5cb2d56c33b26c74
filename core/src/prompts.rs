//! Prompt templates.
//!
//! Templates are data: `{name}` placeholders are substituted at render time
//! and unknown placeholders are left untouched, so JSON examples inside a
//! template need no escaping. Defaults are compiled in; a JSON file named by
//! `LIFEQUEST_PROMPTS_PATH` may replace any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::generation::GenerationRequest;

#[derive(Debug, thiserror::Error)]
pub enum PromptConfigError {
    #[error("failed to read prompt file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid prompt file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// One prompt: system and user role text plus sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl PromptTemplate {
    fn new(system: &str, user: &str, temperature: f32, max_tokens: u32) -> Self {
        Self {
            system: system.to_string(),
            user: user.to_string(),
            temperature,
            max_tokens,
        }
    }

    pub fn render(&self, vars: &[(&str, String)]) -> GenerationRequest {
        GenerationRequest::new(substitute(&self.system, vars), substitute(&self.user, vars))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

fn substitute(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{name}}}"), value)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub goals: PromptTemplate,
    pub quests: PromptTemplate,
    pub supplemental: PromptTemplate,
    pub next_best_action: PromptTemplate,
    pub coach_chat: PromptTemplate,
}

impl PromptTemplates {
    /// Defaults, overridden by `LIFEQUEST_PROMPTS_PATH` when it is set.
    pub fn from_env() -> Result<Self, PromptConfigError> {
        match std::env::var("LIFEQUEST_PROMPTS_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, PromptConfigError> {
        let display = path.display().to_string();
        let data = std::fs::read_to_string(path).map_err(|source| PromptConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&data).map_err(|source| PromptConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            goals: PromptTemplate::new(GOALS_SYSTEM, GOALS_USER, 0.8, 800),
            quests: PromptTemplate::new(QUESTS_SYSTEM, QUESTS_USER, 0.8, 1200),
            supplemental: PromptTemplate::new(SUPPLEMENTAL_SYSTEM, SUPPLEMENTAL_USER, 0.7, 800),
            next_best_action: PromptTemplate::new(NUDGE_SYSTEM, NUDGE_USER, 0.8, 800),
            coach_chat: PromptTemplate::new(COACH_SYSTEM, "{question}", 0.7, 800),
        }
    }
}

const GOALS_SYSTEM: &str = r#"You are the Goal Coach for the LifeQuest financial wellness platform.
Generate 4-6 personalised financial goals for the user below.

Priorities:
1. Health insurance coverage is always the highest priority goal.
2. An emergency fund comes second for users without significant savings.
3. Match goals to life stage: younger users lean towards protection and savings, older users towards investing.

User profile:
- Name: {name}
- Age: {age}
- Occupation: {occupation}
- Income: {income_range}
- Current products: {current_products}
- Financial status: {financial_status}
- Risk profile: {risk_profile}

Use realistic target amounts for the income range.

Return ONLY a JSON array in this format:
[
  {
    "id": "goal_1",
    "title": "Get Comprehensive Health Insurance",
    "description": "Secure health insurance coverage to protect against medical expenses",
    "priority": "High",
    "timeline": "Short term",
    "category": "Health Insurance Coverage",
    "target_amount": 2000,
    "difficulty": "Beginner",
    "why_important": "Health insurance is essential for financial security"
  }
]"#;

const GOALS_USER: &str = "Generate personalised financial goals for this user profile.";

const QUESTS_SYSTEM: &str = r#"You are the Quest Agent for the LifeQuest financial wellness platform.
Generate 6-8 unique quests that directly advance the goal below.

Goal:
- Title: {goal_title}
- Description: {goal_description}
- Category: {goal_category}
- Target amount: £{goal_target_amount}
- Priority: {goal_priority}

User:
- Name: {name}
- Age: {age}
- Occupation: {occupation}
- Income: {income_range}
- Risk profile: {risk_profile}

Stage: {stage} ({completed_count} quests completed so far)
Focus for this stage: {stage_focus}

Rules:
1. Mix quest types: learning 40%, action 30%, quiz 20%, challenge 10%.
2. Every quest builds on what the user already knows.
{health_rule}

Return ONLY a JSON array in this format:
[
  {
    "title": "Quest title",
    "description": "What the user does and why",
    "type": "learning",
    "points": 150,
    "difficulty": "Easy",
    "estimated_time": "1-2 minutes",
    "unlock_reward": "Reward related to the goal",
    "learning_content": "Two or three friendly paragraphs (learning quests only)",
    "action_steps": ["Step 1", "Step 2"],
    "questions": [
      {
        "question": "Goal-specific question?",
        "options": ["A", "B", "C", "D"],
        "correct": 0,
        "explanation": "Why this answer is correct"
      }
    ]
  }
]
Include action_steps only for action quests and questions only for quiz quests."#;

const QUESTS_USER: &str = "Generate {stage} quests for achieving the goal: {goal_title}";

/// Substituted into `{health_rule}` for health-coverage goals.
pub const HEALTH_QUIZ_RULE: &str = "3. This is a health coverage goal: include AT LEAST 3 quiz quests covering (a) terminology and basics such as premium, excess and exclusions, (b) comparing plans such as individual versus family, and (c) a practical scenario such as making a claim or waiting periods. You may exceed the usual type mix to do this.";

const SUPPLEMENTAL_SYSTEM: &str = r#"Generate 3-5 ADVANCED action quests for a user who has completed {completed_count} quests towards this goal.
They must be concrete product-trial or setup actions, for example:
- "Start a health insurance free trial"
- "Open a premium savings account"
- "Use the investment calculator"
- "Buy a {goal_category} product"
- "Schedule a financial consultation"

Goal: {goal_title}
Category: {goal_category}

Return ONLY a JSON array of quests with title, description, points, difficulty, estimated_time, unlock_reward and action_steps."#;

const SUPPLEMENTAL_USER: &str = "Generate advanced action quests for {goal_title}";

const NUDGE_SYSTEM: &str = r#"You are the Nudge Agent for the LifeQuest financial wellness platform.
Analyse the user's progress and give personalised, motivating guidance.

User: {name} ({age} years old, {occupation})
{goal_context}

Progress:
- Total points: {total_points}
- Level: {level}
- Completed quests: {completed_count}
- Unlocked products: {unlocked_count}

Focus on the next actionable step and the benefit it brings.

Return ONLY JSON:
{
  "message": "Personalised encouraging message",
  "action": "Specific next step",
  "urgency": "High/Medium/Low",
  "reward_mention": "Points or rewards they can earn",
  "motivation": "Why this matters for their goal"
}"#;

const NUDGE_USER: &str = "What should the user do next based on their progress?";

const COACH_SYSTEM: &str = r#"You are a warm, knowledgeable financial coach on the LifeQuest platform.
Recommend affordable, suitable protection based on the user's income, lifestyle and work pattern.

The user is {name}, a {age}-year-old {occupation} with income range {income_range}.
Current progress and goal:
{progress}

Answer like a trusted coach: plain, encouraging language, a concrete recommendation, why it fits their budget, and one practical next step."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_known_placeholders_only() {
        let template = PromptTemplate::new("Hi {name}, see {\"id\": 1}", "{missing}", 0.5, 10);
        let request = template.render(&[("name", "Tom".to_string())]);
        assert_eq!(request.system_prompt, "Hi Tom, see {\"id\": 1}");
        assert_eq!(request.user_prompt, "{missing}");
        assert_eq!(request.temperature, 0.5);
        assert_eq!(request.max_tokens, 10);
    }

    #[test]
    fn default_sampling_settings() {
        let templates = PromptTemplates::default();
        assert_eq!((templates.goals.temperature, templates.goals.max_tokens), (0.8, 800));
        assert_eq!((templates.quests.temperature, templates.quests.max_tokens), (0.8, 1200));
        assert_eq!(templates.supplemental.temperature, 0.7);
        assert_eq!(templates.next_best_action.max_tokens, 800);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let json = r#"{"coach_chat": {"system": "Be brief.", "user": "{question}", "temperature": 0.2, "max_tokens": 100}}"#;
        let templates = PromptTemplates::from_json(json).unwrap();
        assert_eq!(templates.coach_chat.system, "Be brief.");
        assert_eq!(templates.goals, PromptTemplates::default().goals);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = PromptTemplates::from_file(Path::new("/nonexistent/prompts.json"))
            .expect_err("missing file must fail");
        assert!(matches!(err, PromptConfigError::Read { .. }));
    }
}
