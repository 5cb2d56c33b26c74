use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Base points used when a quest carries no usable point value.
pub const DEFAULT_QUEST_POINTS: u32 = 100;

/// A discrete task advancing a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Quest {
    /// Globally unique, assigned by the sequencer
    pub id: String,
    /// Goal this quest advances, matched by equality
    pub goal_id: String,
    pub title: String,
    pub description: String,
    /// Positive base points before the level multiplier
    pub points: u32,
    pub difficulty: String,
    pub estimated_time: String,
    pub unlock_reward: String,
    pub stage: Stage,
    /// Quest type and its type-specific payload
    #[serde(flatten)]
    pub content: QuestContent,
}

impl Quest {
    pub fn kind(&self) -> QuestKind {
        self.content.kind()
    }

    pub fn is_quiz(&self) -> bool {
        self.kind() == QuestKind::Quiz
    }

    /// Base points, substituting the default for a zero value.
    pub fn points_or_default(&self) -> u32 {
        if self.points == 0 {
            DEFAULT_QUEST_POINTS
        } else {
            self.points
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        match &self.content {
            QuestContent::Quiz { questions } => questions,
            _ => &[],
        }
    }
}

/// Quest type together with the payload it requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestContent {
    Learning {
        learning_content: String,
    },
    Action {
        action_steps: Vec<String>,
    },
    Quiz {
        questions: Vec<QuizQuestion>,
    },
    Challenge,
}

impl QuestContent {
    pub fn kind(&self) -> QuestKind {
        match self {
            Self::Learning { .. } => QuestKind::Learning,
            Self::Action { .. } => QuestKind::Action,
            Self::Quiz { .. } => QuestKind::Quiz,
            Self::Challenge => QuestKind::Challenge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestKind {
    Learning,
    Action,
    Quiz,
    Challenge,
}

impl QuestKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Action => "action",
            Self::Quiz => "quiz",
            Self::Challenge => "challenge",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "learning" => Some(Self::Learning),
            "action" => Some(Self::Action),
            "quiz" => Some(Self::Quiz),
            "challenge" => Some(Self::Challenge),
            _ => None,
        }
    }
}

/// One multiple-choice question of a quiz quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuizQuestion {
    pub question: String,
    /// At least two options
    pub options: Vec<String>,
    /// Index into `options`
    pub correct: usize,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Progression tier for quest difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Beginner,
    Intermediate,
    Advanced,
}

impl Stage {
    /// Stage for the number of quests already completed for a goal.
    pub fn from_completed(completed_for_goal: usize) -> Self {
        if completed_for_goal < 2 {
            Self::Beginner
        } else if completed_for_goal < 5 {
            Self::Intermediate
        } else {
            Self::Advanced
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Topic focus used to frame the quest prompt.
    pub const fn focus(self) -> &'static str {
        match self {
            Self::Beginner => "basic education and awareness building",
            Self::Intermediate => "practical knowledge and comparisons",
            Self::Advanced => "action items and product trials",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_thresholds() {
        assert_eq!(Stage::from_completed(0), Stage::Beginner);
        assert_eq!(Stage::from_completed(1), Stage::Beginner);
        assert_eq!(Stage::from_completed(2), Stage::Intermediate);
        assert_eq!(Stage::from_completed(4), Stage::Intermediate);
        assert_eq!(Stage::from_completed(5), Stage::Advanced);
        assert_eq!(Stage::from_completed(40), Stage::Advanced);
    }

    #[test]
    fn quest_serializes_type_tag_next_to_payload() {
        let quest = Quest {
            id: "quest_goal_a_beginner_0_1".to_string(),
            goal_id: "goal_a".to_string(),
            title: "Read up".to_string(),
            description: "Learn the basics".to_string(),
            points: 120,
            difficulty: "Easy".to_string(),
            estimated_time: "1-2 minutes".to_string(),
            unlock_reward: "Guide".to_string(),
            stage: Stage::Beginner,
            content: QuestContent::Action {
                action_steps: vec!["Open the app".to_string()],
            },
        };
        let value = serde_json::to_value(&quest).unwrap();
        assert_eq!(value["type"], "action");
        assert_eq!(value["action_steps"][0], "Open the app");
        assert_eq!(value["stage"], "beginner");

        let back: Quest = serde_json::from_value(value).unwrap();
        assert_eq!(back, quest);
    }

    #[test]
    fn zero_points_fall_back_to_default() {
        let quest = Quest {
            id: "q".to_string(),
            goal_id: "g".to_string(),
            title: String::new(),
            description: String::new(),
            points: 0,
            difficulty: String::new(),
            estimated_time: String::new(),
            unlock_reward: String::new(),
            stage: Stage::Beginner,
            content: QuestContent::Challenge,
        };
        assert_eq!(quest.points_or_default(), DEFAULT_QUEST_POINTS);
    }
}
