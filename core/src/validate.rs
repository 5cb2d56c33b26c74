//! Schema validation of untrusted generative payloads.
//!
//! Normalized text is parsed into [`Parsed`] before any domain logic touches
//! it. The `validate_*` entry points never fail: an unavailable service or an
//! invalid payload yields the deterministic default set from [`crate::fallback`]
//! and the reason is logged.

use serde_json::{Map, Value};

use crate::error::GenerationIssue;
use crate::fallback;
use crate::goal::{Goal, Priority, Timeline};
use crate::persona::Persona;
use crate::quest::{DEFAULT_QUEST_POINTS, Quest, QuestContent, QuestKind, QuizQuestion, Stage};

/// Outcome of parsing one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Ok(T),
    Invalid(String),
}

impl<T> Parsed<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// A validated entity list and, when defaults were substituted, why.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub items: Vec<T>,
    pub fallback: Option<GenerationIssue>,
}

impl<T> Validated<T> {
    fn generated(items: Vec<T>) -> Self {
        Self {
            items,
            fallback: None,
        }
    }

    fn fallback(items: Vec<T>, issue: GenerationIssue) -> Self {
        Self {
            items,
            fallback: Some(issue),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// How quest entries are shaped before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestBatchKind {
    /// Regular stage batch; `type` comes from the payload.
    Standard,
    /// Milestone batch; every entry becomes an advanced action quest.
    Supplemental,
}

/// Validate a goal-list payload. `normalized` is `None` when the service
/// produced no response.
pub fn validate_goal_list(normalized: Option<&str>, persona: &Persona) -> Validated<Goal> {
    let issue = match normalized {
        None => GenerationIssue::ServiceUnavailable("no response for goal list".to_string()),
        Some(text) => match parse_goal_list(text) {
            Parsed::Ok(goals) => return Validated::generated(goals),
            Parsed::Invalid(reason) => GenerationIssue::MalformedPayload(reason),
        },
    };
    tracing::warn!(
        persona = %persona.key,
        issue_kind = issue.kind(),
        reason = %issue,
        "goal generation unusable; substituting default goals"
    );
    Validated::fallback(fallback::default_goals(persona), issue)
}

/// Validate a quest-list payload for `goal` at `stage`.
pub fn validate_quest_list(normalized: Option<&str>, goal: &Goal, stage: Stage) -> Validated<Quest> {
    let issue = match normalized {
        None => GenerationIssue::ServiceUnavailable("no response for quest list".to_string()),
        Some(text) => match parse_quest_list(text, goal, stage, QuestBatchKind::Standard) {
            Parsed::Ok(quests) => return Validated::generated(quests),
            Parsed::Invalid(reason) => GenerationIssue::MalformedPayload(reason),
        },
    };
    tracing::warn!(
        goal_id = %goal.id,
        stage = stage.as_str(),
        issue_kind = issue.kind(),
        reason = %issue,
        "quest generation unusable; substituting default quest"
    );
    Validated::fallback(fallback::default_quests(goal, stage), issue)
}

/// Validate a milestone (supplemental) quest-list payload for `goal`.
pub fn validate_supplemental_list(normalized: Option<&str>, goal: &Goal) -> Validated<Quest> {
    let issue = match normalized {
        None => GenerationIssue::ServiceUnavailable("no response for supplemental quests".to_string()),
        Some(text) => {
            match parse_quest_list(text, goal, Stage::Advanced, QuestBatchKind::Supplemental) {
                Parsed::Ok(quests) => return Validated::generated(quests),
                Parsed::Invalid(reason) => GenerationIssue::MalformedPayload(reason),
            }
        }
    };
    tracing::warn!(
        goal_id = %goal.id,
        issue_kind = issue.kind(),
        reason = %issue,
        "supplemental generation unusable; substituting default action quest"
    );
    Validated::fallback(fallback::default_supplemental_quests(goal), issue)
}

/// Parse a goal list. Entries without an id are numbered `goal_<n>`.
pub fn parse_goal_list(text: &str) -> Parsed<Vec<Goal>> {
    let entries = match entry_array(text, "goals") {
        Ok(entries) => entries,
        Err(reason) => return Parsed::Invalid(reason),
    };
    let mut goals = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match parse_goal(entry, index) {
            Ok(goal) => goals.push(goal),
            Err(reason) => return Parsed::Invalid(format!("goal[{index}]: {reason}")),
        }
    }
    Parsed::Ok(goals)
}

/// Parse a quest list for `goal`. Ids are provisional; the sequencer assigns
/// the final ones.
pub fn parse_quest_list(
    text: &str,
    goal: &Goal,
    stage: Stage,
    batch: QuestBatchKind,
) -> Parsed<Vec<Quest>> {
    let entries = match entry_array(text, "quests") {
        Ok(entries) => entries,
        Err(reason) => return Parsed::Invalid(reason),
    };
    let mut quests = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match parse_quest(entry, index, goal, stage, batch) {
            Ok(quest) => quests.push(quest),
            Err(reason) => return Parsed::Invalid(format!("quest[{index}]: {reason}")),
        }
    }
    Parsed::Ok(quests)
}

/// A non-empty JSON array, either top-level or under `wrapper_key`.
fn entry_array(text: &str, wrapper_key: &str) -> Result<Vec<Value>, String> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| format!("payload is not valid JSON: {e}"))?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove(wrapper_key) {
            Some(Value::Array(entries)) => entries,
            _ => return Err(format!("expected a JSON array or an object with '{wrapper_key}'")),
        },
        _ => return Err("expected a JSON array".to_string()),
    };
    if entries.is_empty() {
        return Err("list is empty".to_string());
    }
    Ok(entries)
}

fn parse_goal(entry: &Value, index: usize) -> Result<Goal, String> {
    let obj = entry.as_object().ok_or("entry is not an object")?;

    let id = match optional_str(obj, "id")? {
        Some(id) => id,
        None => format!("goal_{}", index + 1),
    };
    let priority_raw = required_str(obj, "priority")?;
    let priority = Priority::parse(&priority_raw)
        .ok_or_else(|| format!("unknown priority '{priority_raw}'"))?;
    let timeline_raw = required_str(obj, "timeline")?;
    let timeline = Timeline::parse(&timeline_raw)
        .ok_or_else(|| format!("unknown timeline '{timeline_raw}'"))?;

    Ok(Goal {
        id,
        title: required_str(obj, "title")?,
        description: required_str(obj, "description")?,
        priority,
        timeline,
        category: required_str(obj, "category")?,
        target_amount: target_amount(obj)?,
        difficulty: optional_str(obj, "difficulty")?.unwrap_or_else(|| "Beginner".to_string()),
        why_important: optional_str(obj, "why_important")?.unwrap_or_default(),
    })
}

fn parse_quest(
    entry: &Value,
    index: usize,
    goal: &Goal,
    stage: Stage,
    batch: QuestBatchKind,
) -> Result<Quest, String> {
    let obj = entry.as_object().ok_or("entry is not an object")?;

    let title = required_str(obj, "title")?;
    let description = required_str(obj, "description")?;

    let (kind, default_points) = match batch {
        QuestBatchKind::Standard => {
            let raw = required_str(obj, "type")?;
            let kind = QuestKind::parse(&raw).ok_or_else(|| format!("unknown quest type '{raw}'"))?;
            (kind, DEFAULT_QUEST_POINTS)
        }
        QuestBatchKind::Supplemental => (QuestKind::Action, fallback::SUPPLEMENTAL_DEFAULT_POINTS),
    };

    let content = match kind {
        QuestKind::Learning => QuestContent::Learning {
            learning_content: optional_str(obj, "learning_content")?
                .unwrap_or_else(|| description.clone()),
        },
        QuestKind::Action => QuestContent::Action {
            action_steps: string_list(obj, "action_steps")?.unwrap_or_default(),
        },
        QuestKind::Quiz => QuestContent::Quiz {
            questions: quiz_questions(obj)?,
        },
        QuestKind::Challenge => QuestContent::Challenge,
    };

    Ok(Quest {
        id: format!("quest_{}_{}_{index}", goal.id, stage.as_str()),
        goal_id: goal.id.clone(),
        title,
        description,
        points: points(obj, default_points)?,
        difficulty: optional_str(obj, "difficulty")?.unwrap_or_else(|| "Medium".to_string()),
        estimated_time: optional_str(obj, "estimated_time")?
            .unwrap_or_else(|| "1-2 minutes".to_string()),
        unlock_reward: optional_str(obj, "unlock_reward")?
            .unwrap_or_else(|| "LifePoints".to_string()),
        stage,
        content,
    })
}

fn quiz_questions(obj: &Map<String, Value>) -> Result<Vec<QuizQuestion>, String> {
    let items = match obj.get("questions") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) => return Err("quiz has no questions".to_string()),
        Some(_) => return Err("field 'questions' is not a list".to_string()),
        None => return Err("missing field 'questions'".to_string()),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| quiz_question(item).map_err(|reason| format!("questions[{i}]: {reason}")))
        .collect()
}

fn quiz_question(item: &Value) -> Result<QuizQuestion, String> {
    let obj = item.as_object().ok_or("question is not an object")?;
    let options = string_list(obj, "options")?.ok_or("missing field 'options'")?;
    if options.len() < 2 {
        return Err(format!("needs at least 2 options, got {}", options.len()));
    }
    let correct = match obj.get("correct") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
    .ok_or("field 'correct' must be a non-negative option index")?;
    if correct >= options.len() {
        return Err(format!(
            "correct index {correct} out of range for {} options",
            options.len()
        ));
    }
    Ok(QuizQuestion {
        question: required_str(obj, "question")?,
        options,
        correct,
        explanation: optional_str(obj, "explanation")?.unwrap_or_default(),
    })
}

fn required_str(obj: &Map<String, Value>, field: &str) -> Result<String, String> {
    optional_str(obj, field)?.ok_or_else(|| format!("missing field '{field}'"))
}

/// A trimmed, non-empty string; `null` and blank strings count as absent.
fn optional_str(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(format!("field '{field}' is not a string")),
    }
}

fn string_list(obj: &Map<String, Value>, field: &str) -> Result<Option<Vec<String>>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| format!("field '{field}' must contain only strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(format!("field '{field}' is not a list")),
    }
}

/// Non-negative amount; numeric strings such as "£2,000" are accepted.
fn target_amount(obj: &Map<String, Value>) -> Result<Option<f64>, String> {
    let amount = match obj.get("target_amount") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '£' | ',' | ' '))
                .collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned.parse::<f64>().ok()
        }
        Some(_) => None,
    };
    match amount {
        Some(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        _ => Err("field 'target_amount' must be a non-negative number".to_string()),
    }
}

/// Positive integer points; absent points take `default`.
fn points(obj: &Map<String, Value>, default: u32) -> Result<u32, String> {
    let points = match obj.get("points") {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    match points.and_then(|p| u32::try_from(p).ok()) {
        Some(p) if p > 0 => Ok(p),
        _ => Err("field 'points' must be a positive integer".to_string()),
    }
}
