use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ProgressionError;

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 100;

/// Products a persona can already hold.
pub const AVAILABLE_PRODUCTS: &[&str] = &[
    "Savings Account",
    "Current Account",
    "Credit Card",
    "Investment Account",
    "Loan",
];

/// The user profile that drives content personalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Persona {
    /// Directory key (e.g. "tom_carter")
    pub key: String,
    pub name: String,
    pub age: u32,
    pub occupation: String,
    pub income_range: String,
    pub current_products: Vec<String>,
    pub financial_status: String,
    pub risk_profile: String,
    pub avatar: String,
}

/// Partial profile edit. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_products: Option<Vec<String>>,
}

impl Persona {
    /// Apply a profile update. The update is validated as a whole before
    /// anything is written, so a rejected update leaves the persona unchanged.
    pub fn apply_update(&mut self, update: ProfileUpdate) -> Result<(), ProgressionError> {
        if let Some(age) = update.age {
            if !(MIN_AGE..=MAX_AGE).contains(&age) {
                return Err(invalid(
                    "age",
                    format!("must be between {MIN_AGE} and {MAX_AGE}, got {age}"),
                ));
            }
        }
        let occupation = non_empty("occupation", update.occupation)?;
        let income_range = non_empty("income_range", update.income_range)?;
        if let Some(products) = &update.current_products {
            if let Some(unknown) = products
                .iter()
                .find(|product| !AVAILABLE_PRODUCTS.contains(&product.as_str()))
            {
                return Err(invalid(
                    "current_products",
                    format!("unknown product '{unknown}'"),
                ));
            }
        }

        if let Some(age) = update.age {
            self.age = age;
        }
        if let Some(occupation) = occupation {
            self.occupation = occupation;
        }
        if let Some(income_range) = income_range {
            self.income_range = income_range;
        }
        if let Some(products) = update.current_products {
            let mut deduped: Vec<String> = Vec::with_capacity(products.len());
            for product in products {
                if !deduped.contains(&product) {
                    deduped.push(product);
                }
            }
            self.current_products = deduped;
        }
        Ok(())
    }
}

fn non_empty(field: &str, value: Option<String>) -> Result<Option<String>, ProgressionError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(invalid(field, "must not be empty".to_string())),
        other => Ok(other),
    }
}

fn invalid(field: &str, message: String) -> ProgressionError {
    ProgressionError::InvalidProfile {
        field: field.to_string(),
        message,
    }
}

/// Built-in persona directory.
pub fn builtin_personas() -> Vec<Persona> {
    vec![
        persona(
            "tom_carter",
            "Tom Carter",
            28,
            "Freelance Designer",
            "£35,000-£45,000",
            &["Savings Account"],
            "Emerging Professional",
            "Moderate",
            "🎨",
        ),
        persona(
            "sarah_johnson",
            "Sarah Johnson",
            24,
            "Graduate Trainee",
            "£22,000-£28,000",
            &["Current Account"],
            "Early Career",
            "Conservative",
            "🎓",
        ),
        persona(
            "mike_rodriguez",
            "Mike Rodriguez",
            32,
            "Software Engineer",
            "£55,000-£70,000",
            &["Savings Account", "Credit Card"],
            "Established Professional",
            "Aggressive",
            "💻",
        ),
    ]
}

/// Look up a built-in persona by directory key.
pub fn find_persona(key: &str) -> Result<Persona, ProgressionError> {
    builtin_personas()
        .into_iter()
        .find(|p| p.key == key)
        .ok_or_else(|| ProgressionError::PersonaNotFound(key.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn persona(
    key: &str,
    name: &str,
    age: u32,
    occupation: &str,
    income_range: &str,
    products: &[&str],
    financial_status: &str,
    risk_profile: &str,
    avatar: &str,
) -> Persona {
    Persona {
        key: key.to_string(),
        name: name.to_string(),
        age,
        occupation: occupation.to_string(),
        income_range: income_range.to_string(),
        current_products: products.iter().map(|p| p.to_string()).collect(),
        financial_status: financial_status.to_string(),
        risk_profile: risk_profile.to_string(),
        avatar: avatar.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_contains_three_personas() {
        let keys: Vec<String> = builtin_personas().into_iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["tom_carter", "sarah_johnson", "mike_rodriguez"]);
    }

    #[test]
    fn unknown_persona_is_rejected() {
        let err = find_persona("nobody").expect_err("unknown key must fail");
        assert_eq!(err, ProgressionError::PersonaNotFound("nobody".to_string()));
    }

    #[test]
    fn update_applies_all_fields() {
        let mut tom = find_persona("tom_carter").unwrap();
        tom.apply_update(ProfileUpdate {
            age: Some(35),
            occupation: Some("  Art Director ".to_string()),
            income_range: None,
            current_products: Some(vec![
                "Loan".to_string(),
                "Credit Card".to_string(),
                "Loan".to_string(),
            ]),
        })
        .unwrap();
        assert_eq!(tom.age, 35);
        assert_eq!(tom.occupation, "Art Director");
        assert_eq!(tom.income_range, "£35,000-£45,000");
        assert_eq!(tom.current_products, vec!["Loan", "Credit Card"]);
    }

    #[test]
    fn rejected_update_leaves_persona_untouched() {
        let mut sarah = find_persona("sarah_johnson").unwrap();
        let before = sarah.clone();
        let err = sarah
            .apply_update(ProfileUpdate {
                age: Some(40),
                current_products: Some(vec!["Crypto Wallet".to_string()]),
                ..Default::default()
            })
            .expect_err("unknown product must be rejected");
        assert!(matches!(err, ProgressionError::InvalidProfile { ref field, .. } if field == "current_products"));
        assert_eq!(sarah, before);
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let mut mike = find_persona("mike_rodriguez").unwrap();
        assert!(mike.apply_update(ProfileUpdate { age: Some(18), ..Default::default() }).is_ok());
        assert!(mike.apply_update(ProfileUpdate { age: Some(100), ..Default::default() }).is_ok());
        assert!(mike.apply_update(ProfileUpdate { age: Some(17), ..Default::default() }).is_err());
    }
}
