use serde::{Deserialize, Serialize};

use super::de::{opt_string_or_number, string_or_number};

/// Literal the backend's API explorer leaves behind in unfilled rows.
const PLACEHOLDER_VALUE: &str = "string";

/// The two fee tables managed from the registration-limits view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeLimitKind {
    Registration,
    ProjectBudget,
}

impl FeeLimitKind {
    /// Resource path under the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            FeeLimitKind::Registration => "/registration-fee",
            FeeLimitKind::ProjectBudget => "/project-budget-limit",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FeeLimitKind::Registration => "Registration Fees",
            FeeLimitKind::ProjectBudget => "Project Budget Limits",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            FeeLimitKind::Registration => FeeLimitKind::ProjectBudget,
            FeeLimitKind::ProjectBudget => FeeLimitKind::Registration,
        }
    }
}

/// Account roles a fee can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Writer,
    Employer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Writer, Role::Employer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Writer => "writer",
            Role::Employer => "employer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn next(&self) -> Self {
        match self {
            Role::Writer => Role::Employer,
            Role::Employer => Role::Writer,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeLimit {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub created_at: Option<String>,
}

impl FeeLimit {
    pub fn is_placeholder(&self) -> bool {
        self.role == PLACEHOLDER_VALUE || self.amount == PLACEHOLDER_VALUE
    }

    /// Drop placeholder rows from a freshly fetched list.
    pub fn without_placeholders(limits: Vec<FeeLimit>) -> Vec<FeeLimit> {
        limits.into_iter().filter(|l| !l.is_placeholder()).collect()
    }
}

/// Body of `POST /registration-fee` and `POST /project-budget-limit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeLimitRequest {
    pub role: String,
    pub amount: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_filtered() {
        let limits: Vec<FeeLimit> = serde_json::from_str(
            r#"[{"id": "1", "role": "writer", "amount": "500"},
                {"id": "2", "role": "string", "amount": "100"},
                {"id": "3", "role": "employer", "amount": "string"},
                {"id": 4, "role": "employer", "amount": 750, "createdAt": "2024-01-01"}]"#,
        )
        .unwrap();

        let kept = FeeLimit::without_placeholders(limits);
        let ids: Vec<&str> = kept.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(kept[1].amount, "750");
    }

    #[test]
    fn test_role_parse_and_cycle() {
        assert_eq!(Role::parse("Writer"), Some(Role::Writer));
        assert_eq!(Role::parse("employer"), Some(Role::Employer));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::Writer.next(), Role::Employer);
        assert_eq!(Role::Employer.next(), Role::Writer);
    }

    #[test]
    fn test_kind_paths() {
        assert_eq!(FeeLimitKind::Registration.path(), "/registration-fee");
        assert_eq!(FeeLimitKind::ProjectBudget.path(), "/project-budget-limit");
        assert_eq!(FeeLimitKind::Registration.other(), FeeLimitKind::ProjectBudget);
    }
}
