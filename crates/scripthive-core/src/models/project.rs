use serde::{Deserialize, Serialize};

use super::de::{number_or_string, string_or_number};
use super::StatusKind;

/// A script/project posted by an employer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub project_title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub due_time: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub payment_budget: f64,
    #[serde(default)]
    pub repository_url: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default)]
    pub hosting: String,
}

impl Project {
    pub fn status_kind(&self) -> StatusKind {
        StatusKind::classify(self.status.as_deref())
    }

    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("Unknown")
    }

    /// "2024-06-01 17:00", "2024-06-01" or "N/A".
    pub fn due_display(&self) -> String {
        match (&self.due_date, &self.due_time) {
            (Some(date), Some(time)) => format!("{} {}", date, time),
            (Some(date), None) => date.clone(),
            _ => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project() {
        let p: Project = serde_json::from_str(
            r#"{"id": 3, "projectTitle": "Landing page", "category": "Web", "status": null,
                "dueDate": "2024-06-01", "dueTime": null, "paymentBudget": 2500,
                "repositoryUrl": "https://git.example/p", "deployment": "Docker", "hosting": "VPS"}"#,
        )
        .unwrap();
        assert_eq!(p.id, "3");
        assert_eq!(p.status_label(), "Unknown");
        assert_eq!(p.status_kind(), StatusKind::Other);
        assert_eq!(p.due_display(), "2024-06-01");
        assert_eq!(p.payment_budget, 2500.0);
    }
}
