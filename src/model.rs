//! Domain documents stored in the backend.
//!
//! Field names on the wire are camelCase, matching the document schema the
//! backend collections use (`uid`, `createdAt`, `firstName`, ...). A task is
//! "open" while `status` is true; completing it flips `status` to false.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Task priority, as picked from the priority sheet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    Urgent,
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(Priority::Urgent),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(Error::InvalidArgument(format!(
                "unknown priority '{other}' (expected urgent, normal, or low)"
            ))),
        }
    }
}

/// Reminder lead time before a task's deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Reminder {
    #[serde(rename = "30 minutes")]
    ThirtyMinutes,
    #[serde(rename = "1 hour")]
    OneHour,
    #[serde(rename = "2 hours")]
    TwoHours,
}

impl Reminder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reminder::ThirtyMinutes => "30 minutes",
            Reminder::OneHour => "1 hour",
            Reminder::TwoHours => "2 hours",
        }
    }
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reminder {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "30 minutes" | "30m" => Ok(Reminder::ThirtyMinutes),
            "1 hour" | "1h" => Ok(Reminder::OneHour),
            "2 hours" | "2h" => Ok(Reminder::TwoHours),
            other => Err(Error::InvalidArgument(format!(
                "unknown reminder '{other}' (expected 30m, 1h, or 2h)"
            ))),
        }
    }
}

/// A to-do item owned by a single identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    /// Owning identity; a task is only visible to the session whose
    /// identity matches this field.
    pub uid: String,
    pub text: String,
    /// true = open, false = done.
    pub status: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Reminder>,
}

impl Task {
    /// A task is overdue once its deadline is strictly in the past.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.deadline.map(|deadline| deadline < today).unwrap_or(false)
    }
}

/// The profile document paired with an identity at registration.
/// Exactly one per identity; the store rejects a second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub uid: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub email: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_wire_names() {
        for (priority, wire) in [
            (Priority::Urgent, "\"Urgent\""),
            (Priority::Normal, "\"Normal\""),
            (Priority::Low, "\"Low\""),
        ] {
            assert_eq!(serde_json::to_string(&priority).unwrap(), wire);
            let parsed: Priority = serde_json::from_str(wire).unwrap();
            assert_eq!(parsed, priority);
        }
    }

    #[test]
    fn reminder_uses_human_wire_names() {
        assert_eq!(
            serde_json::to_string(&Reminder::ThirtyMinutes).unwrap(),
            "\"30 minutes\""
        );
        assert_eq!("1h".parse::<Reminder>().unwrap(), Reminder::OneHour);
        assert!("yearly".parse::<Reminder>().is_err());
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = Task {
            id: "t1".to_string(),
            uid: "u1".to_string(),
            text: "water the plants".to_string(),
            status: true,
            created_at: Utc::now(),
            deadline: None,
            priority: Some(Priority::Low),
            reminder: None,
        };
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("deadline").is_none());
        assert_eq!(json["priority"], "Low");
    }

    #[test]
    fn overdue_is_strictly_past() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let mut task = Task {
            id: "t1".to_string(),
            uid: "u1".to_string(),
            text: "file taxes".to_string(),
            status: true,
            created_at: Utc::now(),
            deadline: Some(today),
            priority: None,
            reminder: None,
        };
        assert!(!task.is_overdue(today));
        task.deadline = Some(today.pred_opt().unwrap());
        assert!(task.is_overdue(today));
        task.deadline = None;
        assert!(!task.is_overdue(today));
    }
}
