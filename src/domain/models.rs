use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Employee,
}

/// Task lifecycle states. The set is closed: anything else coming off the
/// wire is a validation failure, not a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// What a status transition does to `completed_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    /// Stamp the completion time now.
    Stamp,
    /// Clear any previous completion time.
    Clear,
    /// Leave the existing stamp untouched.
    Keep,
}

/// Decide the `completed_at` side effect for a transition. Re-completing an
/// already completed task keeps its original stamp; entering any
/// non-completed state clears it.
pub fn completion_effect(current: TaskStatus, requested: TaskStatus) -> CompletionEffect {
    match (current, requested) {
        (TaskStatus::Completed, TaskStatus::Completed) => CompletionEffect::Keep,
        (_, TaskStatus::Completed) => CompletionEffect::Stamp,
        (_, _) => CompletionEffect::Clear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completing_stamps() {
        assert_eq!(
            completion_effect(TaskStatus::Pending, TaskStatus::Completed),
            CompletionEffect::Stamp
        );
        assert_eq!(
            completion_effect(TaskStatus::InProgress, TaskStatus::Completed),
            CompletionEffect::Stamp
        );
    }

    #[test]
    fn recompleting_keeps_original_stamp() {
        assert_eq!(
            completion_effect(TaskStatus::Completed, TaskStatus::Completed),
            CompletionEffect::Keep
        );
    }

    #[test]
    fn leaving_completed_clears() {
        assert_eq!(
            completion_effect(TaskStatus::Completed, TaskStatus::Pending),
            CompletionEffect::Clear
        );
        assert_eq!(
            completion_effect(TaskStatus::Completed, TaskStatus::Cancelled),
            CompletionEffect::Clear
        );
    }

    #[test]
    fn non_completed_transitions_clear() {
        assert_eq!(
            completion_effect(TaskStatus::Pending, TaskStatus::InProgress),
            CompletionEffect::Clear
        );
        assert_eq!(
            completion_effect(TaskStatus::Pending, TaskStatus::Pending),
            CompletionEffect::Clear
        );
    }

    #[test]
    fn status_serde_round_trip() {
        let s: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, TaskStatus::InProgress);
        assert!(serde_json::from_str::<TaskStatus>("\"blocked\"").is_err());
    }
}
