use serde::{Deserialize, Serialize};

/// Error returned when parsing an [`AppointmentStatus`] from text.
#[derive(Debug, thiserror::Error)]
#[error("unknown appointment status: {0}")]
pub struct StatusParseError(pub String);

/// Appointment lifecycle status.
///
/// The lifecycle moves forward only:
///
/// ```text
/// waiting -> confirmed -> in-progress -> completed
/// waiting | confirmed | in-progress -> cancelled
/// ```
///
/// `completed` and `cancelled` are terminal. Every status write goes
/// through [`AppointmentStatus::can_transition_to`]; there is no
/// free-choice overwrite path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Waiting,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// The statuses this status may move to next.
    pub fn valid_transitions(self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Waiting => {
                &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::InProgress, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::InProgress => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            // Terminal states
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    ///
    /// Re-asserting the current status is not a transition; callers treat
    /// it as a no-op rather than routing it through this table.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Waiting => "waiting",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(AppointmentStatus::Waiting),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "in-progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(StatusParseError(other.to_owned())),
        }
    }
}
