use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Appointment status state machine.
///
/// Terminal states are checked first so mutations of closed appointments
/// always surface as [`AppointmentError::Closed`] rather than a generic
/// invalid transition.
pub struct AppointmentLifecycle;

impl AppointmentLifecycle {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_transition(
        &self,
        current: AppointmentStatus,
        new: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current, new);

        if current.is_terminal() {
            warn!("Mutation attempted on closed appointment ({})", current);
            return Err(AppointmentError::Closed);
        }

        if !self.valid_transitions(current).contains(&new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(AppointmentError::InvalidTransition { from: current, to: new });
        }

        Ok(())
    }

    pub fn valid_transitions(&self, current: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::InProgress, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::InProgress => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            // Terminal states, no outbound transitions.
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }
}

impl Default for AppointmentLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn normal_flow_is_accepted() {
        let lifecycle = AppointmentLifecycle::new();

        for (from, to) in [
            (AppointmentStatus::Scheduled, AppointmentStatus::Confirmed),
            (AppointmentStatus::Confirmed, AppointmentStatus::InProgress),
            (AppointmentStatus::InProgress, AppointmentStatus::Completed),
        ] {
            assert!(lifecycle.validate_transition(from, to).is_ok());
        }
    }

    #[test]
    fn any_active_status_may_cancel() {
        let lifecycle = AppointmentLifecycle::new();

        for from in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
        ] {
            assert!(lifecycle
                .validate_transition(from, AppointmentStatus::Cancelled)
                .is_ok());
        }
    }

    #[test]
    fn terminal_states_reject_everything_as_closed() {
        let lifecycle = AppointmentLifecycle::new();

        for from in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            for to in [
                AppointmentStatus::Scheduled,
                AppointmentStatus::Confirmed,
                AppointmentStatus::InProgress,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ] {
                assert_matches!(
                    lifecycle.validate_transition(from, to),
                    Err(AppointmentError::Closed)
                );
            }
        }
    }

    #[test]
    fn skipping_straight_to_completed_is_rejected() {
        let lifecycle = AppointmentLifecycle::new();

        assert_matches!(
            lifecycle
                .validate_transition(AppointmentStatus::Scheduled, AppointmentStatus::Completed),
            Err(AppointmentError::InvalidTransition { .. })
        );
    }

    #[test]
    fn scheduled_may_jump_to_in_progress() {
        // A doctor can start a walk-in consultation without an explicit
        // confirmation step.
        let lifecycle = AppointmentLifecycle::new();

        assert!(lifecycle
            .validate_transition(AppointmentStatus::Scheduled, AppointmentStatus::InProgress)
            .is_ok());
    }
}
