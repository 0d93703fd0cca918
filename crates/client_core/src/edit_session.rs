use chrono::NaiveDate;
use shared::{
    domain::Action,
    protocol::{parse_wire_date, ActionPayload},
};
use tracing::debug;

use crate::{error::NormalizedError, store::ActionStore, transport::ActionTransport};

/// Raw form input. Conversion to a typed payload happens on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    pub description: String,
    pub date: String,
    pub points: String,
}

impl FormValues {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            description: String::new(),
            date: today.format("%Y-%m-%d").to_string(),
            points: String::new(),
        }
    }

    pub fn from_action(action: &Action) -> Self {
        Self {
            description: action.description.clone(),
            date: action.date.format("%Y-%m-%d").to_string(),
            points: action.points.to_string(),
        }
    }

    pub fn to_payload(&self) -> Result<ActionPayload, NormalizedError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(NormalizedError::request_setup(
                "description must not be empty",
            ));
        }
        let date = parse_wire_date(&self.date).ok_or_else(|| {
            NormalizedError::request_setup(format!("invalid date '{}'", self.date))
        })?;
        let points = self
            .points
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|points| points.is_finite())
            .ok_or_else(|| {
                NormalizedError::request_setup(format!("invalid points '{}'", self.points))
            })?;

        Ok(ActionPayload {
            description: description.to_string(),
            date,
            points,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditMode {
    #[default]
    Inactive,
    Active(Action),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Action),
    Updated(Action),
}

impl SubmitOutcome {
    pub fn action(&self) -> &Action {
        match self {
            Self::Created(action) | Self::Updated(action) => action,
        }
    }
}

/// Routes one form to either create or update depending on whether an edit is active.
#[derive(Debug, Default)]
pub struct EditSession {
    mode: EditMode,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn target(&self) -> Option<&Action> {
        match &self.mode {
            EditMode::Active(action) => Some(action),
            EditMode::Inactive => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditMode::Active(_))
    }

    pub fn begin_edit(&mut self, action: Action) -> FormValues {
        debug!(action_id = action.id.0, "edit started");
        let values = FormValues::from_action(&action);
        self.mode = EditMode::Active(action);
        values
    }

    pub fn cancel(&mut self) {
        if let EditMode::Active(action) = &self.mode {
            debug!(action_id = action.id.0, "edit cancelled");
        }
        self.mode = EditMode::Inactive;
    }

    pub fn initial_values(&self, today: NaiveDate) -> FormValues {
        match &self.mode {
            EditMode::Active(action) => FormValues::from_action(action),
            EditMode::Inactive => FormValues::blank(today),
        }
    }

    /// Updates the edit target when one is active, creates otherwise.
    ///
    /// Holding `&mut self` for the whole round trip keeps submissions on one session
    /// strictly sequential. A failed submit leaves the mode unchanged.
    pub async fn submit<T: ActionTransport>(
        &mut self,
        store: &mut ActionStore<T>,
        values: &FormValues,
    ) -> Result<SubmitOutcome, NormalizedError> {
        let payload = values.to_payload()?;

        if let EditMode::Active(target) = &self.mode {
            let action_id = target.id;
            let updated = store.update(action_id, &payload).await?;
            self.mode = EditMode::Inactive;
            return Ok(SubmitOutcome::Updated(updated));
        }

        let created = store.create(&payload).await?;
        Ok(SubmitOutcome::Created(created))
    }
}

#[cfg(test)]
#[path = "tests/edit_session_tests.rs"]
mod tests;
