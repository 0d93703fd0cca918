use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use shared::{
    domain::{Action, ActionId},
    protocol::ActionPayload,
};

use crate::transport::{ActionTransport, TransportFailure};

#[derive(Default)]
struct FakeBackend {
    actions: Vec<Action>,
    next_id: i64,
    failures: Vec<(&'static str, TransportFailure)>,
    calls: Vec<&'static str>,
}

/// In-process stand-in for the actions backend with one-shot failure injection.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    inner: Arc<Mutex<FakeBackend>>,
}

impl FakeTransport {
    pub(crate) fn with_actions(actions: Vec<Action>) -> Self {
        let next_id = actions.iter().map(|action| action.id.0).max().unwrap_or(0) + 1;
        Self {
            inner: Arc::new(Mutex::new(FakeBackend {
                actions,
                next_id,
                ..FakeBackend::default()
            })),
        }
    }

    /// The next call to `operation` fails with `failure`.
    pub(crate) fn fail_next(&self, operation: &'static str, failure: TransportFailure) {
        self.inner
            .lock()
            .expect("lock")
            .failures
            .push((operation, failure));
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().expect("lock").calls.clone()
    }

    pub(crate) fn server_actions(&self) -> Vec<Action> {
        self.inner.lock().expect("lock").actions.clone()
    }

    fn begin(&self, operation: &'static str) -> Result<(), TransportFailure> {
        let mut backend = self.inner.lock().expect("lock");
        backend.calls.push(operation);
        if let Some(index) = backend
            .failures
            .iter()
            .position(|(name, _)| *name == operation)
        {
            let (_, failure) = backend.failures.remove(index);
            return Err(failure);
        }
        Ok(())
    }
}

fn not_found(action_id: ActionId) -> TransportFailure {
    TransportFailure::response(
        404,
        Some(json!({ "code": "not_found", "message": format!("action {action_id} not found") })),
        "not found",
    )
}

#[async_trait]
impl ActionTransport for FakeTransport {
    async fn list(&self) -> Result<Vec<Action>, TransportFailure> {
        self.begin("list")?;
        Ok(self.server_actions())
    }

    async fn create(&self, payload: &ActionPayload) -> Result<Action, TransportFailure> {
        self.begin("create")?;
        let mut backend = self.inner.lock().expect("lock");
        let action = Action {
            id: ActionId(backend.next_id.max(1)),
            description: payload.description.clone(),
            date: payload.date,
            points: payload.points,
        };
        backend.next_id = action.id.0 + 1;
        backend.actions.push(action.clone());
        Ok(action)
    }

    async fn update(
        &self,
        action_id: ActionId,
        payload: &ActionPayload,
    ) -> Result<Action, TransportFailure> {
        self.begin("update")?;
        let mut backend = self.inner.lock().expect("lock");
        let action = backend
            .actions
            .iter_mut()
            .find(|action| action.id == action_id)
            .ok_or_else(|| not_found(action_id))?;
        action.description = payload.description.clone();
        action.date = payload.date;
        action.points = payload.points;
        Ok(action.clone())
    }

    async fn delete(&self, action_id: ActionId) -> Result<(), TransportFailure> {
        self.begin("delete")?;
        let mut backend = self.inner.lock().expect("lock");
        let before = backend.actions.len();
        backend.actions.retain(|action| action.id != action_id);
        if backend.actions.len() == before {
            return Err(not_found(action_id));
        }
        Ok(())
    }
}

pub(crate) fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).expect("date")
}

pub(crate) fn action(id: i64, description: &str, points: f64) -> Action {
    Action {
        id: ActionId(id),
        description: description.to_string(),
        date: day(2024, 5, 1),
        points,
    }
}

pub(crate) fn payload(description: &str, date: NaiveDate, points: f64) -> ActionPayload {
    ActionPayload {
        description: description.to_string(),
        date,
        points,
    }
}

pub(crate) fn unreachable_failure() -> TransportFailure {
    TransportFailure::no_response("connection refused")
}
