//! Navigation controller: owns the view model and turns user actions into requests.
//!
//! Every action spawns exactly one task. Tasks report back through an unbounded
//! completion channel and the controller applies completions in arrival order, so
//! overlapping requests race: whichever completes last overwrites the slots it renders.
//! Nothing is cancelled, correlated, or retried.

use std::sync::Arc;

use serde_json::{Map, Number, Value};
use shared::{
    domain::{FieldKind, Method},
    error::FetchError,
    protocol::{Collection, Representation},
};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    fetcher::{ResourceFetcher, SendOutcome},
    render::{
        append_item, render_collection, render_item, render_notification, ActionAffordance,
        FormView, LinkAffordance, NotificationKind, RenderOptions, RenderTarget, ViewModel,
        ViewUpdate,
    },
};

pub const SUCCESS_MESSAGE: &str = "Successful";

/// `Idle -> Fetching -> Rendered`; a failure moves to `ErrorDisplayed`, which returns
/// to `Idle` once dismissed or to `Fetching` when the next request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Rendered,
    ErrorDisplayed,
}

/// Result of one spawned request, delivered back to the controller.
#[derive(Debug)]
pub enum Completion {
    Fetched {
        href: String,
        target: RenderTarget,
        result: Result<Representation, FetchError>,
    },
    /// A write answered with `Location`; `result` is the fetched new resource.
    Created {
        href: String,
        result: Result<Representation, FetchError>,
    },
    Sent {
        href: String,
        method: Method,
        result: Result<SendOutcome, FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Missing required field: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
    #[error("no form is on screen")]
    NoForm,
    #[error("form has no field named '{0}'")]
    UnknownField(String),
    #[error("field '{0}' is read-only")]
    ReadOnlyField(String),
}

pub struct NavigationController {
    fetcher: Arc<dyn ResourceFetcher>,
    entry_href: String,
    location: (String, RenderTarget),
    options: RenderOptions,
    view: ViewModel,
    phase: Phase,
    in_flight: usize,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl NavigationController {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        entry_href: impl Into<String>,
        options: RenderOptions,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let entry_href = entry_href.into();
        Self {
            fetcher,
            location: (entry_href.clone(), RenderTarget::Collection),
            entry_href,
            options,
            view: ViewModel::default(),
            phase: Phase::Idle,
            in_flight: 0,
            completions_tx,
            completions_rx,
        }
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Fetches the entry address and renders it as the root collection.
    pub fn bootstrap(&mut self) {
        let href = self.entry_href.clone();
        info!(%href, "bootstrapping from entry point");
        self.location = (href.clone(), RenderTarget::Collection);
        self.spawn_fetch(href, RenderTarget::Collection);
    }

    /// Fetches the link target and renders it with the renderer bound to the link.
    pub fn follow(&mut self, link: &LinkAffordance) {
        info!(href = %link.control.href, target = ?link.target, "following link");
        self.location = (link.control.href.clone(), link.target);
        self.spawn_fetch(link.control.href.clone(), link.target);
    }

    /// Fetches the last navigated-to address again with the same binding.
    pub fn reload(&mut self) {
        let (href, target) = self.location.clone();
        info!(%href, "reloading");
        self.spawn_fetch(href, target);
    }

    /// Updates a value in the form currently on screen.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), SubmitError> {
        let form = self.view.form.as_mut().ok_or(SubmitError::NoForm)?;
        let field = form
            .field_mut(name)
            .ok_or_else(|| SubmitError::UnknownField(name.to_string()))?;
        if field.readonly {
            return Err(SubmitError::ReadOnlyField(name.to_string()));
        }
        field.value = value.into();
        Ok(())
    }

    /// Submits the form currently on screen.
    pub fn submit_current(&mut self) -> Result<(), SubmitError> {
        let form = self.view.form.clone().ok_or(SubmitError::NoForm)?;
        self.submit(&form)
    }

    /// Sends the form's values through its control. Missing required values are
    /// reported locally and nothing is sent.
    pub fn submit(&mut self, form: &FormView) -> Result<(), SubmitError> {
        let missing = missing_required(form);
        if !missing.is_empty() {
            let err = SubmitError::MissingRequired(missing);
            warn!(href = %form.control.href, %err, "form rejected before sending");
            self.view
                .apply(render_notification(err.to_string(), NotificationKind::Error));
            self.phase = Phase::ErrorDisplayed;
            return Err(err);
        }

        let payload = serialize_form(form);
        let href = form.control.href.clone();
        let method = form.control.method;
        info!(%href, %method, fields = payload.len(), "submitting form");

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        self.begin_request();
        tokio::spawn(async move {
            let completion = match fetcher.send(&href, method, Some(&payload)).await {
                Ok(SendOutcome {
                    location: Some(location),
                    ..
                }) => {
                    debug!(%location, "following creation location");
                    let result = fetcher.fetch(&location).await;
                    Completion::Created {
                        href: location,
                        result,
                    }
                }
                result => Completion::Sent {
                    href,
                    method,
                    result,
                },
            };
            let _ = tx.send(completion);
        });
        Ok(())
    }

    /// Sends a body-less request through an action control.
    pub fn invoke(&mut self, action: &ActionAffordance) {
        let href = action.control.href.clone();
        let method = action.control.method;
        info!(%href, %method, "invoking action");

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        self.begin_request();
        tokio::spawn(async move {
            let result = fetcher.send(&href, method, None).await;
            let _ = tx.send(Completion::Sent {
                href,
                method,
                result,
            });
        });
    }

    /// Clears the notification slot. An error with nothing left in flight returns to `Idle`.
    pub fn dismiss_notification(&mut self) {
        self.view.notification = None;
        if self.phase == Phase::ErrorDisplayed && self.in_flight == 0 {
            self.phase = Phase::Idle;
        }
    }

    /// Waits for the next finished request. Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }
        self.completions_rx.recv().await
    }

    /// Applies every request issued so far, in completion order.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.next_completion().await {
            self.apply(completion);
        }
    }

    pub fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let update = match completion {
            Completion::Fetched {
                href,
                target,
                result,
            } => result.and_then(|rep| self.render_fetched(&href, target, rep)),
            Completion::Created { href, result } => result.map(|rep| {
                debug!(%href, "appending created resource");
                self.append_row(&rep)
            }),
            Completion::Sent {
                href,
                method,
                result,
            } => result.map(|outcome| {
                debug!(%href, %method, status = outcome.status, "write accepted");
                render_notification(SUCCESS_MESSAGE, NotificationKind::Success)
            }),
        };

        match update {
            Ok(update) => {
                self.view.apply(update);
                self.phase = if self.in_flight > 0 {
                    Phase::Fetching
                } else {
                    Phase::Rendered
                };
            }
            Err(err) => {
                warn!(error = %err, "request failed");
                self.view
                    .apply(render_notification(err.user_message(), NotificationKind::Error));
                self.phase = Phase::ErrorDisplayed;
            }
        }
    }

    fn render_fetched(
        &self,
        href: &str,
        target: RenderTarget,
        rep: Representation,
    ) -> Result<ViewUpdate, FetchError> {
        match target {
            RenderTarget::Collection => {
                let collection =
                    Collection::try_from(rep).map_err(|source| FetchError::Decode {
                        href: href.to_string(),
                        source,
                    })?;
                Ok(render_collection(&collection, &self.options))
            }
            RenderTarget::Item => Ok(render_item(&rep, &self.options)),
        }
    }

    fn append_row(&self, rep: &Representation) -> ViewUpdate {
        let Some(table) = self.view.table.as_ref() else {
            return ViewUpdate::default();
        };
        ViewUpdate {
            table: append_item(table, rep, &self.options),
            ..ViewUpdate::default()
        }
    }

    fn spawn_fetch(&mut self, href: String, target: RenderTarget) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        self.begin_request();
        tokio::spawn(async move {
            let result = fetcher.fetch(&href).await;
            let _ = tx.send(Completion::Fetched {
                href,
                target,
                result,
            });
        });
    }

    fn begin_request(&mut self) {
        self.in_flight += 1;
        self.phase = Phase::Fetching;
    }
}

fn missing_required(form: &FormView) -> Vec<String> {
    form.fields
        .iter()
        .filter(|field| field.required && !field.readonly && field.value.trim().is_empty())
        .map(|field| field.name.clone())
        .collect()
}

/// Flat JSON object keyed by schema property names. Read-only fields are skipped,
/// empty optional fields omitted, and values typed by their schema kind when they parse.
pub fn serialize_form(form: &FormView) -> Map<String, Value> {
    let mut payload = Map::new();
    for field in form.fields.iter().filter(|field| !field.readonly) {
        if field.value.is_empty() && !field.required {
            continue;
        }
        payload.insert(field.name.clone(), typed_value(&field.kind, &field.value));
    }
    payload
}

fn typed_value(kind: &FieldKind, raw: &str) -> Value {
    let trimmed = raw.trim();
    let typed = match kind {
        FieldKind::Integer => trimmed.parse::<i64>().ok().map(Value::from),
        FieldKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        FieldKind::String | FieldKind::Other(_) => None,
    };
    typed.unwrap_or_else(|| Value::String(raw.to_string()))
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
