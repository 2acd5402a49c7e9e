use super::*;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use shared::protocol::Control;
use tokio::sync::{oneshot, Mutex};

use crate::render::{FormPurpose, NotificationKind, RenderTarget};

#[derive(Debug, Clone, PartialEq)]
struct RecordedCall {
    method: Method,
    href: String,
    body: Option<Value>,
}

/// In-memory fetcher: canned responses per href, optional gates to hold a response back.
#[derive(Default)]
struct ScriptedFetcher {
    reads: std::sync::Mutex<HashMap<String, Result<Value, FetchError>>>,
    writes: std::sync::Mutex<HashMap<String, Result<SendOutcome, FetchError>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedFetcher {
    fn with_read(self, href: &str, body: Value) -> Self {
        self.reads
            .lock()
            .expect("reads")
            .insert(href.to_string(), Ok(body));
        self
    }

    fn with_read_error(self, href: &str, err: FetchError) -> Self {
        self.reads
            .lock()
            .expect("reads")
            .insert(href.to_string(), Err(err));
        self
    }

    fn with_write(self, href: &str, outcome: Result<SendOutcome, FetchError>) -> Self {
        self.writes
            .lock()
            .expect("writes")
            .insert(href.to_string(), outcome);
        self
    }

    async fn gate(&self, href: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().await.insert(href.to_string(), rx);
        tx
    }

    async fn wait_for_gate(&self, href: &str) {
        let gate = self.gates.lock().await.remove(href);
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }

    async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, href: &str) -> Result<Representation, FetchError> {
        self.calls.lock().await.push(RecordedCall {
            method: Method::Get,
            href: href.to_string(),
            body: None,
        });
        self.wait_for_gate(href).await;
        let scripted = self.reads.lock().expect("reads").get(href).cloned();
        match scripted {
            Some(Ok(body)) => Representation::from_value(body).map_err(|source| FetchError::Decode {
                href: href.to_string(),
                source,
            }),
            Some(Err(err)) => Err(err),
            None => Err(FetchError::Protocol {
                href: href.to_string(),
                status: 404,
                message: Some("Not found".to_string()),
                details: Vec::new(),
            }),
        }
    }

    async fn send(
        &self,
        href: &str,
        method: Method,
        payload: Option<&Map<String, Value>>,
    ) -> Result<SendOutcome, FetchError> {
        self.calls.lock().await.push(RecordedCall {
            method,
            href: href.to_string(),
            body: payload.map(|p| Value::Object(p.clone())),
        });
        self.wait_for_gate(href).await;
        self.writes
            .lock()
            .expect("writes")
            .get(href)
            .cloned()
            .unwrap_or(Ok(SendOutcome {
                status: 204,
                location: None,
            }))
    }
}

fn sensor_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name", "model"],
        "properties": {
            "name": {"description": "Sensor's unique name", "type": "string"},
            "model": {"description": "Name of the sensor's model", "type": "string"}
        }
    })
}

fn sensors_collection() -> Value {
    json!({
        "@controls": {
            "self": {"href": "/api/sensors/"},
            "senhub:add-sensor": {"href": "/api/sensors/", "method": "POST", "schema": sensor_schema()}
        },
        "items": [
            {"name": "uo-donkeysensor-1", "model": "donkeysensor2000", "location": "donkey",
             "@controls": {"self": {"href": "/api/sensors/uo-donkeysensor-1/"}}},
            {"name": "uo-imagingsensor-1", "model": "imagingsensor3000", "location": "lab",
             "@controls": {"self": {"href": "/api/sensors/uo-imagingsensor-1/"}}}
        ]
    })
}

fn sensor_42() -> Value {
    json!({
        "name": "TempSensor",
        "model": "TMP100",
        "location": null,
        "@controls": {
            "self": {"href": "/api/sensors/42/"},
            "collection": {"href": "/api/sensors/"},
            "edit": {"href": "/api/sensors/42/", "method": "PUT", "schema": sensor_schema()},
            "senhub:delete": {"href": "/api/sensors/42/", "method": "DELETE"}
        }
    })
}

fn controller(fetcher: &Arc<ScriptedFetcher>) -> NavigationController {
    let dyn_fetcher: Arc<dyn ResourceFetcher> = fetcher.clone();
    NavigationController::new(dyn_fetcher, "/api/sensors/", RenderOptions::default())
}

async fn bootstrapped(fetcher: &Arc<ScriptedFetcher>) -> NavigationController {
    let mut nav = controller(fetcher);
    nav.bootstrap();
    nav.settle().await;
    nav
}

fn show_link(nav: &NavigationController, row: usize) -> LinkAffordance {
    nav.view().table.as_ref().expect("table").rows[row]
        .show
        .clone()
        .expect("show link")
}

#[tokio::test]
async fn bootstrap_renders_root_collection() {
    let fetcher = Arc::new(ScriptedFetcher::default().with_read("/api/sensors/", sensors_collection()));
    let mut nav = controller(&fetcher);
    assert_eq!(nav.phase(), Phase::Idle);

    nav.bootstrap();
    assert_eq!(nav.phase(), Phase::Fetching);
    nav.settle().await;

    assert_eq!(nav.phase(), Phase::Rendered);
    let table = nav.view().table.as_ref().expect("table");
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].cells[0], "uo-donkeysensor-1");
    assert_eq!(
        nav.view().form.as_ref().expect("form").purpose,
        FormPurpose::Create
    );
    assert_eq!(fetcher.calls().await.len(), 1);
}

#[tokio::test]
async fn create_posts_fields_and_appends_fetched_row() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", sensors_collection())
            .with_read("/api/sensors/42/", sensor_42())
            .with_write(
                "/api/sensors/",
                Ok(SendOutcome {
                    status: 201,
                    location: Some("/api/sensors/42/".to_string()),
                }),
            ),
    );
    let mut nav = bootstrapped(&fetcher).await;

    nav.set_field("name", "TempSensor").expect("name");
    nav.set_field("model", "TMP100").expect("model");
    nav.submit_current().expect("submit");
    nav.settle().await;

    let calls = fetcher.calls().await;
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].method, Method::Post);
    assert_eq!(calls[1].href, "/api/sensors/");
    assert_eq!(
        serde_json::to_string(calls[1].body.as_ref().expect("body")).expect("json"),
        r#"{"name":"TempSensor","model":"TMP100"}"#
    );
    assert_eq!(calls[2].method, Method::Get);
    assert_eq!(calls[2].href, "/api/sensors/42/");

    let table = nav.view().table.as_ref().expect("table");
    assert_eq!(table.rows.len(), 3);
    assert_eq!(table.rows[2].cells, vec!["TempSensor", "TMP100", ""]);
    assert_eq!(
        table.rows[2].show.as_ref().expect("show").control.href,
        "/api/sensors/42/"
    );
    assert!(nav.view().notification.is_none());
}

#[tokio::test]
async fn edit_puts_fields_and_reports_success() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", sensors_collection())
            .with_read("/api/sensors/42/", sensor_42()),
    );
    let mut nav = controller(&fetcher);
    nav.follow(&LinkAffordance {
        label: "show".into(),
        control: Control::link("/api/sensors/42/"),
        target: RenderTarget::Item,
    });
    nav.settle().await;

    nav.set_field("model", "TMP102").expect("model");
    assert_eq!(
        nav.set_field("location", "attic"),
        Err(SubmitError::ReadOnlyField("location".into()))
    );
    nav.submit_current().expect("submit");
    nav.settle().await;

    let calls = fetcher.calls().await;
    let put = calls.last().expect("put");
    assert_eq!(put.method, Method::Put);
    assert_eq!(put.href, "/api/sensors/42/");
    assert_eq!(
        put.body.as_ref().expect("body"),
        &json!({"name": "TempSensor", "model": "TMP102"})
    );

    let note = nav.view().notification.as_ref().expect("notification");
    assert_eq!(note.kind, NotificationKind::Success);
    assert_eq!(note.message, SUCCESS_MESSAGE);
}

#[tokio::test]
async fn server_error_shows_message_and_leaves_view_untouched() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", sensors_collection())
            .with_write(
                "/api/sensors/",
                Err(FetchError::Protocol {
                    href: "/api/sensors/".into(),
                    status: 400,
                    message: Some("Name is required".into()),
                    details: Vec::new(),
                }),
            ),
    );
    let mut nav = bootstrapped(&fetcher).await;
    nav.set_field("name", "x").expect("name");
    nav.set_field("model", "y").expect("model");
    let before_table = nav.view().table.clone();
    let before_form = nav.view().form.clone();

    nav.submit_current().expect("submit");
    nav.settle().await;

    assert_eq!(nav.phase(), Phase::ErrorDisplayed);
    let note = nav.view().notification.as_ref().expect("notification");
    assert_eq!(note.kind, NotificationKind::Error);
    assert_eq!(note.message, "Name is required");
    assert_eq!(nav.view().table, before_table);
    assert_eq!(nav.view().form, before_form);
}

#[tokio::test]
async fn missing_required_field_is_rejected_locally() {
    let fetcher = Arc::new(ScriptedFetcher::default().with_read("/api/sensors/", sensors_collection()));
    let mut nav = bootstrapped(&fetcher).await;
    nav.set_field("name", "only-name").expect("name");

    let err = nav.submit_current().expect_err("must reject");
    assert_eq!(err, SubmitError::MissingRequired(vec!["model".into()]));
    assert_eq!(nav.in_flight(), 0);
    assert_eq!(fetcher.calls().await.len(), 1, "nothing was sent");
    assert_eq!(
        nav.view().notification.as_ref().expect("notification").message,
        "Missing required field: model"
    );
}

#[tokio::test]
async fn follow_switches_to_item_view_and_back() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", sensors_collection())
            .with_read("/api/sensors/uo-donkeysensor-1/", sensor_42()),
    );
    let mut nav = bootstrapped(&fetcher).await;

    nav.follow(&show_link(&nav, 0));
    nav.settle().await;

    assert!(nav.view().table.is_none());
    assert_eq!(
        nav.view().form.as_ref().expect("form").purpose,
        FormPurpose::Edit
    );
    let back = nav.view().navigation.clone().expect("navigation");
    assert_eq!(back.target, RenderTarget::Collection);
    assert_eq!(nav.view().actions.len(), 1);

    nav.follow(&back);
    nav.settle().await;
    assert_eq!(nav.view().table.as_ref().expect("table").rows.len(), 2);
    assert!(nav.view().navigation.is_none());
    assert!(nav.view().actions.is_empty());
}

#[tokio::test]
async fn renderer_is_chosen_by_binding_not_payload_shape() {
    let fetcher = Arc::new(ScriptedFetcher::default().with_read("/api/sensors/", sensors_collection()));
    let mut nav = controller(&fetcher);

    nav.follow(&LinkAffordance {
        label: "show".into(),
        control: Control::link("/api/sensors/"),
        target: RenderTarget::Item,
    });
    nav.settle().await;

    assert!(nav.view().table.is_none(), "item renderer never draws a table");
}

#[tokio::test]
async fn collection_binding_on_item_payload_is_a_decode_error() {
    let fetcher = Arc::new(ScriptedFetcher::default().with_read("/api/sensors/42/", sensor_42()));
    let mut nav = controller(&fetcher);

    nav.follow(&LinkAffordance {
        label: "collection".into(),
        control: Control::link("/api/sensors/42/"),
        target: RenderTarget::Collection,
    });
    nav.settle().await;

    assert_eq!(nav.phase(), Phase::ErrorDisplayed);
    assert_eq!(
        nav.view().notification.as_ref().expect("notification").message,
        "Malformed response from server"
    );
}

#[tokio::test]
async fn network_failure_is_terminal_only_for_that_action() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", sensors_collection())
            .with_read_error(
                "/api/sensors/uo-donkeysensor-1/",
                FetchError::Network {
                    href: "/api/sensors/uo-donkeysensor-1/".into(),
                    reason: "connection reset".into(),
                },
            )
            .with_read("/api/sensors/uo-imagingsensor-1/", sensor_42()),
    );
    let mut nav = bootstrapped(&fetcher).await;

    nav.follow(&show_link(&nav, 0));
    nav.settle().await;
    assert_eq!(nav.phase(), Phase::ErrorDisplayed);
    assert_eq!(
        nav.view().notification.as_ref().expect("notification").message,
        "Could not reach the server"
    );
    assert_eq!(nav.view().table.as_ref().expect("table").rows.len(), 2);

    nav.follow(&show_link(&nav, 1));
    assert_eq!(nav.phase(), Phase::Fetching);
    nav.settle().await;
    assert_eq!(nav.phase(), Phase::Rendered);
    assert!(nav.view().table.is_none());
}

#[tokio::test]
async fn overlapping_navigations_last_completion_wins() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", sensors_collection())
            .with_read("/api/sensors/uo-donkeysensor-1/", sensor_42()),
    );
    let mut nav = bootstrapped(&fetcher).await;
    let release_item = fetcher.gate("/api/sensors/uo-donkeysensor-1/").await;

    // Issued first, completes last.
    nav.follow(&show_link(&nav, 0));
    // Issued second, completes first.
    nav.follow(&LinkAffordance {
        label: "collection".into(),
        control: Control::link("/api/sensors/"),
        target: RenderTarget::Collection,
    });
    assert_eq!(nav.in_flight(), 2);

    let first = nav.next_completion().await.expect("collection completion");
    assert!(matches!(first, Completion::Fetched { target: RenderTarget::Collection, .. }));
    nav.apply(first);
    assert_eq!(nav.phase(), Phase::Fetching);
    assert!(nav.view().table.is_some());

    release_item.send(()).expect("release");
    nav.settle().await;

    assert!(nav.view().table.is_none(), "stale item response overwrote the collection");
    assert_eq!(
        nav.view().form.as_ref().expect("form").purpose,
        FormPurpose::Edit
    );
}

#[tokio::test]
async fn delete_action_sends_without_body() {
    let fetcher = Arc::new(ScriptedFetcher::default().with_read("/api/sensors/42/", sensor_42()));
    let mut nav = controller(&fetcher);
    nav.follow(&LinkAffordance {
        label: "show".into(),
        control: Control::link("/api/sensors/42/"),
        target: RenderTarget::Item,
    });
    nav.settle().await;

    let action = nav.view().actions[0].clone();
    nav.invoke(&action);
    nav.settle().await;

    let last = fetcher.calls().await.pop().expect("call");
    assert_eq!(last.method, Method::Delete);
    assert!(last.body.is_none());
    assert_eq!(
        nav.view().notification.as_ref().expect("notification").kind,
        NotificationKind::Success
    );
}

#[test]
fn serialize_form_types_values_by_schema() {
    let control: Control = serde_json::from_value(json!({
        "href": "/api/sensors/42/measurements/",
        "method": "POST",
        "schema": {
            "required": ["value"],
            "properties": {
                "value": {"description": "Measured value.", "type": "number"},
                "count": {"type": "integer"},
                "active": {"type": "boolean"},
                "note": {"type": "string"},
                "time": {"type": "string"}
            }
        }
    }))
    .expect("control");
    let mut form = crate::render::form_for(&control, FormPurpose::Create, None);
    for (name, value) in [("value", "21.5"), ("count", "3"), ("active", "TRUE"), ("note", "42")] {
        form.field_mut(name).expect("field").value = value.to_string();
    }

    let payload = serialize_form(&form);
    assert_eq!(
        Value::Object(payload),
        json!({"value": 21.5, "count": 3, "active": true, "note": "42"})
    );
}

#[test]
fn serialize_form_keeps_unparseable_values_as_strings() {
    let control: Control = serde_json::from_value(json!({
        "href": "/x/",
        "method": "POST",
        "schema": {"properties": {"count": {"type": "integer"}}, "required": ["count"]}
    }))
    .expect("control");
    let mut form = crate::render::form_for(&control, FormPurpose::Create, None);
    form.field_mut("count").expect("field").value = "many".into();

    assert_eq!(
        Value::Object(serialize_form(&form)),
        json!({"count": "many"})
    );
}

#[tokio::test]
async fn reload_refetches_current_location_with_its_binding() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", sensors_collection())
            .with_read("/api/sensors/uo-donkeysensor-1/", sensor_42()),
    );
    let mut nav = bootstrapped(&fetcher).await;
    nav.follow(&show_link(&nav, 0));
    nav.settle().await;

    let mut changed = sensor_42();
    changed["model"] = json!("TMP102");
    fetcher
        .reads
        .lock()
        .expect("reads")
        .insert("/api/sensors/uo-donkeysensor-1/".to_string(), Ok(changed));

    nav.reload();
    nav.settle().await;

    let form = nav.view().form.as_ref().expect("form");
    assert_eq!(form.purpose, FormPurpose::Edit);
    assert_eq!(form.field("model").expect("model").value, "TMP102");
    let calls = fetcher.calls().await;
    assert_eq!(
        calls.last().map(|c| c.href.as_str()),
        Some("/api/sensors/uo-donkeysensor-1/")
    );
}

#[tokio::test]
async fn create_into_empty_collection_shows_the_new_item() {
    let mut empty = sensors_collection();
    empty["items"] = json!([]);
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .with_read("/api/sensors/", empty)
            .with_read("/api/sensors/42/", sensor_42())
            .with_write(
                "/api/sensors/",
                Ok(SendOutcome {
                    status: 201,
                    location: Some("/api/sensors/42/".to_string()),
                }),
            ),
    );
    let mut nav = bootstrapped(&fetcher).await;
    assert!(nav.view().table.as_ref().expect("table").rows.is_empty());

    nav.set_field("name", "TempSensor").expect("name");
    nav.set_field("model", "TMP100").expect("model");
    nav.submit_current().expect("submit");
    nav.settle().await;

    let table = nav.view().table.as_ref().expect("table");
    assert_eq!(table.columns, vec!["name", "model", "location"]);
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].cells, vec!["TempSensor", "TMP100", ""]);
}

#[tokio::test]
async fn dismissing_an_error_returns_to_idle() {
    let fetcher = Arc::new(ScriptedFetcher::default().with_read_error(
        "/api/sensors/",
        FetchError::Network {
            href: "/api/sensors/".into(),
            reason: "connection refused".into(),
        },
    ));
    let mut nav = bootstrapped(&fetcher).await;
    assert_eq!(nav.phase(), Phase::ErrorDisplayed);

    nav.dismiss_notification();
    assert_eq!(nav.phase(), Phase::Idle);
    assert!(nav.view().notification.is_none());

    nav.reload();
    assert_eq!(nav.phase(), Phase::Fetching);
    nav.settle().await;
    assert_eq!(nav.phase(), Phase::ErrorDisplayed);
}

#[tokio::test]
async fn dismissing_while_a_request_is_in_flight_keeps_fetching() {
    let fetcher = Arc::new(ScriptedFetcher::default().with_read("/api/sensors/", sensors_collection()));
    let release = fetcher.gate("/api/sensors/").await;
    let mut nav = controller(&fetcher);

    nav.bootstrap();
    nav.dismiss_notification();
    assert_eq!(nav.phase(), Phase::Fetching);

    let _ = release.send(());
    nav.settle().await;
    assert_eq!(nav.phase(), Phase::Rendered);
}
