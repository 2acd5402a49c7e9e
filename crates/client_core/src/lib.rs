//! Hypermedia-driven admin engine.
//!
//! Starting from one entry URL, every link, form and submission target is discovered
//! from the `@controls` the server returns. The pieces, leaves first:
//!
//! - [`fetcher`]: GET/POST/PUT/DELETE against the API, split into success or [`FetchError`].
//! - [`controls`]: resolves relations and describes forms from control schemas.
//! - [`render`]: pure functions from representations to [`ViewUpdate`] values.
//! - [`navigation`]: the controller that owns the [`ViewModel`] and runs the loop.

pub mod controls;
pub mod fetcher;
pub mod navigation;
pub mod render;

pub use controls::{describe_form, resolve, FieldDescriptor, Hypermedia, RelationNames};
pub use fetcher::{HttpFetcher, ResourceFetcher, SendOutcome};
pub use navigation::{serialize_form, Completion, NavigationController, Phase, SubmitError};
pub use render::{
    append_item, render_collection, render_item, render_notification, row_for, ActionAffordance,
    FormField, FormPurpose, FormView, LinkAffordance, Notification, NotificationKind,
    RenderOptions, RenderTarget, Row, TableView, ViewModel, ViewUpdate,
};
pub use shared::error::FetchError;
