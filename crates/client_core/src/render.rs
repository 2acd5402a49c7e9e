//! Pure view rendering.
//!
//! Render functions never touch shared state: each returns a [`ViewUpdate`] describing
//! which output slots to overwrite, and the navigation controller applies it to the one
//! [`ViewModel`] it owns. Slots are replaced wholesale, never merged.

use shared::{
    domain::FieldKind,
    protocol::{Collection, Control, Representation},
};

use crate::controls::{describe_form, resolve, RelationNames};

/// Renderer bound to a link when the link is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Collection,
    Item,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkAffordance {
    pub label: String,
    pub control: Control,
    pub target: RenderTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<String>,
    pub show: Option<LinkAffordance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    /// Business field names, one per column.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPurpose {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub readonly: bool,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub purpose: FormPurpose,
    pub title: Option<String>,
    pub control: Control,
    pub fields: Vec<FormField>,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|field| field.name == name)
    }
}

/// A body-less action such as delete.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionAffordance {
    pub label: String,
    pub control: Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    pub navigation: Option<LinkAffordance>,
    pub table: Option<TableView>,
    pub form: Option<FormView>,
    pub actions: Vec<ActionAffordance>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotUpdate<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> SlotUpdate<T> {
    fn apply_to(self, slot: &mut Option<T>) {
        match self {
            SlotUpdate::Keep => {}
            SlotUpdate::Clear => *slot = None,
            SlotUpdate::Set(value) => *slot = Some(value),
        }
    }
}

impl<T> From<Option<T>> for SlotUpdate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => SlotUpdate::Set(value),
            None => SlotUpdate::Clear,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableUpdate {
    Keep,
    Clear,
    Replace(TableView),
    Append(Row),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewUpdate {
    pub navigation: SlotUpdate<LinkAffordance>,
    pub table: TableUpdate,
    pub form: SlotUpdate<FormView>,
    pub actions: SlotUpdate<Vec<ActionAffordance>>,
    pub notification: SlotUpdate<Notification>,
}

impl Default for ViewUpdate {
    fn default() -> Self {
        Self {
            navigation: SlotUpdate::Keep,
            table: TableUpdate::Keep,
            form: SlotUpdate::Keep,
            actions: SlotUpdate::Keep,
            notification: SlotUpdate::Keep,
        }
    }
}

impl ViewModel {
    pub fn apply(&mut self, update: ViewUpdate) {
        update.navigation.apply_to(&mut self.navigation);
        match update.table {
            TableUpdate::Keep => {}
            TableUpdate::Clear => self.table = None,
            TableUpdate::Replace(table) => self.table = Some(table),
            TableUpdate::Append(row) => match self.table.as_mut() {
                Some(table) => table.rows.push(row),
                None => tracing::debug!("no table on screen; dropping appended row"),
            },
        }
        update.form.apply_to(&mut self.form);
        match update.actions {
            SlotUpdate::Keep => {}
            SlotUpdate::Clear => self.actions.clear(),
            SlotUpdate::Set(actions) => self.actions = actions,
        }
        update.notification.apply_to(&mut self.notification);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub relations: RelationNames,
    /// Read-only field appended to the edit form when the resource carries it.
    pub derived_field: Option<String>,
    /// Fixed table columns. Empty means every field the items carry, first-seen order.
    pub columns: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            relations: RelationNames::default(),
            derived_field: Some("location".into()),
            columns: Vec::new(),
        }
    }
}

pub fn render_collection(collection: &Collection, options: &RenderOptions) -> ViewUpdate {
    let columns = if options.columns.is_empty() {
        collection_columns(collection)
    } else {
        options.columns.clone()
    };
    let rows = collection
        .items
        .iter()
        .map(|item| row_for(item, &columns, &options.relations))
        .collect();
    let form = resolve(collection, &options.relations.add_item)
        .map(|control| form_for(control, FormPurpose::Create, None));

    ViewUpdate {
        navigation: SlotUpdate::Clear,
        table: TableUpdate::Replace(TableView { columns, rows }),
        form: form.into(),
        actions: SlotUpdate::Clear,
        notification: SlotUpdate::Keep,
    }
}

pub fn render_item(resource: &Representation, options: &RenderOptions) -> ViewUpdate {
    let relations = &options.relations;
    let navigation = resolve(resource, &relations.collection).map(|control| LinkAffordance {
        label: "collection".to_string(),
        control: control.clone(),
        target: RenderTarget::Collection,
    });

    let form = resolve(resource, &relations.edit).map(|control| {
        let mut form = form_for(control, FormPurpose::Edit, Some(resource));
        if let Some(derived) = options.derived_field.as_deref() {
            if resource.has_field(derived) && form.field(derived).is_none() {
                form.fields.push(FormField {
                    name: derived.to_string(),
                    label: field_label(derived),
                    kind: FieldKind::String,
                    required: false,
                    readonly: true,
                    value: resource.field_text(derived).unwrap_or_default(),
                });
            }
        }
        form
    });

    let actions = resolve(resource, &relations.delete)
        .map(|control| ActionAffordance {
            label: control.title.clone().unwrap_or_else(|| "delete".to_string()),
            control: control.clone(),
        })
        .into_iter()
        .collect::<Vec<_>>();

    ViewUpdate {
        navigation: navigation.into(),
        table: TableUpdate::Clear,
        form: form.into(),
        actions: SlotUpdate::Set(actions),
        notification: SlotUpdate::Keep,
    }
}

pub fn render_notification(message: impl Into<String>, kind: NotificationKind) -> ViewUpdate {
    ViewUpdate {
        notification: SlotUpdate::Set(Notification {
            kind,
            message: message.into(),
        }),
        ..ViewUpdate::default()
    }
}

/// One table row; the "show" link is omitted when the item has no self relation.
pub fn row_for(item: &Representation, columns: &[String], relations: &RelationNames) -> Row {
    Row {
        cells: columns
            .iter()
            .map(|column| item.field_text(column).unwrap_or_default())
            .collect(),
        show: resolve(item, &relations.self_rel).map(|control| LinkAffordance {
            label: "show".to_string(),
            control: control.clone(),
            target: RenderTarget::Item,
        }),
    }
}

/// Table change for a newly created item. With derived columns, fields the table has
/// not shown yet widen it and earlier rows are padded with empty cells.
pub fn append_item(
    table: &TableView,
    item: &Representation,
    options: &RenderOptions,
) -> TableUpdate {
    let unseen: Vec<String> = if options.columns.is_empty() {
        item.fields
            .keys()
            .filter(|name| !table.columns.contains(name))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    if unseen.is_empty() {
        return TableUpdate::Append(row_for(item, &table.columns, &options.relations));
    }

    let mut widened = table.clone();
    widened.columns.extend(unseen);
    let width = widened.columns.len();
    for row in &mut widened.rows {
        row.cells.resize(width, String::new());
    }
    let row = row_for(item, &widened.columns, &options.relations);
    widened.rows.push(row);
    TableUpdate::Replace(widened)
}

pub fn form_for(
    control: &Control,
    purpose: FormPurpose,
    prefill: Option<&Representation>,
) -> FormView {
    let fields = describe_form(control)
        .into_iter()
        .map(|descriptor| FormField {
            value: prefill
                .and_then(|resource| resource.field_text(&descriptor.name))
                .unwrap_or_default(),
            name: descriptor.name,
            label: descriptor.description,
            kind: descriptor.kind,
            required: descriptor.required,
            readonly: false,
        })
        .collect();

    FormView {
        purpose,
        title: control.title.clone(),
        control: control.clone(),
        fields,
    }
}

/// Column header text for a field name, e.g. `location` -> `Location`.
pub fn field_label(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn collection_columns(collection: &Collection) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for item in &collection.items {
        for name in item.fields.keys() {
            if !columns.iter().any(|column| column == name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
