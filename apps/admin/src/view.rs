//! Plain-text rendering of the view model.

use std::fmt::Write as _;

use client_core::{FormPurpose, FormView, NotificationKind, TableView, ViewModel};

pub fn render_text(view: &ViewModel) -> String {
    let mut out = String::new();

    if let Some(notification) = &view.notification {
        let tag = match notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        let _ = writeln!(out, "[{tag}] {}", notification.message);
    }
    if let Some(link) = &view.navigation {
        let _ = writeln!(out, "<- {} (back)", link.label);
    }
    if let Some(table) = &view.table {
        write_table(&mut out, table);
    }
    if let Some(form) = &view.form {
        write_form(&mut out, form);
    }
    for action in &view.actions {
        let _ = writeln!(out, "action: {} [{} {}]", action.label, action.control.method, action.control.href);
    }
    if out.is_empty() {
        out.push_str("(nothing to show)\n");
    }
    out
}

fn write_table(out: &mut String, table: &TableView) {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", client_core::render::field_label(column)))
        .collect();
    let _ = writeln!(out, "  #  {}", header.join("  ").trim_end());

    for (index, row) in table.rows.iter().enumerate() {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        let marker = if row.show.is_some() { ">" } else { " " };
        let _ = writeln!(out, "{marker}{:>2}  {}", index + 1, cells.join("  ").trim_end());
    }
    if table.rows.is_empty() {
        let _ = writeln!(out, "  (no items)");
    }
}

fn write_form(out: &mut String, form: &FormView) {
    let heading = form.title.clone().unwrap_or_else(|| match form.purpose {
        FormPurpose::Create => "New item".to_string(),
        FormPurpose::Edit => "Edit".to_string(),
    });
    let _ = writeln!(out, "{heading} [{} {}]", form.control.method, form.control.href);
    for field in &form.fields {
        let mut flags = Vec::new();
        if field.required {
            flags.push("required");
        }
        if field.readonly {
            flags.push("read-only");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        let _ = writeln!(
            out,
            "  {} = {:?}  -- {}{flags}",
            field.name, field.value, field.label
        );
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
