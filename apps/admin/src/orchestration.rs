//! Maps operator commands onto controller calls.

use client_core::{NavigationController, SubmitError};
use shared::domain::Method;

use crate::commands::{Command, HELP};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A request is in flight; the view prints once it settles.
    Started,
    Message(String),
    ShowView,
    Quit,
}

pub fn dispatch(nav: &mut NavigationController, cmd: Command) -> Outcome {
    tracing::debug!(?cmd, "dispatching command");
    match cmd {
        Command::Show(row) => {
            let Some(table) = nav.view().table.as_ref() else {
                return Outcome::Message("no table on screen".to_string());
            };
            let link = match row.checked_sub(1).and_then(|index| table.rows.get(index)) {
                Some(entry) => entry.show.clone(),
                None => return Outcome::Message(format!("no row {row}")),
            };
            match link {
                Some(link) => {
                    nav.follow(&link);
                    Outcome::Started
                }
                None => Outcome::Message(format!("row {row} has no item link")),
            }
        }
        Command::Back => match nav.view().navigation.clone() {
            Some(link) => {
                nav.follow(&link);
                Outcome::Started
            }
            None => Outcome::Message("nothing to go back to".to_string()),
        },
        Command::Set { field, value } => match nav.set_field(&field, value) {
            Ok(()) => Outcome::ShowView,
            Err(err) => Outcome::Message(err.to_string()),
        },
        Command::Submit => match nav.submit_current() {
            Ok(()) => Outcome::Started,
            Err(SubmitError::MissingRequired(_)) => Outcome::ShowView,
            Err(err) => Outcome::Message(err.to_string()),
        },
        Command::Delete => {
            let action = nav
                .view()
                .actions
                .iter()
                .find(|action| action.control.method == Method::Delete)
                .cloned();
            match action {
                Some(action) => {
                    nav.invoke(&action);
                    Outcome::Started
                }
                None => Outcome::Message("no delete action on screen".to_string()),
            }
        }
        Command::Reload => {
            nav.reload();
            Outcome::Started
        }
        Command::View => Outcome::ShowView,
        Command::Help => Outcome::Message(HELP.to_string()),
        Command::Quit => Outcome::Quit,
    }
}

#[cfg(test)]
#[path = "tests/orchestration_tests.rs"]
mod tests;
