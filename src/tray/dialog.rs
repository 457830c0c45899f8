use std::sync::Arc;

use crate::storage::entities::EntryDraft;

/// Why the dialog was opened. Only reminders touch the countdown when the dialog resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOrigin {
    Reminder,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogField {
    Description,
    Project,
    TaskType,
}

impl DialogField {
    fn next(self) -> Self {
        match self {
            DialogField::Description => DialogField::Project,
            DialogField::Project => DialogField::TaskType,
            DialogField::TaskType => DialogField::Description,
        }
    }

    fn previous(self) -> Self {
        match self {
            DialogField::Description => DialogField::TaskType,
            DialogField::Project => DialogField::Description,
            DialogField::TaskType => DialogField::Project,
        }
    }
}

/// Input the dialog understands. Terminal keys are mapped onto these by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogInput {
    Char(char),
    Backspace,
    NextField,
    PreviousField,
    Up,
    Down,
    /// Enter.
    Confirm,
    /// Esc.
    Dismiss,
    /// Ctrl+S.
    Snooze,
    /// Window closed some other way.
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogResolution {
    Save(EntryDraft),
    Skip,
    Snooze,
}

/// Shown under the fields. A failed save keeps the dialog open with everything typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogStatus {
    DescriptionRequired,
    SaveFailed(String),
}

/// State of an open "what did you work on" prompt. Holds pending input only, saving is done by
/// the controller.
#[derive(Debug, Clone)]
pub struct EntryDialog {
    origin: DialogOrigin,
    description: String,
    project: String,
    task_types: Arc<[String]>,
    task_type: usize,
    projects: Vec<String>,
    focus: DialogField,
    status: Option<DialogStatus>,
}

impl EntryDialog {
    /// `task_type` is preselected if it is one of `task_types`, otherwise the first one is.
    pub fn new(
        origin: DialogOrigin,
        project: String,
        task_type: &str,
        task_types: Arc<[String]>,
        projects: Vec<String>,
    ) -> Self {
        let task_type = task_types.iter().position(|v| v == task_type).unwrap_or(0);
        Self {
            origin,
            description: String::new(),
            project,
            task_types,
            task_type,
            projects,
            focus: DialogField::Description,
            status: None,
        }
    }

    pub fn origin(&self) -> DialogOrigin {
        self.origin
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn task_type(&self) -> &str {
        self.task_types
            .get(self.task_type)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn focus(&self) -> DialogField {
        self.focus
    }

    pub fn status(&self) -> Option<&DialogStatus> {
        self.status.as_ref()
    }

    pub fn draft(&self) -> EntryDraft {
        EntryDraft::new(&self.project, self.task_type(), &self.description)
    }

    /// Keeps the dialog open after the store refused the entry.
    pub fn save_failed(&mut self, reason: String) {
        self.status = Some(DialogStatus::SaveFailed(reason));
    }

    /// Applies one input. Returns a resolution when the dialog should close, except for `Save`
    /// which only closes once the controller managed to write the entry.
    pub fn handle(&mut self, input: DialogInput) -> Option<DialogResolution> {
        match input {
            DialogInput::Confirm => {
                let draft = self.draft();
                if draft.has_description() {
                    return Some(DialogResolution::Save(draft));
                }
                self.status = Some(DialogStatus::DescriptionRequired);
                self.focus = DialogField::Description;
            }
            DialogInput::Dismiss | DialogInput::Close => return Some(DialogResolution::Skip),
            DialogInput::Snooze => return Some(DialogResolution::Snooze),
            DialogInput::NextField => self.focus = self.focus.next(),
            DialogInput::PreviousField => self.focus = self.focus.previous(),
            DialogInput::Up => self.cycle(-1),
            DialogInput::Down => self.cycle(1),
            DialogInput::Char(c) => match self.focus {
                DialogField::Description => self.description.push(c),
                DialogField::Project => self.project.push(c),
                DialogField::TaskType => self.jump_to_task_type(c),
            },
            DialogInput::Backspace => match self.focus {
                DialogField::Description => {
                    self.description.pop();
                }
                DialogField::Project => {
                    self.project.pop();
                }
                DialogField::TaskType => {}
            },
        }
        None
    }

    fn cycle(&mut self, step: isize) {
        match self.focus {
            DialogField::Description => {}
            DialogField::Project => {
                if self.projects.is_empty() {
                    return;
                }
                let len = self.projects.len() as isize;
                let next = match self.projects.iter().position(|v| *v == self.project) {
                    Some(current) => (current as isize + step).rem_euclid(len),
                    None if step > 0 => 0,
                    None => len - 1,
                };
                self.project = self.projects[next as usize].clone();
            }
            DialogField::TaskType => {
                if self.task_types.is_empty() {
                    return;
                }
                let len = self.task_types.len() as isize;
                self.task_type = (self.task_type as isize + step).rem_euclid(len) as usize;
            }
        }
    }

    /// Typing a letter on the task type selects the next type starting with it.
    fn jump_to_task_type(&mut self, c: char) {
        let c = c.to_lowercase().to_string();
        let len = self.task_types.len();
        if let Some(found) = (1..=len)
            .map(|offset| (self.task_type + offset) % len)
            .find(|i| self.task_types[*i].to_lowercase().starts_with(&c))
        {
            self.task_type = found;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::storage::entities::EntryDraft;

    use super::{
        DialogField, DialogInput, DialogOrigin, DialogResolution, DialogStatus, EntryDialog,
    };

    fn task_types() -> Arc<[String]> {
        ["Development", "Meeting", "Review"]
            .iter()
            .map(|v| v.to_string())
            .collect()
    }

    fn dialog() -> EntryDialog {
        EntryDialog::new(
            DialogOrigin::Reminder,
            "ProjX".into(),
            "Meeting",
            task_types(),
            vec!["ProjX".into(), "ProjY".into()],
        )
    }

    fn type_text(dialog: &mut EntryDialog, text: &str) {
        for c in text.chars() {
            assert_eq!(dialog.handle(DialogInput::Char(c)), None);
        }
    }

    #[test]
    fn test_defaults_come_from_last_used_values() {
        let dialog = dialog();
        assert_eq!(dialog.project(), "ProjX");
        assert_eq!(dialog.task_type(), "Meeting");
        assert_eq!(dialog.focus(), DialogField::Description);
        assert_eq!(dialog.status(), None);
    }

    #[test]
    fn test_unknown_last_task_type_falls_back_to_first() {
        let dialog = EntryDialog::new(
            DialogOrigin::Manual,
            String::new(),
            "Gardening",
            task_types(),
            vec![],
        );
        assert_eq!(dialog.task_type(), "Development");
    }

    #[test]
    fn test_enter_with_empty_description_stays_open() {
        let mut dialog = dialog();
        type_text(&mut dialog, "   ");

        assert_eq!(dialog.handle(DialogInput::Confirm), None);
        assert_eq!(dialog.status(), Some(&DialogStatus::DescriptionRequired));
    }

    #[test]
    fn test_enter_saves_typed_entry() {
        let mut dialog = dialog();
        type_text(&mut dialog, "fix parserx");
        dialog.handle(DialogInput::Backspace);

        assert_eq!(
            dialog.handle(DialogInput::Confirm),
            Some(DialogResolution::Save(EntryDraft::new(
                "ProjX",
                "Meeting",
                "fix parser"
            )))
        );
    }

    #[test]
    fn test_escape_skips_and_ctrl_s_snoozes() {
        assert_eq!(
            dialog().handle(DialogInput::Dismiss),
            Some(DialogResolution::Skip)
        );
        assert_eq!(
            dialog().handle(DialogInput::Snooze),
            Some(DialogResolution::Snooze)
        );
    }

    #[test]
    fn test_ambiguous_close_is_a_skip() {
        let mut dialog = dialog();
        type_text(&mut dialog, "half typed");
        assert_eq!(
            dialog.handle(DialogInput::Close),
            Some(DialogResolution::Skip)
        );
    }

    #[test]
    fn test_fields_are_edited_where_focus_is() {
        let mut dialog = dialog();
        dialog.handle(DialogInput::NextField);
        assert_eq!(dialog.focus(), DialogField::Project);
        for _ in 0.."ProjX".len() {
            dialog.handle(DialogInput::Backspace);
        }
        type_text(&mut dialog, "Infra");
        assert_eq!(dialog.project(), "Infra");

        dialog.handle(DialogInput::Down);
        assert_eq!(dialog.project(), "ProjX");
        dialog.handle(DialogInput::Up);
        assert_eq!(dialog.project(), "ProjY");

        dialog.handle(DialogInput::NextField);
        dialog.handle(DialogInput::Down);
        assert_eq!(dialog.task_type(), "Review");
        dialog.handle(DialogInput::Down);
        assert_eq!(dialog.task_type(), "Development");
        type_text(&mut dialog, "m");
        assert_eq!(dialog.task_type(), "Meeting");

        dialog.handle(DialogInput::PreviousField);
        dialog.handle(DialogInput::PreviousField);
        assert_eq!(dialog.focus(), DialogField::Description);
    }

    #[test]
    fn test_failed_save_keeps_pending_input() {
        let mut dialog = dialog();
        type_text(&mut dialog, "wrote docs");
        let Some(DialogResolution::Save(_)) = dialog.handle(DialogInput::Confirm) else {
            panic!("expected a save");
        };

        dialog.save_failed("disk full".into());

        assert_eq!(dialog.description(), "wrote docs");
        assert_eq!(
            dialog.status(),
            Some(&DialogStatus::SaveFailed("disk full".into()))
        );
    }
}
