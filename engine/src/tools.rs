//! Tool server gallery state.
//!
//! The daemon lists registered servers by id only; commands and args exist
//! at registration time. Inspecting a server fetches its tools fresh every
//! time, and the pane is blanked the moment the selection changes so one
//! server's tools are never shown under another's name.

use anvil_types::{NonEmptyString, Tool, ToolServer};

use crate::form::FieldEditor;
use crate::resources::Reconciled;

/// Which part of the screen receives keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolFocus {
    /// The registered server list.
    #[default]
    Servers,
    /// Registration form: server id.
    Id,
    /// Registration form: launch command.
    Command,
    /// Registration form: arguments, whitespace separated.
    Args,
}

impl ToolFocus {
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            ToolFocus::Servers => ToolFocus::Id,
            ToolFocus::Id => ToolFocus::Command,
            ToolFocus::Command => ToolFocus::Args,
            ToolFocus::Args => ToolFocus::Servers,
        }
    }

    #[must_use]
    pub fn prev(self) -> Self {
        match self {
            ToolFocus::Servers => ToolFocus::Args,
            ToolFocus::Id => ToolFocus::Servers,
            ToolFocus::Command => ToolFocus::Id,
            ToolFocus::Args => ToolFocus::Command,
        }
    }
}

/// Server list, registration form, and tools pane for the tool gallery step.
#[derive(Debug, Clone)]
pub struct ToolGallery {
    servers: Reconciled<Vec<String>>,
    tools: Reconciled<Vec<Tool>>,
    /// Server whose tools the pane shows (or is loading).
    inspected: Option<String>,
    cursor: usize,
    focus: ToolFocus,
    id_field: FieldEditor,
    command_field: FieldEditor,
    args_field: FieldEditor,
    status: Option<String>,
}

impl Default for ToolGallery {
    fn default() -> Self {
        Self {
            servers: Reconciled::new(),
            tools: Reconciled::new(),
            inspected: None,
            cursor: 0,
            focus: ToolFocus::default(),
            id_field: FieldEditor::new(),
            // Most tool servers launch through npx.
            command_field: FieldEditor::with_text("npx"),
            args_field: FieldEditor::new(),
            status: None,
        }
    }
}

impl ToolGallery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Server list
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn servers(&self) -> &[String] {
        self.servers.get()
    }

    #[must_use]
    pub fn servers_loading(&self) -> bool {
        self.servers.is_loading()
    }

    #[must_use]
    pub fn servers_error(&self) -> Option<&str> {
        self.servers.error()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn selected_server(&self) -> Option<&str> {
        self.servers.get().get(self.cursor).map(String::as_str)
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let count = self.servers.get().len();
        if count > 0 && self.cursor + 1 < count {
            self.cursor += 1;
        }
    }

    pub fn begin_servers_refresh(&mut self) -> u64 {
        self.servers.begin_refresh()
    }

    pub fn resolve_servers(&mut self, resource: u64, result: Result<Vec<String>, String>) -> bool {
        let applied = self.servers.resolve(resource, result);
        if applied {
            let count = self.servers.get().len();
            self.cursor = self.cursor.min(count.saturating_sub(1));
        }
        applied
    }

    // ------------------------------------------------------------------------
    // Registration form
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn focus(&self) -> ToolFocus {
        self.focus
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    #[must_use]
    pub fn id_field(&self) -> &FieldEditor {
        &self.id_field
    }

    #[must_use]
    pub fn command_field(&self) -> &FieldEditor {
        &self.command_field
    }

    #[must_use]
    pub fn args_field(&self) -> &FieldEditor {
        &self.args_field
    }

    /// The editor under focus, or `None` when the server list has focus.
    pub fn active_field_mut(&mut self) -> Option<&mut FieldEditor> {
        match self.focus {
            ToolFocus::Servers => None,
            ToolFocus::Id => Some(&mut self.id_field),
            ToolFocus::Command => Some(&mut self.command_field),
            ToolFocus::Args => Some(&mut self.args_field),
        }
    }

    /// Build the registration from the form. `None` when id or command is
    /// blank; args split on whitespace, empty args allowed.
    #[must_use]
    pub fn registration(&self) -> Option<ToolServer> {
        let id = NonEmptyString::new(self.id_field.text()).ok()?;
        let command = NonEmptyString::new(self.command_field.text()).ok()?;
        let args = self
            .args_field
            .text()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        Some(ToolServer::new(id, command, args))
    }

    /// After a successful registration: clear id and args, keep the command
    /// so registering several servers with the same launcher stays fast.
    pub fn reset_registration_form(&mut self) {
        self.id_field.set_text("");
        self.args_field.set_text("");
    }

    pub fn begin_add(&mut self, server_id: impl Into<String>) -> bool {
        self.servers.begin_mutation(server_id)
    }

    pub fn finish_add(&mut self) -> Option<String> {
        self.servers.finish_mutation()
    }

    #[must_use]
    pub fn is_adding(&self) -> bool {
        self.servers.is_mutating()
    }

    // ------------------------------------------------------------------------
    // Tools pane
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn inspected(&self) -> Option<&str> {
        self.inspected.as_deref()
    }

    #[must_use]
    pub fn tools(&self) -> &[Tool] {
        self.tools.get()
    }

    #[must_use]
    pub fn tools_loading(&self) -> bool {
        self.tools.is_loading()
    }

    #[must_use]
    pub fn tools_error(&self) -> Option<&str> {
        self.tools.error()
    }

    /// Point the tools pane at `server_id`. The pane blanks immediately;
    /// whatever was loading for the previous selection becomes stale.
    pub fn begin_tools_fetch(&mut self, server_id: impl Into<String>) -> u64 {
        self.inspected = Some(server_id.into());
        self.tools.begin_refresh_cleared()
    }

    pub fn resolve_tools(&mut self, resource: u64, result: Result<Vec<Tool>, String>) -> bool {
        self.tools.resolve(resource, result)
    }

    // ------------------------------------------------------------------------
    // Status line
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }
}
