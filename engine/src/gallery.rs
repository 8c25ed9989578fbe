//! Local model gallery state.
//!
//! Two daemon lists back this screen: models already on disk and models the
//! catalog offers. They are fetched together and refetched together after
//! every install or uninstall; the gallery never edits them locally.

use anvil_types::{AvailableModel, InstalledModel};

use crate::resources::Reconciled;

/// The gallery's payload: both model lists, as one refresh unit.
#[derive(Debug, Clone, Default)]
pub struct GalleryData {
    pub installed: Vec<InstalledModel>,
    pub available: Vec<AvailableModel>,
}

impl GalleryData {
    /// Catalog entries that actually run on this machine. Cloud-backed
    /// entries are configured through the endpoint form, not installed.
    pub fn local_available(&self) -> impl Iterator<Item = &AvailableModel> {
        self.available.iter().filter(|m| !m.runtime_type.is_cloud())
    }
}

/// One selectable line of the gallery, installed models first.
#[derive(Debug, Clone, Copy)]
pub enum GalleryRow<'a> {
    Installed(&'a InstalledModel),
    Available(&'a AvailableModel),
}

/// Cursor, status line, and mirrored lists for the model gallery step.
#[derive(Debug, Clone, Default)]
pub struct ModelGallery {
    data: Reconciled<GalleryData>,
    cursor: usize,
    status: Option<String>,
    recommended: Option<String>,
}

impl ModelGallery {
    /// `recommended` is the model id the system check suggested, if any; the
    /// matching row gets a marker.
    #[must_use]
    pub fn new(recommended: Option<String>) -> Self {
        Self {
            recommended,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_recommended(&self, id: &str) -> bool {
        self.recommended.as_deref() == Some(id)
    }

    #[must_use]
    pub fn data(&self) -> &GalleryData {
        self.data.get()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.data.is_loading()
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.data.error()
    }

    /// Model id with an install or uninstall in flight, if any.
    #[must_use]
    pub fn pending_model(&self) -> Option<&str> {
        self.data.pending_key()
    }

    #[must_use]
    pub fn is_mutating(&self) -> bool {
        self.data.is_mutating()
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn begin_refresh(&mut self) -> u64 {
        self.data.begin_refresh()
    }

    /// Accept a refresh result; stale epochs are dropped. The cursor is
    /// clamped to the new row count.
    pub fn resolve(&mut self, resource: u64, result: Result<GalleryData, String>) -> bool {
        let applied = self.data.resolve(resource, result);
        if applied {
            self.clamp_cursor();
        }
        applied
    }

    pub fn begin_mutation(&mut self, model_id: impl Into<String>) -> bool {
        self.data.begin_mutation(model_id)
    }

    pub fn finish_mutation(&mut self) -> Option<String> {
        self.data.finish_mutation()
    }

    /// Rows in display order: installed models, then installable catalog
    /// entries. Cloud entries and catalog ids that are already installed are
    /// hidden, so no id ever appears twice.
    #[must_use]
    pub fn rows(&self) -> Vec<GalleryRow<'_>> {
        let data = self.data.get();
        data.installed
            .iter()
            .map(GalleryRow::Installed)
            .chain(
                data.local_available()
                    .filter(|m| !data.installed.iter().any(|i| i.model_id == m.id))
                    .map(GalleryRow::Available),
            )
            .collect()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn selected(&self) -> Option<GalleryRow<'_>> {
        self.rows().get(self.cursor).copied()
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let count = self.rows().len();
        if count > 0 && self.cursor + 1 < count {
            self.cursor += 1;
        }
    }

    fn clamp_cursor(&mut self) {
        let count = self.rows().len();
        self.cursor = self.cursor.min(count.saturating_sub(1));
    }
}
