//! Editing session with debounced auto-save.
//!
//! A [`Session`] owns the [`Project`] being edited and the
//! [`SnapshotStore`] its snapshots go to. Every edit goes through a named
//! operation that mutates the project and (re)schedules a snapshot `delay`
//! into the future. A rejected operation changes nothing and leaves the
//! schedule alone. Only the latest schedule counts: a burst of edits
//! produces one save, of the final state.
//!
//! The session has no timer of its own. The caller drives it with
//! [`poll`](Session::poll), passing the current instant, and calls
//! [`flush`](Session::flush) before shutting down.
//!
//! A snapshot that fails (typically [`StorageError::Capacity`]) is reported
//! to the caller and dropped. The in-memory project is never rolled back.

use crate::media::SceneSource;
use crate::project::{Hotspot, Project, ProjectError, Scene, ViewParameters};
use crate::storage::{self, SnapshotHandle, SnapshotStore, StorageError};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Default quiet period between the last edit and the auto-save.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

pub struct Session<S: SnapshotStore> {
    project: Project,
    store: S,
    delay: Duration,
    due: Option<Instant>,
}

impl<S: SnapshotStore> Session<S> {
    pub fn new(project: Project, store: S) -> Self {
        Self {
            project,
            store,
            delay: DEFAULT_DELAY,
            due: None,
        }
    }

    /// Resume from the last snapshot in `store`, or start an empty project.
    pub fn restore(store: S) -> Result<Self, StorageError> {
        let project = storage::load(&store)?.unwrap_or_default();
        Ok(Self::new(project, store))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    /// When the pending auto-save is due, if one is scheduled.
    pub fn pending(&self) -> Option<Instant> {
        self.due
    }

    /// Apply `edit` and schedule a snapshot `delay` after `now`.
    pub fn edit_at<T>(&mut self, now: Instant, edit: impl FnOnce(&mut Project) -> T) -> T {
        let result = edit(&mut self.project);
        self.due = Some(now + self.delay);
        result
    }

    fn edit<T>(&mut self, edit: impl FnOnce(&mut Project) -> T) -> T {
        self.edit_at(Instant::now(), edit)
    }

    /// Like [`edit`](Self::edit), but a rejected operation leaves the
    /// schedule as it was.
    fn try_edit<T>(
        &mut self,
        edit: impl FnOnce(&mut Project) -> Result<T, ProjectError>,
    ) -> Result<T, ProjectError> {
        let result = edit(&mut self.project)?;
        self.due = Some(Instant::now() + self.delay);
        Ok(result)
    }

    /// Save if the pending snapshot is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Result<Option<SnapshotHandle>, StorageError> {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                self.save().map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Save now, cancelling any pending schedule.
    pub fn flush(&mut self) -> Result<SnapshotHandle, StorageError> {
        self.due = None;
        self.save()
    }

    fn save(&mut self) -> Result<SnapshotHandle, StorageError> {
        match storage::save(&mut self.store, &self.project) {
            Ok(handle) => {
                debug!("Snapshot saved ({handle})");
                Ok(handle)
            }
            Err(e) => {
                warn!("Snapshot not saved: {e}");
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Named operations
    // ------------------------------------------------------------------

    /// Add a scene and select it. Returns the new scene id.
    pub fn create_scene(&mut self, source: SceneSource) -> String {
        self.edit(|p| source.add_to(p))
    }

    pub fn delete_scene(&mut self, scene_id: &str) -> Result<Scene, ProjectError> {
        self.try_edit(|p| p.delete_scene(scene_id))
    }

    pub fn rename_scene(&mut self, scene_id: &str, name: &str) -> Result<(), ProjectError> {
        self.try_edit(|p| p.rename_scene(scene_id, name))
    }

    pub fn set_initial_view(
        &mut self,
        scene_id: &str,
        view: ViewParameters,
    ) -> Result<(), ProjectError> {
        self.try_edit(|p| p.set_initial_view(scene_id, view))
    }

    pub fn select_scene(&mut self, index: usize) -> Result<(), ProjectError> {
        self.try_edit(|p| p.select_scene(index))
    }

    pub fn add_hotspot(&mut self, scene_id: &str, hotspot: Hotspot) -> Result<(), ProjectError> {
        self.try_edit(|p| p.add_hotspot(scene_id, hotspot))
    }

    pub fn update_hotspot(&mut self, scene_id: &str, hotspot: Hotspot) -> Result<(), ProjectError> {
        self.try_edit(|p| p.update_hotspot(scene_id, hotspot))
    }

    pub fn delete_hotspot(
        &mut self,
        scene_id: &str,
        hotspot_id: &str,
    ) -> Result<Hotspot, ProjectError> {
        self.try_edit(|p| p.delete_hotspot(scene_id, hotspot_id))
    }

    /// Replace the whole project, e.g. after importing a file.
    pub fn replace_project(&mut self, project: Project) {
        self.edit(|p| *p = project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::url_scene;
    use crate::storage::{MemoryStore, SNAPSHOT_LIMIT};
    use crate::test_helpers::two_scene_project;

    fn session() -> Session<MemoryStore> {
        Session::new(Project::new(), MemoryStore::new())
    }

    fn rename(session: &mut Session<MemoryStore>, at: Instant, name: &str) {
        session.edit_at(at, |p| {
            let id = p.scenes[0].id.clone();
            p.rename_scene(&id, name).unwrap();
        });
    }

    #[test]
    fn save_waits_for_delay() {
        let mut session = Session::new(two_scene_project(), MemoryStore::new());
        let t0 = Instant::now();
        rename(&mut session, t0, "Lobby");

        assert_eq!(session.poll(t0 + Duration::from_millis(1999)).unwrap(), None);
        assert!(session.store().payload().is_none());

        assert!(session.poll(t0 + DEFAULT_DELAY).unwrap().is_some());
        assert!(session.store().payload().unwrap().contains("Lobby"));
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn last_write_wins() {
        let mut session = Session::new(two_scene_project(), MemoryStore::new());
        let t0 = Instant::now();
        rename(&mut session, t0, "First");
        rename(&mut session, t0 + Duration::from_millis(1500), "Second");

        // the first schedule was superseded
        assert_eq!(session.poll(t0 + DEFAULT_DELAY).unwrap(), None);
        assert!(session.poll(t0 + Duration::from_millis(3500)).unwrap().is_some());

        let saved = storage::load(session.store()).unwrap().unwrap();
        assert_eq!(saved.scenes[0].name, "Second");
    }

    #[test]
    fn poll_without_edits_does_nothing() {
        let mut session = session();
        assert_eq!(session.poll(Instant::now()).unwrap(), None);
        assert!(session.store().payload().is_none());
    }

    #[test]
    fn named_operations_schedule_a_save() {
        let mut session = session().with_delay(Duration::ZERO);
        let id = session.create_scene(url_scene("https://example.com/a.jpg", None).unwrap());

        assert!(session.pending().is_some());
        assert_eq!(session.project().current_scene().unwrap().id, id);
        assert!(session.poll(Instant::now()).unwrap().is_some());
    }

    #[test]
    fn failed_operation_does_not_schedule() {
        let mut session = session();
        assert!(session.delete_scene("scene_missing").is_err());
        assert_eq!(session.pending(), None);

        let mut session = Session::new(two_scene_project(), MemoryStore::new());
        let t0 = Instant::now();
        rename(&mut session, t0, "Lobby");
        assert!(session.rename_scene("scene_missing", "x").is_err());
        assert!(session.select_scene(7).is_err());
        assert_eq!(session.pending(), Some(t0 + DEFAULT_DELAY));
    }

    #[test]
    fn flush_saves_immediately() {
        let mut session = Session::new(two_scene_project(), MemoryStore::new());
        rename(&mut session, Instant::now(), "Now");

        session.flush().unwrap();

        assert_eq!(session.pending(), None);
        assert!(session.store().payload().unwrap().contains("Now"));
    }

    #[test]
    fn capacity_error_keeps_project() {
        let mut session = Session::new(two_scene_project(), MemoryStore::new());
        let huge = format!("data:image/jpeg;base64,{}", "A".repeat(SNAPSHOT_LIMIT));
        let t0 = Instant::now();
        session.edit_at(t0, |p| p.scenes[0].image_url = huge.clone());

        let err = session.poll(t0 + DEFAULT_DELAY).unwrap_err();

        assert!(matches!(err, StorageError::Capacity { .. }));
        assert_eq!(session.project().scenes[0].image_url, huge);
        assert!(session.store().payload().is_none());
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn restore_resumes_last_snapshot() {
        let mut store = MemoryStore::new();
        storage::save(&mut store, &two_scene_project()).unwrap();

        let session = Session::restore(store).unwrap();
        assert_eq!(session.project(), &two_scene_project());

        let fresh = Session::restore(MemoryStore::new()).unwrap();
        assert_eq!(fresh.project(), &Project::new());
    }
}
