//! Workspace facade.

use crate::change_feed::{ChangeEvent, ChangeFeed, ChangeType};
use crate::clock::{duration_ms, Clock, SystemClock};
use crate::collection::{CollectionView, EntityStore};
use crate::config::Config;
use crate::entity::{Entity, EntityDraft, EntityId, Fields};
use crate::error::{CoreError, CoreResult};
use crate::notify::{Notification, NotificationChannel};
use crate::persistence::{Debouncer, SnapshotStore};
use crate::query::{execute, FilterSpec, SortSpec};
use crate::schema::Schema;
use crate::stats::CollectionStats;
use crate::tabular::{self, ExportOptions, ImportReport};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tabula_codec::Value;
use tabula_storage::{FileBackend, InMemoryBackend, KvBackend};
use tracing::{debug, info, warn};

struct CollectionSlot {
    store: EntityStore,
    view: CollectionView,
}

/// The main engine handle.
///
/// A `Workspace` owns every registered collection and provides:
/// - Validated create, update and remove, with cascading detach of
///   reference fields
/// - Per-collection search, filter and sort state and the derived view
/// - CSV export, import templates and fault-tolerant import
/// - Debounced snapshot persistence through an injected backend
/// - A notification channel and a change feed
///
/// The workspace is single-threaded: every call runs to completion on the
/// caller's thread. There is no background timer; pending snapshot writes
/// happen on the next mutation or [`Workspace::tick`] after their quiet
/// window, on [`Workspace::flush`], or when the workspace is dropped.
///
/// # Usage
///
/// ```rust,ignore
/// use tabula_core::{EntityDraft, FieldDef, Schema, Workspace};
/// use tabula_codec::FieldType;
///
/// let mut workspace = Workspace::open(Path::new("data"))?;
/// workspace.register(
///     Schema::builder("vehicles")
///         .field(FieldDef::new("plate", FieldType::Text).required().searchable())
///         .build()?,
/// )?;
///
/// workspace.create("vehicles", EntityDraft::new().set("plate", "AB-123"))?;
/// workspace.set_search_term("vehicles", "ab")?;
/// for vehicle in workspace.view("vehicles")? {
///     println!("{}", vehicle.id());
/// }
/// ```
pub struct Workspace {
    config: Config,
    clock: Arc<dyn Clock>,
    snapshots: SnapshotStore,
    collections: Vec<CollectionSlot>,
    debouncer: Debouncer,
    notifications: NotificationChannel,
    changes: ChangeFeed,
    sequence: u64,
}

impl Workspace {
    /// Opens a workspace that keeps snapshots as files in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the directory cannot be created.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Opens a file-backed workspace with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the directory cannot be created.
    pub fn open_with_config(path: &Path, config: Config) -> CoreResult<Self> {
        let backend = FileBackend::open(path)?;
        info!(path = %path.display(), "opened workspace");
        Ok(Self::open_with_backend(config, Box::new(backend)))
    }

    /// Opens a non-persistent workspace, for tests and previews.
    pub fn open_in_memory() -> Self {
        Self::open_with_backend(Config::default(), Box::new(InMemoryBackend::new()))
    }

    /// Opens a workspace over any key-value backend.
    pub fn open_with_backend(config: Config, backend: Box<dyn KvBackend>) -> Self {
        Self::open_with_clock(config, backend, Arc::new(SystemClock))
    }

    /// Opens a workspace with an explicit time source.
    pub fn open_with_clock(
        config: Config,
        backend: Box<dyn KvBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            snapshots: SnapshotStore::new(backend, config.app_name.clone()),
            debouncer: Debouncer::new(duration_ms(config.persist_debounce)),
            notifications: NotificationChannel::new(
                Arc::clone(&clock),
                duration_ms(config.notification_ttl),
            ),
            changes: ChangeFeed::new(),
            collections: Vec::new(),
            sequence: 0,
            clock,
            config,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Collections ===

    /// Registers a collection and hydrates it from its snapshot.
    ///
    /// An unreadable snapshot is logged and the collection starts empty.
    /// Returns the number of entities loaded.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidSchema`] if the schema is inconsistent
    /// - [`CoreError::CollectionExists`] if the name is taken
    pub fn register(&mut self, schema: Schema) -> CoreResult<usize> {
        let (slot, _) = self.prepare_slot(schema)?;
        Ok(self.commit_slot(slot))
    }

    /// Registers a collection, inserting `seed` when no snapshot exists
    /// yet. Returns the number of entities the collection starts with.
    ///
    /// Seeding is all or nothing: if any draft fails, the collection is
    /// not registered and nothing is stored.
    ///
    /// # Errors
    ///
    /// As [`Workspace::register`], plus any validation error raised by a
    /// seed draft.
    pub fn register_with_seed<I>(&mut self, schema: Schema, seed: I) -> CoreResult<usize>
    where
        I: IntoIterator<Item = EntityDraft>,
    {
        let (mut slot, had_snapshot) = self.prepare_slot(schema)?;
        if had_snapshot {
            return Ok(self.commit_slot(slot));
        }

        let name = slot.store.name().to_string();
        let mut created = Vec::new();
        for draft in seed {
            match slot.store.create(draft) {
                Ok(entity) => created.push(entity.id().clone()),
                Err(e) => {
                    warn!(collection = %name, error = %e, "seed rejected; collection not registered");
                    return Err(e);
                }
            }
        }

        let count = self.commit_slot(slot);
        for id in created {
            self.record(&name, id, ChangeType::Insert);
        }
        debug!(collection = %name, count, "seeded collection");
        Ok(count)
    }

    /// Builds the slot for `schema` and loads its snapshot. Nothing is
    /// registered yet.
    fn prepare_slot(&self, schema: Schema) -> CoreResult<(CollectionSlot, bool)> {
        let schema = schema.validated()?;
        if self.collections.iter().any(|s| s.store.name() == schema.name) {
            return Err(CoreError::CollectionExists { name: schema.name });
        }

        let view = CollectionView::for_schema(&schema);
        let mut store = EntityStore::new(schema);
        let had_snapshot = match self.snapshots.try_load(store.schema()) {
            Ok(Some(entities)) => {
                store.hydrate(entities);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(collection = %store.name(), error = %e, "starting with empty collection");
                true
            }
        };
        Ok((CollectionSlot { store, view }, had_snapshot))
    }

    fn commit_slot(&mut self, slot: CollectionSlot) -> usize {
        let count = slot.store.count();
        info!(collection = %slot.store.name(), count, "registered collection");
        self.collections.push(slot);
        count
    }

    /// Returns the registered collection names in registration order.
    pub fn collections(&self) -> Vec<&str> {
        self.collections.iter().map(|s| s.store.name()).collect()
    }

    /// Returns a collection's schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn schema(&self, collection: &str) -> CoreResult<&Schema> {
        Ok(self.slot(collection)?.store.schema())
    }

    /// Returns a collection's store for read access.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn store(&self, collection: &str) -> CoreResult<&EntityStore> {
        Ok(&self.slot(collection)?.store)
    }

    // === Entities ===

    /// Creates an entity.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    /// - [`CoreError::DuplicateId`] or [`CoreError::ValidationFailed`]
    ///   from the store
    pub fn create(&mut self, collection: &str, draft: EntityDraft) -> CoreResult<Entity> {
        let result = self.slot_mut(collection).and_then(|s| s.store.create(draft));
        let label = self.label(collection);
        match result {
            Ok(entity) => {
                self.record(collection, entity.id().clone(), ChangeType::Insert);
                self.notifications.success(format!("{label} created"));
                self.tick();
                Ok(entity)
            }
            Err(e) => {
                self.notifications.error(format!("Could not create {label}: {e}"));
                Err(e)
            }
        }
    }

    /// Merges `patch` into an entity.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    /// - [`CoreError::NotFound`] or [`CoreError::ValidationFailed`] from
    ///   the store
    pub fn update(&mut self, collection: &str, id: &EntityId, patch: Fields) -> CoreResult<Entity> {
        let result = self.slot_mut(collection).and_then(|s| s.store.update(id, patch));
        let label = self.label(collection);
        match result {
            Ok(entity) => {
                self.record(collection, id.clone(), ChangeType::Update);
                self.notifications.success(format!("{label} updated"));
                self.tick();
                Ok(entity)
            }
            Err(e) => {
                self.notifications.error(format!("Could not update {label}: {e}"));
                Err(e)
            }
        }
    }

    /// Removes an entity and detaches every reference to it.
    ///
    /// Reference fields pointing at the removed entity, in any
    /// collection, are cleared and their detach resets applied. The
    /// referencing entities themselves are kept.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    /// - [`CoreError::NotFound`] if no entity has `id`
    pub fn remove(&mut self, collection: &str, id: &EntityId) -> CoreResult<Entity> {
        let result = self.slot_mut(collection).and_then(|s| s.store.remove(id));
        let label = self.label(collection);
        match result {
            Ok(entity) => {
                self.record(collection, id.clone(), ChangeType::Delete);
                let detached = self.detach_references(collection, id);
                let message = if detached > 0 {
                    format!("{label} deleted, {detached} reference(s) cleared")
                } else {
                    format!("{label} deleted")
                };
                self.notifications.success(message);
                self.tick();
                Ok(entity)
            }
            Err(e) => {
                self.notifications.error(format!("Could not delete {label}: {e}"));
                Err(e)
            }
        }
    }

    /// Removes every entity of a collection, detaching references to
    /// each. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn clear(&mut self, collection: &str) -> CoreResult<usize> {
        let removed = match self.slot_mut(collection) {
            Ok(slot) => slot.store.clear(),
            Err(e) => {
                self.notifications.error(format!("Could not clear {collection}: {e}"));
                return Err(e);
            }
        };
        for entity in &removed {
            self.record(collection, entity.id().clone(), ChangeType::Delete);
            self.detach_references(collection, entity.id());
        }
        // An empty collection still gets its (empty) snapshot written.
        self.debouncer.schedule(collection, self.clock.now_ms());
        self.notifications
            .success(format!("Cleared {} {collection}", removed.len()));
        self.tick();
        Ok(removed.len())
    }

    /// Returns every entity in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn list(&self, collection: &str) -> CoreResult<&[Entity]> {
        Ok(self.slot(collection)?.store.list())
    }

    /// Looks up an entity. Unknown collections yield `None`.
    pub fn get(&self, collection: &str, id: &EntityId) -> Option<&Entity> {
        self.slot(collection).ok()?.store.get(id)
    }

    fn detach_references(&mut self, target: &str, id: &EntityId) -> usize {
        let mut touched = Vec::new();
        for slot in &mut self.collections {
            let fields: Vec<_> = slot
                .store
                .schema()
                .references_to(target)
                .map(|f| (f.name.clone(), f.on_detach.clone()))
                .collect();
            for (field, resets) in fields {
                for entity_id in slot.store.detach_references(&field, id, &resets) {
                    debug!(
                        collection = %slot.store.name(),
                        field = %field,
                        entity = %entity_id,
                        target = %id,
                        "detached reference"
                    );
                    touched.push((slot.store.name().to_string(), entity_id));
                }
            }
        }

        let count = touched.len();
        for (collection, entity_id) in touched {
            self.record(&collection, entity_id, ChangeType::Detach);
        }
        count
    }

    fn record(&mut self, collection: &str, entity_id: EntityId, change_type: ChangeType) {
        self.sequence += 1;
        self.changes.emit(ChangeEvent::new(
            self.sequence,
            collection,
            entity_id,
            change_type,
        ));
        self.debouncer.schedule(collection, self.clock.now_ms());
    }

    // === View state ===

    /// Column header click: sorts by `field`, toggling the direction when
    /// it is already the active key.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    /// - [`CoreError::ValidationFailed`] for undeclared fields
    pub fn request_sort(&mut self, collection: &str, field: &str) -> CoreResult<()> {
        self.check_field(collection, field)?;
        self.slot_mut(collection)?.view.request_sort(field);
        Ok(())
    }

    /// Search box change.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn set_search_term(&mut self, collection: &str, term: impl Into<String>) -> CoreResult<()> {
        self.slot_mut(collection)?.view.set_search_term(term);
        Ok(())
    }

    /// Replaces the fields the search term is matched against.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    /// - [`CoreError::ValidationFailed`] for undeclared fields
    pub fn set_search_fields(&mut self, collection: &str, fields: Vec<String>) -> CoreResult<()> {
        for field in &fields {
            self.check_field(collection, field)?;
        }
        self.slot_mut(collection)?.view.set_search_fields(fields);
        Ok(())
    }

    /// Filter dropdown change. A blank value clears the constraint.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    /// - [`CoreError::ValidationFailed`] for undeclared fields
    pub fn set_exact_filter(
        &mut self,
        collection: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> CoreResult<()> {
        self.check_field(collection, field)?;
        self.slot_mut(collection)?.view.set_exact_filter(field, value);
        Ok(())
    }

    /// Sets a range constraint; both bounds `None` clears it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    /// - [`CoreError::ValidationFailed`] for undeclared fields
    pub fn set_range_filter(
        &mut self,
        collection: &str,
        field: &str,
        min: Option<Value>,
        max: Option<Value>,
    ) -> CoreResult<()> {
        self.check_field(collection, field)?;
        self.slot_mut(collection)?.view.set_range_filter(field, min, max);
        Ok(())
    }

    /// Drops the search term and all exact and range constraints.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn clear_filters(&mut self, collection: &str) -> CoreResult<()> {
        self.slot_mut(collection)?.view.clear_filters();
        Ok(())
    }

    /// Returns the current filter and sort of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn view_state(&self, collection: &str) -> CoreResult<&CollectionView> {
        Ok(&self.slot(collection)?.view)
    }

    /// Derives the visible rows from the latest store state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn view(&self, collection: &str) -> CoreResult<Vec<&Entity>> {
        let slot = self.slot(collection)?;
        Ok(slot.view.apply(slot.store.list()))
    }

    /// Runs an ad hoc query, ignoring the stored view state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn query(
        &self,
        collection: &str,
        filter: &FilterSpec,
        sort: &SortSpec,
    ) -> CoreResult<Vec<&Entity>> {
        Ok(execute(self.slot(collection)?.store.list(), filter, sort))
    }

    /// Aggregates over the whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn stats(&self, collection: &str) -> CoreResult<CollectionStats> {
        let store = &self.slot(collection)?.store;
        Ok(CollectionStats::compute(store.schema(), store.list()))
    }

    fn check_field(&self, collection: &str, path: &str) -> CoreResult<()> {
        let schema = self.schema(collection)?;
        let root = path.split('.').next().unwrap_or(path);
        if root == "id" || schema.field(root).is_some() {
            Ok(())
        } else {
            Err(CoreError::validation(collection, path, "unknown field"))
        }
    }

    // === Tabular ===

    /// Exports the whole collection as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn export_csv(&self, collection: &str, options: &ExportOptions) -> CoreResult<String> {
        let store = &self.slot(collection)?.store;
        export_rows(store.schema(), store.list(), options)
    }

    /// Exports the current filtered, sorted view as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn export_view_csv(&self, collection: &str, options: &ExportOptions) -> CoreResult<String> {
        let schema = self.schema(collection)?;
        export_rows(schema, self.view(collection)?, options)
    }

    /// Suggested export file name for today.
    pub fn export_filename(&self, collection: &str) -> String {
        tabular::export_filename(collection, self.clock.now_ms())
    }

    /// Renders an import template with the configured number of sample
    /// rows.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn template_csv(&self, collection: &str) -> CoreResult<String> {
        self.template_csv_with_rows(collection, self.config.template_rows)
    }

    /// Renders an import template with `rows` sample rows (1 to 3).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn template_csv_with_rows(&self, collection: &str, rows: usize) -> CoreResult<String> {
        tabular::template_csv(self.schema(collection)?, rows, self.clock.now_ms())
    }

    /// Imports CSV text as new entities.
    ///
    /// Bad rows are counted in the report, never raised.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotFound`] for unknown collections.
    pub fn import_csv(&mut self, collection: &str, text: &str) -> CoreResult<ImportReport> {
        let now = self.clock.now_ms();
        let report = match self.slot_mut(collection) {
            Ok(slot) => tabular::import_csv(&mut slot.store, text, now),
            Err(e) => {
                self.notifications.error(format!("Import failed: {e}"));
                return Err(e);
            }
        };

        for id in &report.created {
            self.record(collection, id.clone(), ChangeType::Insert);
        }
        info!(
            collection,
            imported = report.imported,
            failed = report.failed,
            "import finished"
        );
        self.notifications.publish(import_notification(collection, &report));
        self.tick();
        Ok(report)
    }

    /// Reads a file and imports it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Io`] if the file cannot be read
    /// - [`CoreError::CollectionNotFound`] for unknown collections
    pub fn import_path(&mut self, collection: &str, path: impl AsRef<Path>) -> CoreResult<ImportReport> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => self.import_csv(collection, &text),
            Err(e) => {
                self.notifications
                    .error(format!("Could not read {}: {e}", path.display()));
                Err(e.into())
            }
        }
    }

    // === Persistence ===

    /// Writes the snapshots whose quiet window has elapsed. Returns the
    /// number written.
    pub fn tick(&mut self) -> usize {
        let due = self.debouncer.due(self.clock.now_ms());
        self.write_snapshots(due)
    }

    /// Writes every pending snapshot now. Returns the number written.
    pub fn flush(&mut self) -> usize {
        let pending = self.debouncer.drain();
        self.write_snapshots(pending)
    }

    /// Returns the number of collections with unwritten changes.
    pub fn pending_writes(&self) -> usize {
        self.debouncer.pending_count()
    }

    fn write_snapshots(&mut self, keys: Vec<String>) -> usize {
        let mut written = 0;
        for key in keys {
            let Some(slot) = self.collections.iter().find(|s| s.store.name() == key) else {
                continue;
            };
            match self.snapshots.save(&key, slot.store.list()) {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(collection = %key, error = %e, "snapshot write failed");
                    let label = slot.store.schema().display_name().to_string();
                    self.notifications
                        .error(format!("Could not save {label}: {e}"));
                }
            }
        }
        written
    }

    // === Observers ===

    /// Subscribes to change events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Returns the active notification, if it has not expired.
    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.current()
    }

    /// Clears the active notification.
    pub fn dismiss_notification(&mut self) {
        self.notifications.dismiss();
    }

    /// Subscribes to every future notification.
    pub fn subscribe_notifications(&mut self) -> Receiver<Notification> {
        self.notifications.subscribe()
    }

    // === Internals ===

    fn slot(&self, name: &str) -> CoreResult<&CollectionSlot> {
        self.collections
            .iter()
            .find(|s| s.store.name() == name)
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    fn slot_mut(&mut self, name: &str) -> CoreResult<&mut CollectionSlot> {
        self.collections
            .iter_mut()
            .find(|s| s.store.name() == name)
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    fn label(&self, collection: &str) -> String {
        self.slot(collection)
            .map_or(collection, |s| s.store.schema().display_name())
            .to_string()
    }
}

fn export_rows<'a, I>(schema: &Schema, rows: I, options: &ExportOptions) -> CoreResult<String>
where
    I: IntoIterator<Item = &'a Entity>,
{
    let defaults;
    let columns = match &options.columns {
        Some(columns) => columns.as_slice(),
        None => {
            defaults = tabular::default_columns(schema, options.include_id);
            defaults.as_slice()
        }
    };
    tabular::export_csv(schema, rows, columns)
}

fn import_notification(collection: &str, report: &ImportReport) -> Notification {
    match (report.imported, report.failed) {
        (imported, 0) => Notification::success(format!("Imported {imported} {collection}")),
        (0, failed) => Notification::error(format!(
            "Import failed: {failed} row(s) skipped"
        )),
        (imported, failed) => Notification::error(format!(
            "Imported {imported} {collection}, {failed} row(s) skipped"
        )),
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("collections", &self.collections())
            .field("pending_writes", &self.pending_writes())
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::NotificationKind;
    use crate::query::SortDirection;
    use crate::schema::FieldDef;
    use std::time::Duration;
    use tabula_codec::FieldType;

    fn vehicles() -> Schema {
        Schema::builder("vehicles")
            .label("Vehicle")
            .field(FieldDef::new("plate", FieldType::Text).required().searchable())
            .build()
            .unwrap()
    }

    fn shipments() -> Schema {
        Schema::builder("shipments")
            .label("Shipment")
            .field(FieldDef::new("reference", FieldType::Text).required().searchable())
            .field(FieldDef::new("amount", FieldType::Number))
            .field(
                FieldDef::new("status", FieldType::enumeration(["unassigned", "assigned", "delivered"]))
                    .default_value("unassigned"),
            )
            .field(
                FieldDef::new("assigned_vehicle_id", FieldType::reference("vehicles"))
                    .on_detach("status", "unassigned"),
            )
            .build()
            .unwrap()
    }

    struct Harness {
        workspace: Workspace,
        clock: ManualClock,
        backend: InMemoryBackend,
    }

    fn harness() -> Harness {
        let clock = ManualClock::new(1_700_000_000_000);
        let backend = InMemoryBackend::new();
        let workspace = Workspace::open_with_clock(
            Config::new().app_name("fleet"),
            Box::new(backend.clone()),
            Arc::new(clock.clone()),
        );
        Harness {
            workspace,
            clock,
            backend,
        }
    }

    fn registered() -> Harness {
        let mut h = harness();
        h.workspace.register(vehicles()).unwrap();
        h.workspace.register(shipments()).unwrap();
        h
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut h = registered();
        assert!(matches!(
            h.workspace.register(vehicles()),
            Err(CoreError::CollectionExists { .. })
        ));
        assert_eq!(h.workspace.collections(), vec!["vehicles", "shipments"]);
    }

    #[test]
    fn in_memory_workspace_starts_empty() {
        let mut workspace = Workspace::open_in_memory();
        assert_eq!(workspace.register(vehicles()).unwrap(), 0);
        assert_eq!(workspace.config().app_name, "tabula");
        assert!(format!("{workspace:?}").contains("vehicles"));
    }

    #[test]
    fn unknown_collection_is_reported() {
        let mut h = registered();
        let err = h.workspace.create("drivers", EntityDraft::new()).unwrap_err();
        assert!(matches!(err, CoreError::CollectionNotFound { .. }));
        assert!(h.workspace.notification().unwrap().is_error());
        assert!(h.workspace.get("drivers", &EntityId::from("x")).is_none());
    }

    #[test]
    fn every_mutation_notifies_once() {
        let mut h = registered();
        let rx = h.workspace.subscribe_notifications();

        let v = h
            .workspace
            .create("vehicles", EntityDraft::new().set("plate", "AB-1"))
            .unwrap();
        let _ = h.workspace.create("vehicles", EntityDraft::new());
        let mut patch = Fields::new();
        patch.insert("plate".to_string(), Value::from("AB-2"));
        h.workspace.update("vehicles", v.id(), patch).unwrap();
        h.workspace.remove("vehicles", v.id()).unwrap();

        let kinds: Vec<NotificationKind> = rx.try_iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::Success,
                NotificationKind::Error,
                NotificationKind::Success,
                NotificationKind::Success,
            ]
        );
        assert_eq!(h.workspace.notification().unwrap().message, "Vehicle deleted");
    }

    #[test]
    fn remove_detaches_references() {
        let mut h = registered();
        let v1 = h
            .workspace
            .create("vehicles", EntityDraft::new().with_id("v1").set("plate", "AB-1"))
            .unwrap();
        h.workspace
            .create(
                "shipments",
                EntityDraft::new()
                    .with_id("s1")
                    .set("reference", "S-1")
                    .set("status", "assigned")
                    .set("assigned_vehicle_id", "v1"),
            )
            .unwrap();
        let changes = h.workspace.subscribe();

        h.workspace.remove("vehicles", v1.id()).unwrap();

        let s1 = h.workspace.get("shipments", &EntityId::from("s1")).unwrap();
        assert_eq!(s1.value("assigned_vehicle_id"), &Value::Null);
        assert_eq!(s1.value("status"), &Value::from("unassigned"));

        let events: Vec<(String, ChangeType)> = changes
            .try_iter()
            .map(|e| (e.collection, e.change_type))
            .collect();
        assert_eq!(
            events,
            vec![
                ("vehicles".to_string(), ChangeType::Delete),
                ("shipments".to_string(), ChangeType::Detach),
            ]
        );
        assert!(h
            .workspace
            .notification()
            .unwrap()
            .message
            .contains("1 reference(s) cleared"));
    }

    #[test]
    fn writes_are_debounced() {
        let mut h = registered();
        for plate in ["A", "B", "C"] {
            h.workspace
                .create("vehicles", EntityDraft::new().set("plate", plate))
                .unwrap();
            h.clock.advance(Duration::from_millis(100));
        }
        assert!(h.backend.entries().get("fleet_vehicles").is_none());
        assert_eq!(h.workspace.pending_writes(), 1);

        h.clock.advance(Duration::from_millis(199));
        assert_eq!(h.workspace.tick(), 0);
        h.clock.advance(Duration::from_millis(1));
        assert_eq!(h.workspace.tick(), 1);

        let snapshot = h.backend.entries()["fleet_vehicles"].clone();
        let decoded: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(decoded.as_array().unwrap().len(), 3);
        assert_eq!(h.workspace.pending_writes(), 0);
    }

    #[test]
    fn drop_flushes_and_reopen_hydrates() {
        let mut h = registered();
        h.workspace
            .create("vehicles", EntityDraft::new().with_id("v1").set("plate", "AB-1"))
            .unwrap();
        let backend = h.backend.clone();
        drop(h);

        let mut reopened = Workspace::open_with_backend(
            Config::new().app_name("fleet"),
            Box::new(backend),
        );
        assert_eq!(reopened.register(vehicles()).unwrap(), 1);
        let v1 = reopened.get("vehicles", &EntityId::from("v1")).unwrap();
        assert_eq!(v1.text("plate"), Some("AB-1"));
    }

    #[test]
    fn seed_only_applies_without_snapshot() {
        let backend = InMemoryBackend::new();
        let seed = || vec![EntityDraft::new().set("plate", "SEED-1"), EntityDraft::new().set("plate", "SEED-2")];

        {
            let mut first = Workspace::open_with_backend(Config::default(), Box::new(backend.clone()));
            assert_eq!(first.register_with_seed(vehicles(), seed()).unwrap(), 2);
            let mut patch = Fields::new();
            patch.insert("plate".to_string(), Value::from("EDITED"));
            let id = first.list("vehicles").unwrap()[0].id().clone();
            first.update("vehicles", &id, patch).unwrap();
        }

        let mut second = Workspace::open_with_backend(Config::default(), Box::new(backend));
        assert_eq!(second.register_with_seed(vehicles(), seed()).unwrap(), 2);
        assert_eq!(second.list("vehicles").unwrap()[0].text("plate"), Some("EDITED"));
    }

    #[test]
    fn rejected_seed_registers_nothing() {
        let mut h = harness();
        let changes = h.workspace.subscribe();
        let seed = vec![
            EntityDraft::new().with_id("v1").set("plate", "AB-1"),
            EntityDraft::new(),
        ];

        let err = h.workspace.register_with_seed(vehicles(), seed).unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }), "{err}");
        assert!(h.workspace.collections().is_empty());
        assert_eq!(h.workspace.pending_writes(), 0);
        assert_eq!(changes.try_iter().count(), 0);

        let retry = vec![EntityDraft::new().with_id("v1").set("plate", "AB-1")];
        assert_eq!(h.workspace.register_with_seed(vehicles(), retry).unwrap(), 1);
        assert_eq!(h.workspace.pending_writes(), 1);
        assert_eq!(changes.try_iter().count(), 1);
    }

    #[test]
    fn corrupt_snapshot_starts_empty_without_seeding() {
        let backend = InMemoryBackend::with_entries([("tabula_vehicles", "not json")]);
        let mut workspace = Workspace::open_with_backend(Config::default(), Box::new(backend));
        let seeded = workspace
            .register_with_seed(vehicles(), vec![EntityDraft::new().set("plate", "X")])
            .unwrap();
        assert_eq!(seeded, 0);
        assert!(workspace.list("vehicles").unwrap().is_empty());
    }

    #[test]
    fn persistence_failure_becomes_notification() {
        let clock = ManualClock::new(0);
        let mut workspace = Workspace::open_with_clock(
            Config::new().persist_debounce(Duration::ZERO),
            Box::new(InMemoryBackend::with_quota(16)),
            Arc::new(clock),
        );
        workspace.register(vehicles()).unwrap();

        let created = workspace.create("vehicles", EntityDraft::new().set("plate", "A very long plate"));
        assert!(created.is_ok());
        let current = workspace.notification().unwrap();
        assert!(current.is_error());
        assert!(current.message.starts_with("Could not save Vehicle"));
        assert_eq!(workspace.list("vehicles").unwrap().len(), 1);
    }

    #[test]
    fn view_applies_search_filter_and_sort() {
        let mut h = registered();
        for (reference, amount, status) in [
            ("S-1", 100, "assigned"),
            ("S-2", 50, "unassigned"),
            ("X-3", 75, "assigned"),
        ] {
            h.workspace
                .create(
                    "shipments",
                    EntityDraft::new()
                        .set("reference", reference)
                        .set("amount", amount)
                        .set("status", status),
                )
                .unwrap();
        }

        let refs = |w: &Workspace| -> Vec<String> {
            w.view("shipments")
                .unwrap()
                .iter()
                .map(|e| e.text("reference").unwrap_or_default().to_string())
                .collect()
        };

        h.workspace.request_sort("shipments", "amount").unwrap();
        assert_eq!(refs(&h.workspace), ["S-2", "X-3", "S-1"]);
        h.workspace.request_sort("shipments", "amount").unwrap();
        assert_eq!(refs(&h.workspace), ["S-1", "X-3", "S-2"]);

        h.workspace.set_exact_filter("shipments", "status", "assigned").unwrap();
        assert_eq!(refs(&h.workspace), ["S-1", "X-3"]);

        h.workspace.set_search_term("shipments", "s-").unwrap();
        assert_eq!(refs(&h.workspace), ["S-1"]);

        h.workspace
            .set_range_filter("shipments", "amount", None, Some(Value::from(80)))
            .unwrap();
        assert!(refs(&h.workspace).is_empty());

        h.workspace.clear_filters("shipments").unwrap();
        assert_eq!(refs(&h.workspace).len(), 3);
        assert_eq!(
            h.workspace.view_state("shipments").unwrap().sort().primary().unwrap().direction,
            SortDirection::Desc
        );
        assert!(h.workspace.request_sort("shipments", "colour").is_err());
    }

    #[test]
    fn import_reports_and_emits_inserts() {
        let mut h = registered();
        let changes = h.workspace.subscribe();
        let report = h
            .workspace
            .import_csv("shipments", "Reference,Amount\nS-1,10\n,20\nS-3,30\n")
            .unwrap();

        assert_eq!((report.imported, report.failed), (2, 1));
        assert_eq!(changes.try_iter().count(), 2);
        let current = h.workspace.notification().unwrap();
        assert_eq!(current.message, "Imported 2 shipments, 1 row(s) skipped");
        assert!(current.is_error());
    }

    #[test]
    fn import_path_reports_unreadable_file() {
        let mut h = registered();
        let err = h
            .workspace
            .import_path("shipments", "/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
        assert!(h.workspace.notification().unwrap().is_error());
    }

    #[test]
    fn export_and_template_use_schema_columns() {
        let mut h = registered();
        h.workspace
            .create("vehicles", EntityDraft::new().with_id("v1").set("plate", "AB-1"))
            .unwrap();

        let plain = h.workspace.export_csv("vehicles", &ExportOptions::default()).unwrap();
        assert_eq!(plain, "\"plate\"\n\"AB-1\"\n");

        let with_id = h
            .workspace
            .export_csv("vehicles", &ExportOptions { include_id: true, columns: None })
            .unwrap();
        assert_eq!(with_id, "\"id\",\"plate\"\n\"v1\",\"AB-1\"\n");

        let template = h.workspace.template_csv("vehicles").unwrap();
        assert_eq!(template.lines().count(), 3);
        assert_eq!(h.workspace.export_filename("vehicles"), "vehicles_2023-11-14.csv");
    }

    #[test]
    fn clear_removes_all_and_detaches() {
        let mut h = registered();
        h.workspace
            .create("vehicles", EntityDraft::new().with_id("v1").set("plate", "AB-1"))
            .unwrap();
        h.workspace
            .create(
                "shipments",
                EntityDraft::new()
                    .with_id("s1")
                    .set("reference", "S-1")
                    .set("assigned_vehicle_id", "v1"),
            )
            .unwrap();

        assert_eq!(h.workspace.clear("vehicles").unwrap(), 1);
        assert!(h.workspace.list("vehicles").unwrap().is_empty());
        let s1 = h.workspace.get("shipments", &EntityId::from("s1")).unwrap();
        assert_eq!(s1.value("assigned_vehicle_id"), &Value::Null);
    }

    #[test]
    fn stats_cover_whole_collection() {
        let mut h = registered();
        for amount in [10, 20] {
            h.workspace
                .create("shipments", EntityDraft::new().set("reference", "S").set("amount", amount))
                .unwrap();
        }
        h.workspace.set_exact_filter("shipments", "status", "delivered").unwrap();
        let stats = h.workspace.stats("shipments").unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count_of("status", "unassigned"), 2);
        assert!((stats.numeric_sums["amount"] - 30.0).abs() < f64::EPSILON);
    }
}
