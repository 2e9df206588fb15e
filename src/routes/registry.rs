//! In-memory route registry
//!
//! Ordered collection of routes (file row order) plus the header set it was
//! loaded with. Every mutation is persisted before it is acknowledged; when
//! the save fails the in-memory change is undone, so memory and disk never
//! diverge after a failed write.
//!
//! # Load state
//!
//! ```text
//! Unloaded ──begin_loading──▶ Loading ──finish_loading──▶ Loaded
//!                                              └────────▶ LoadFailed
//! ```
//!
//! `LoadFailed` behaves like `Loaded` with zero routes. Queries before a
//! load finishes return `NotReady` instead of blocking.

use std::sync::Arc;

use super::errors::{RouteError, RouteResult};
use super::headers::HeaderSet;
use super::record::{Route, RouteField, RoutePatch};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{LoadedSheet, SheetStore, StorageResult};

/// Registry load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    LoadFailed,
}

pub struct RouteRegistry {
    store: Arc<dyn SheetStore>,
    headers: HeaderSet,
    routes: Vec<Route>,
    state: LoadState,
}

impl RouteRegistry {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self {
            store,
            headers: HeaderSet::empty(),
            routes: Vec::new(),
            state: LoadState::Unloaded,
        }
    }

    /// Loads synchronously on the calling thread.
    pub fn load(&mut self) {
        let store = self.begin_loading();
        let result = store.load();
        self.finish_loading(result);
    }

    /// Enters `Loading` and hands out the store so the read can run without
    /// holding the registry.
    pub fn begin_loading(&mut self) -> Arc<dyn SheetStore> {
        self.state = LoadState::Loading;
        Arc::clone(&self.store)
    }

    /// Installs the result of a load.
    ///
    /// A failed load leaves the registry empty. A sheet without a route
    /// number column counts as failed; without a key nothing can be found.
    pub fn finish_loading(&mut self, result: StorageResult<LoadedSheet>) {
        match result {
            Ok(sheet) if sheet.headers.has_key_column() => {
                self.headers = sheet.headers;
                self.routes = sheet.routes;
                self.state = LoadState::Loaded;
            }
            Ok(_) | Err(_) => {
                self.headers = HeaderSet::empty();
                self.routes = Vec::new();
                self.state = LoadState::LoadFailed;
            }
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Loaded | LoadState::LoadFailed)
    }

    fn ensure_ready(&self) -> RouteResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(RouteError::NotReady)
        }
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn list_all(&self) -> RouteResult<&[Route]> {
        self.ensure_ready()?;
        Ok(&self.routes)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.routes.iter().position(|r| r.has_key(key))
    }

    /// Exact, case-insensitive match on the route number. First match wins.
    pub fn find_by_number(&self, key: &str) -> RouteResult<&Route> {
        self.ensure_ready()?;
        self.position(key)
            .map(|index| &self.routes[index])
            .ok_or_else(|| RouteError::NotFound(key.trim().to_string()))
    }

    /// Case-insensitive substring search on one field, in registry order.
    pub fn search(&self, field: RouteField, needle: &str) -> RouteResult<Vec<&Route>> {
        self.ensure_ready()?;
        Ok(self
            .routes
            .iter()
            .filter(|r| r.field_contains(field, needle))
            .collect())
    }

    pub fn find_by_driver(&self, name: &str) -> RouteResult<Vec<&Route>> {
        self.search(RouteField::Driver, name)
    }

    pub fn find_by_monitor(&self, name: &str) -> RouteResult<Vec<&Route>> {
        self.search(RouteField::Monitor, name)
    }

    pub fn find_by_company(&self, name: &str) -> RouteResult<Vec<&Route>> {
        self.search(RouteField::Company, name)
    }

    /// Headers a save will be written with.
    ///
    /// A registry that never saw a usable sheet adopts the canonical schema
    /// so the first insert creates a loadable file.
    fn save_headers(&mut self) {
        if self.headers.is_empty() {
            self.headers = HeaderSet::canonical();
        }
    }

    fn persist(&self) -> RouteResult<()> {
        self.store
            .save(&self.headers, &self.routes)
            .map_err(|e| RouteError::PersistenceFailure(e.to_string()))
    }

    /// Appends a route and persists. Rolled back if the save fails.
    ///
    /// Fields without a column in the header set are cleared first; the
    /// sheet has nowhere to keep them.
    pub fn insert(&mut self, mut route: Route) -> RouteResult<()> {
        self.ensure_ready()?;

        let key = route.key().to_string();
        if key.is_empty() {
            return Err(RouteError::FormatError(
                "O número da rota não pode ser vazio".to_string(),
            ));
        }
        if self.position(&key).is_some() {
            return Err(RouteError::DuplicateKey(key));
        }

        let previous_headers = self.headers.clone();
        self.save_headers();
        for field in RouteField::ALL {
            if !self.headers.contains(field) {
                route.set(field, String::new());
            }
        }
        self.routes.push(route);

        if let Err(e) = self.persist() {
            self.routes.pop();
            self.headers = previous_headers;
            log_event_with_fields(Event::RouteRolledBack, &[("op", "insert"), ("route", &key)]);
            return Err(e);
        }

        log_event_with_fields(Event::RouteInserted, &[("route", &key)]);
        Ok(())
    }

    /// Applies a patch to the route with number `key` and persists.
    ///
    /// Fields whose column is absent from the header set are skipped. The
    /// original record is restored in place if the save fails.
    pub fn update(&mut self, key: &str, patch: &RoutePatch) -> RouteResult<()> {
        self.ensure_ready()?;

        let index = self
            .position(key)
            .ok_or_else(|| RouteError::NotFound(key.trim().to_string()))?;

        let original = self.routes[index].clone();
        for (field, value) in patch.changes() {
            if self.headers.contains(*field) {
                self.routes[index].set(*field, value.clone());
            }
        }

        if let Err(e) = self.persist() {
            self.routes[index] = original;
            log_event_with_fields(
                Event::RouteRolledBack,
                &[("op", "update"), ("route", key.trim())],
            );
            return Err(e);
        }

        log_event_with_fields(Event::RouteUpdated, &[("route", key.trim())]);
        Ok(())
    }
}
