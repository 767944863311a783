use crate::models::{ResultItem, SearchSettings, Tab, TabAttachment, TabId};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{Arc, Mutex};

/// Field-wise update applied to a single tab.
///
/// Absent fields are left untouched. `attachment` distinguishes "not sent"
/// from an explicit null, so the file can be cleared independently of the
/// query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SearchSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<ResultItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment: Option<Option<TabAttachment>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Ordered collection of search tabs plus the active selection.
///
/// All mutation is mediated here; the HTTP layer and the search pipeline
/// never touch `Tab` fields directly.
#[derive(Debug)]
pub struct SessionStore {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    defaults: SearchSettings,
}

impl SessionStore {
    /// `defaults` is an immutable configuration value cloned into every new
    /// tab; nested settings are never shared between tabs.
    pub fn new(defaults: SearchSettings) -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            defaults,
        }
    }

    /// Opens exactly one default tab iff the store holds zero tabs.
    pub fn bootstrap(&mut self) -> Option<TabId> {
        if self.tabs.is_empty() {
            let id = self.create_tab();
            log::info!("Opened default tab {}", id);
            Some(id)
        } else {
            None
        }
    }

    /// Appends a fresh tab and makes it active.
    pub fn create_tab(&mut self) -> TabId {
        let tab = Tab::new(self.defaults.clone());
        let id = tab.id;
        self.tabs.push(tab);
        self.active = Some(id);
        log::info!("Created tab {} ({} open)", id, self.tabs.len());
        id
    }

    /// Removes the tab. Unknown ids are ignored.
    ///
    /// If the closed tab was active, activation moves to the remaining tab
    /// at index `max(0, closed_index - 1)`. The rule is positional, not
    /// most-recently-used. Closing a non-active tab leaves the selection
    /// alone.
    pub fn close_tab(&mut self, id: TabId) {
        let Some(index) = self.tabs.iter().position(|tab| tab.id == id) else {
            log::debug!("close_tab: unknown tab {}", id);
            return;
        };

        self.tabs.remove(index);

        if self.active == Some(id) {
            self.active = if self.tabs.is_empty() {
                None
            } else {
                Some(self.tabs[index.saturating_sub(1)].id)
            };
        }
        log::info!("Closed tab {} ({} open)", id, self.tabs.len());
    }

    /// Activates the tab iff it exists; no other side effects.
    pub fn select_tab(&mut self, id: TabId) -> bool {
        if self.tabs.iter().any(|tab| tab.id == id) {
            self.active = Some(id);
            true
        } else {
            log::debug!("select_tab: unknown tab {}", id);
            false
        }
    }

    /// Merges the patch into the one matching tab; unknown ids are no-ops
    /// and every other tab is untouched.
    pub fn update_tab(&mut self, id: TabId, patch: TabPatch) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|tab| tab.id == id) else {
            log::debug!("update_tab: unknown tab {}", id);
            return false;
        };

        if let Some(title) = patch.title {
            tab.title = title;
        }
        if let Some(query) = patch.query {
            tab.query = query;
        }
        if let Some(settings) = patch.settings {
            tab.settings = settings;
        }
        if let Some(results) = patch.results {
            tab.results = results;
        }
        if let Some(is_loading) = patch.is_loading {
            tab.is_loading = is_loading;
        }
        if let Some(attachment) = patch.attachment {
            tab.attachment = attachment;
        }
        true
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.tab(id))
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Stamps a new search on the tab: bumps the sequence, marks it loading,
    /// clears the previous results. Returns the sequence number the eventual
    /// completion must present.
    pub fn begin_search(&mut self, id: TabId) -> Option<u64> {
        let tab = self.tabs.iter_mut().find(|tab| tab.id == id)?;
        tab.search_seq += 1;
        tab.is_loading = true;
        tab.results.clear();
        Some(tab.search_seq)
    }

    /// Applies a search completion iff `seq` is still current for the tab.
    /// Stale completions (a newer search started, or the tab was closed
    /// mid-flight) are discarded.
    pub fn finish_search(&mut self, id: TabId, seq: u64, results: Vec<ResultItem>) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|tab| tab.id == id) else {
            log::debug!("finish_search: tab {} closed mid-flight", id);
            return false;
        };
        if tab.search_seq != seq {
            log::debug!(
                "finish_search: discarding stale completion for tab {} (seq {} != {})",
                id,
                seq,
                tab.search_seq
            );
            return false;
        }
        tab.results = results;
        tab.is_loading = false;
        true
    }
}

/// Cloneable shared handle over the session store.
///
/// The lock is only ever held for the duration of one mutation, never across
/// an await point.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<Mutex<SessionStore>>,
}

impl SessionService {
    pub fn new(defaults: SearchSettings) -> Self {
        Self {
            store: Arc::new(Mutex::new(SessionStore::new(defaults))),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionStore> {
        // A poisoned lock means a panic mid-mutation; propagating the panic
        // is the only sane option for in-memory state.
        self.store.lock().expect("session store lock poisoned")
    }

    pub fn bootstrap(&self) -> Option<TabId> {
        self.lock().bootstrap()
    }

    pub fn create_tab(&self) -> Tab {
        let mut store = self.lock();
        let id = store.create_tab();
        store.tab(id).cloned().expect("tab just created")
    }

    pub fn close_tab(&self, id: TabId) {
        self.lock().close_tab(id);
    }

    pub fn select_tab(&self, id: TabId) -> bool {
        self.lock().select_tab(id)
    }

    pub fn update_tab(&self, id: TabId, patch: TabPatch) -> bool {
        self.lock().update_tab(id, patch)
    }

    pub fn tab(&self, id: TabId) -> Option<Tab> {
        self.lock().tab(id).cloned()
    }

    pub fn tabs(&self) -> Vec<Tab> {
        self.lock().tabs().to_vec()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.lock().active_tab().cloned()
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.lock().active_id()
    }

    pub fn begin_search(&self, id: TabId) -> Option<u64> {
        self.lock().begin_search(id)
    }

    pub fn finish_search(&self, id: TabId, seq: u64, results: Vec<ResultItem>) -> bool {
        self.lock().finish_search(id, seq, results)
    }
}
