//! In-memory directory for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::directory::{
    Directory, DirectoryError, DirectoryResult, DirectorySession, RC_INVALID_CREDENTIALS,
};
use crate::types::{ConnectionParams, SearchEntry, SearchSpec};

#[derive(Default)]
struct State {
    accounts: HashMap<String, String>,
    disabled: HashMap<String, u32>,
    results: HashMap<String, Vec<SearchEntry>>,
    failing_filters: HashMap<String, String>,
    unreachable: HashSet<String>,
    binds: Vec<ConnectionParams>,
    searches: Vec<SearchSpec>,
}

/// Directory whose accounts and search results are set up by the test
///
/// Searches are answered by exact filter match; unknown filters return
/// no entries. Anonymous binds always succeed on reachable servers.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<Mutex<State>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow binding as `dn` with `password`
    pub fn with_account(self, dn: &str, password: &str) -> Self {
        self.state
            .lock()
            .accounts
            .insert(dn.to_string(), password.to_string());
        self
    }

    /// Reject every bind as `dn` with the given result code
    pub fn with_rejected_account(self, dn: &str, rc: u32) -> Self {
        self.state.lock().disabled.insert(dn.to_string(), rc);
        self
    }

    pub fn with_result(self, filter: &str, entries: Vec<SearchEntry>) -> Self {
        self.state
            .lock()
            .results
            .insert(filter.to_string(), entries);
        self
    }

    pub fn with_failing_search(self, filter: &str, message: &str) -> Self {
        self.state
            .lock()
            .failing_filters
            .insert(filter.to_string(), message.to_string());
        self
    }

    /// Connections to `server` fail before any bind
    pub fn with_unreachable(self, server: &str) -> Self {
        self.state.lock().unreachable.insert(server.to_string());
        self
    }

    /// Every successful or attempted bind, in order
    pub fn binds(&self) -> Vec<ConnectionParams> {
        self.state.lock().binds.clone()
    }

    pub fn searches(&self) -> Vec<SearchSpec> {
        self.state.lock().searches.clone()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn bind(&self, params: &ConnectionParams) -> DirectoryResult<Box<dyn DirectorySession>> {
        let mut state = self.state.lock();

        if state.unreachable.contains(&params.server) {
            return Err(DirectoryError::Connection(format!(
                "{} unreachable",
                params.url()
            )));
        }

        state.binds.push(params.clone());

        if let Some(rc) = state.disabled.get(&params.bind_dn) {
            return Err(DirectoryError::BindRejected {
                dn: params.bind_dn.clone(),
                rc: *rc,
                message: "account disabled".to_string(),
            });
        }

        let accepted = params.is_anonymous()
            || state
                .accounts
                .get(&params.bind_dn)
                .is_some_and(|pw| *pw == params.bind_password);

        if !accepted {
            return Err(DirectoryError::BindRejected {
                dn: params.bind_dn.clone(),
                rc: RC_INVALID_CREDENTIALS,
                message: "invalid credentials".to_string(),
            });
        }

        Ok(Box::new(MemorySession {
            state: self.state.clone(),
        }))
    }
}

struct MemorySession {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl DirectorySession for MemorySession {
    async fn search(&mut self, spec: &SearchSpec) -> DirectoryResult<Vec<SearchEntry>> {
        let mut state = self.state.lock();
        state.searches.push(spec.clone());

        if let Some(message) = state.failing_filters.get(&spec.filter) {
            return Err(DirectoryError::Search(message.clone()));
        }

        Ok(state.results.get(&spec.filter).cloned().unwrap_or_default())
    }

    async fn unbind(self: Box<Self>) -> DirectoryResult<()> {
        Ok(())
    }
}
