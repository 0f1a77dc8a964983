use std::sync::{Mutex, MutexGuard, PoisonError};

use super::filter::{ChatFilter, Query};
use super::pages::PageSpec;
use super::request::RequestBuilder;
use super::{ChatCatalog, ResultSet, SearchOutcome};
use crate::api::{
    FileStream, ForwardRequest, HttpBackend, IndexChat, MessageResponse, ReplyRequest,
    SearchBackend, SearchResponse,
};
use crate::config::ClientConfig;
use crate::credential::CredentialStore;
use crate::error::AppError;
use crate::store::Store;

/// One user's search context: API key, query and filters, current page,
/// last results and the indexed-chat catalog.
///
/// Every method takes `&self`. State sits behind a mutex that is only held
/// between awaits, so several searches can be in flight at once; each one
/// is stamped with a generation and only the latest may write results.
pub struct SearchSession<B> {
    backend: B,
    credentials: Mutex<CredentialStore>,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    query: Query,
    filter: ChatFilter,
    page: PageSpec,
    results: ResultSet,
    all_chats: bool,
    /// Bumped by every search and by anything that makes in-flight
    /// responses meaningless.
    generation: u64,
    searches_in_flight: usize,
    catalog: Option<ChatCatalog>,
    /// Bumped whenever the API key changes.
    credential_epoch: u64,
    catalog_loads_in_flight: usize,
}

impl SessionState {
    fn invalidate_results(&mut self) {
        self.results = ResultSet::default();
        self.page.rewind();
        self.generation += 1;
    }

    fn total_pages(&self) -> usize {
        self.page.total_pages(self.results.estimated_total)
    }

    fn all_chats_effective(&self) -> bool {
        self.all_chats && self.catalog.as_ref().is_some_and(|c| c.master)
    }

    fn request(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.query, &self.filter, &self.page)
            .all_chats(self.all_chats_effective())
    }
}

#[derive(Clone, Copy)]
enum Activity {
    Search,
    Catalog,
}

/// Decrements the matching in-flight counter when the call finishes,
/// including when its future is dropped mid-request.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    activity: Activity,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        let counter = match self.activity {
            Activity::Search => &mut state.searches_in_flight,
            Activity::Catalog => &mut state.catalog_loads_in_flight,
        };
        *counter = counter.saturating_sub(1);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SearchSession<HttpBackend> {
    /// Open the local database under `config.data_dir` and talk to the
    /// backend at `config.api_root`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        let store = Store::open(&config.db_path())?;
        let credentials = CredentialStore::load(store)?;
        let backend = HttpBackend::new(config)?;
        log::info!("Using search backend at {}", backend.api_root());
        Ok(Self::new(backend, credentials, config.page_size))
    }
}

impl<B: SearchBackend> SearchSession<B> {
    pub fn new(backend: B, credentials: CredentialStore, page_size: usize) -> Self {
        backend.set_api_key(credentials.get());
        let state = SessionState {
            page: PageSpec::new(page_size),
            ..Default::default()
        };
        Self {
            backend,
            credentials: Mutex::new(credentials),
            state: Mutex::new(state),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // --- credential ---

    pub fn is_configured(&self) -> bool {
        lock(&self.credentials).is_configured()
    }

    pub fn api_key(&self) -> Option<String> {
        lock(&self.credentials).get().map(str::to_string)
    }

    /// Persist a new API key and point the backend at it. Drops the cached
    /// catalog and any in-flight search results.
    pub fn set_api_key(&self, key: &str) -> Result<(), AppError> {
        {
            let mut credentials = lock(&self.credentials);
            credentials.set(key)?;
            self.backend.set_api_key(credentials.get());
        }
        self.forget_credential_state();
        Ok(())
    }

    pub fn clear_api_key(&self) -> Result<(), AppError> {
        {
            let mut credentials = lock(&self.credentials);
            credentials.clear()?;
            self.backend.set_api_key(None);
        }
        self.forget_credential_state();
        Ok(())
    }

    fn forget_credential_state(&self) {
        let mut state = lock(&self.state);
        state.catalog = None;
        state.credential_epoch += 1;
        state.generation += 1;
    }

    // --- catalog ---

    /// Fetch the indexed chats unless they are already cached for the
    /// current key.
    pub async fn load_chat_catalog(&self) -> Result<(), AppError> {
        let cached = lock(&self.state).catalog.is_some();
        if cached {
            return Ok(());
        }
        self.reload_chat_catalog().await
    }

    /// Fetch the indexed chats, replacing any cached catalog.
    pub async fn reload_chat_catalog(&self) -> Result<(), AppError> {
        if !self.is_configured() {
            return Ok(());
        }

        let epoch = {
            let mut state = lock(&self.state);
            state.catalog_loads_in_flight += 1;
            state.credential_epoch
        };
        let in_flight = InFlight {
            state: &self.state,
            activity: Activity::Catalog,
        };
        let result = self.backend.indexed_chats().await;
        drop(in_flight);

        let indexed = result?;
        let mut state = lock(&self.state);
        if state.credential_epoch != epoch {
            log::debug!("Dropping chat catalog fetched with a previous API key");
            return Ok(());
        }
        log::info!(
            "Loaded {} indexed chats (master key: {})",
            indexed.chats.len(),
            indexed.master
        );
        state.catalog = Some(indexed.into());
        Ok(())
    }

    pub fn indexed_chats(&self) -> Vec<IndexChat> {
        lock(&self.state)
            .catalog
            .as_ref()
            .map(|c| c.chats.clone())
            .unwrap_or_default()
    }

    /// Whether the backend reported the current key as a master key.
    pub fn is_master(&self) -> bool {
        lock(&self.state)
            .catalog
            .as_ref()
            .is_some_and(|c| c.master)
    }

    pub fn is_loading_chats(&self) -> bool {
        lock(&self.state).catalog_loads_in_flight > 0
    }

    // --- search ---

    /// Run the current query against the multi-chat endpoint.
    ///
    /// On failure the previous results stay in place and the error is
    /// returned after being logged.
    pub async fn search(&self) -> Result<SearchOutcome, AppError> {
        if !self.is_configured() {
            return Ok(SearchOutcome::NotConfigured);
        }

        let (generation, request) = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.searches_in_flight += 1;
            (state.generation, state.request().multi_chat())
        };
        let in_flight = InFlight {
            state: &self.state,
            activity: Activity::Search,
        };
        log::debug!(
            "Searching {:?} (limit {:?}, offset {:?}, generation {})",
            request.query,
            request.limit,
            request.offset,
            generation
        );
        let result = self.backend.multi_search(&request).await;
        drop(in_flight);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                log::error!("Search failed: {}", e);
                return Err(e.into());
            }
        };

        let mut state = lock(&self.state);
        if state.generation != generation {
            log::debug!(
                "Dropping stale search response (generation {}, latest {})",
                generation,
                state.generation
            );
            return Ok(SearchOutcome::Superseded);
        }
        state.results = ResultSet::from(response);
        Ok(SearchOutcome::Applied)
    }

    /// Jump to `page` and fetch it. Pages outside `[1, total_pages]` are
    /// ignored.
    pub async fn go_to_page(&self, page: usize) -> Result<SearchOutcome, AppError> {
        let moved = {
            let mut state = lock(&self.state);
            let total = state.results.estimated_total;
            state.page.go_to(page, total)
        };
        if !moved {
            return Ok(SearchOutcome::PageOutOfRange);
        }
        self.search().await
    }

    pub fn set_query(&self, text: impl Into<String>) {
        let mut state = lock(&self.state);
        state.query = Query::new(text);
        state.invalidate_results();
    }

    pub fn set_chat_filter<I: IntoIterator<Item = i64>>(&self, chat_ids: I) {
        let mut state = lock(&self.state);
        state.filter.chat_ids = chat_ids.into_iter().collect();
        state.invalidate_results();
    }

    pub fn set_user_filter<I: IntoIterator<Item = i64>>(&self, user_ids: I) {
        let mut state = lock(&self.state);
        state.filter.user_ids = user_ids.into_iter().collect();
        state.invalidate_results();
    }

    pub fn set_type_filter<I, S>(&self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = lock(&self.state);
        state.filter.types = types.into_iter().map(Into::into).collect();
        state.invalidate_results();
    }

    /// Search every indexed chat instead of the selected ids. Only sent
    /// when the catalog says the key is a master key.
    pub fn set_all_chats(&self, enabled: bool) {
        let mut state = lock(&self.state);
        state.all_chats = enabled;
        state.invalidate_results();
    }

    /// Returns false (and changes nothing) for a zero page size. A resize
    /// rewinds to page 1, so a search still in flight for the old paging
    /// is dropped. The current results are kept.
    pub fn set_page_size(&self, page_size: usize) -> bool {
        let mut state = lock(&self.state);
        let resized = state.page.resize(page_size);
        if resized {
            state.generation += 1;
        }
        resized
    }

    pub fn reset_search(&self) {
        lock(&self.state).invalidate_results();
    }

    // --- derived state ---

    pub fn query(&self) -> String {
        lock(&self.state).query.text().to_string()
    }

    pub fn filter(&self) -> ChatFilter {
        lock(&self.state).filter.clone()
    }

    pub fn all_chats(&self) -> bool {
        lock(&self.state).all_chats
    }

    pub fn page(&self) -> PageSpec {
        lock(&self.state).page
    }

    pub fn current_page(&self) -> usize {
        lock(&self.state).page.current_page()
    }

    pub fn page_size(&self) -> usize {
        lock(&self.state).page.page_size()
    }

    pub fn offset(&self) -> usize {
        lock(&self.state).page.offset()
    }

    pub fn total_pages(&self) -> usize {
        lock(&self.state).total_pages()
    }

    /// Snapshot of the last applied results.
    pub fn results(&self) -> ResultSet {
        lock(&self.state).results.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).searches_in_flight > 0
    }

    // --- other endpoints; `None` when no key is configured ---

    pub async fn chat_index(&self, chat_id: i64) -> Result<Option<IndexChat>, AppError> {
        if !self.is_configured() {
            return Ok(None);
        }
        Ok(self.backend.chat_index(chat_id).await?)
    }

    /// Search one chat with the current query, user/type filters and page.
    /// Does not touch the session's result set.
    pub async fn search_in_chat(&self, chat_id: i64) -> Result<Option<SearchResponse>, AppError> {
        if !self.is_configured() {
            return Ok(None);
        }
        let request = lock(&self.state).request().single_chat();
        Ok(Some(self.backend.search_in_chat(chat_id, &request).await?))
    }

    pub async fn fetch_messages(
        &self,
        chat_id: i64,
        ids: &[i64],
    ) -> Result<Option<SearchResponse>, AppError> {
        if !self.is_configured() {
            return Ok(None);
        }
        Ok(Some(self.backend.fetch_messages(chat_id, ids).await?))
    }

    pub async fn reply(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<Option<MessageResponse>, AppError> {
        if !self.is_configured() {
            return Ok(None);
        }
        let request = ReplyRequest {
            chat_id,
            message_id,
            text: text.to_string(),
        };
        Ok(Some(self.backend.reply(&request).await?))
    }

    pub async fn forward(
        &self,
        from_chat_id: i64,
        to_chat_id: i64,
        message_ids: &[i64],
    ) -> Result<Option<MessageResponse>, AppError> {
        if !self.is_configured() {
            return Ok(None);
        }
        let request = ForwardRequest {
            from_chat_id,
            to_chat_id,
            message_ids: message_ids.to_vec(),
        };
        Ok(Some(self.backend.forward(&request).await?))
    }

    /// Attachments are served without the bearer key, so this is not gated.
    pub async fn open_file(&self, chat_id: i64, message_id: i64) -> Result<FileStream, AppError> {
        Ok(self.backend.open_file(chat_id, message_id).await?)
    }
}
