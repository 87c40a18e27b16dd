//! API Handlers
//!
//! HTTP request handlers for each document store endpoint. Every handler
//! works on its own clone of the shared [`DocumentStore`] cursor.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::models::requests::validate_key;
use crate::models::{
    AppendRequest, AppendResponse, CachedTermResponse, HealthResponse, HomeSectionRequest,
    NamespaceResponse, SearchQuery, SearchResponse, StatsResponse,
};
use crate::remote::MetadataClient;
use crate::store::{
    AuthRecord, ByteBudgetStore, DocumentStore, Table, UserSummary, DEFAULT_NAMESPACE,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared byte store
    pub store: Arc<ByteBudgetStore>,
    /// Cursor bound to `store`; cloned per request
    pub documents: DocumentStore,
    /// Remote metadata source for the search endpoint
    pub metadata: Option<Arc<MetadataClient>>,
}

impl AppState {
    /// Creates a new AppState over the given byte store.
    pub fn new(store: ByteBudgetStore) -> Self {
        let store = Arc::new(store);
        let documents = DocumentStore::new(store.clone());
        Self {
            store,
            documents,
            metadata: None,
        }
    }

    /// Attaches the remote metadata client.
    pub fn with_metadata(mut self, client: MetadataClient) -> Self {
        self.metadata = Some(Arc::new(client));
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Applies the configured budget and creates the shared default namespace.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut state = Self::new(ByteBudgetStore::with_budget(config.budget_bytes)?);
        if let Some(client) = MetadataClient::from_config(config)? {
            state = state.with_metadata(client);
        } else {
            info!("Metadata API not configured, search endpoint disabled");
        }
        state.documents.create_tables()?;
        Ok(state)
    }

    /// A fresh cursor pointed at `name`.
    fn cursor(&self, name: &str) -> Result<DocumentStore> {
        if let Some(error_msg) = validate_key(name) {
            return Err(StoreError::InvalidRequest(error_msg));
        }
        let mut documents = self.documents.clone();
        documents.reset(name);
        Ok(documents)
    }
}

/// Handler for PUT /namespaces/:name
///
/// Creates the namespace's tables if they do not exist yet.
pub async fn create_namespace_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<NamespaceResponse>> {
    let documents = state.cursor(&name)?;
    documents.create_tables()?;

    Ok(Json(NamespaceResponse::new(
        documents.namespace(),
        documents.document()?,
    )))
}

/// Handler for GET /namespaces/:name
pub async fn get_namespace_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<NamespaceResponse>> {
    let documents = state.cursor(&name)?;

    Ok(Json(NamespaceResponse::new(
        documents.namespace(),
        documents.document()?,
    )))
}

/// Handler for POST /namespaces/:name/records
///
/// Appends one record to the requested table, evicting old records if the
/// store is short on space.
pub async fn append_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<AppendRequest>,
) -> Result<Json<AppendResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(StoreError::InvalidRequest(error_msg));
    }

    let mut documents = state.cursor(&name)?;
    documents.set_pending_save_target(req.table);
    let appended = documents.append(&req.key, req.payload)?;

    Ok(Json(AppendResponse::new(
        documents.namespace(),
        req.table,
        req.key,
        appended,
        documents.remaining_space(),
    )))
}

/// Handler for GET /namespaces/:name/tables/:table/terms/:term
pub async fn cached_term_handler(
    State(state): State<AppState>,
    Path((name, table, term)): Path<(String, String, String)>,
) -> Result<Json<CachedTermResponse>> {
    let table = Table::from_str(&table)?;
    let documents = state.cursor(&name)?;
    let records = documents.table(table)?;
    let payload = documents.is_term_cached(&term, &records).cloned();

    Ok(Json(CachedTermResponse::new(term, table, payload)))
}

/// Handler for GET /namespaces/:name/summary
pub async fn summary_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<UserSummary>> {
    Ok(Json(state.cursor(&name)?.user_summary()?))
}

/// Handler for GET /accounts/:email
///
/// Searches every namespace's authentication table.
pub async fn account_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AuthRecord>> {
    state
        .documents
        .lookup_by_email(&email)
        .map(Json)
        .ok_or(StoreError::NotFound(email))
}

/// Handler for PUT /home/:section
pub async fn home_section_handler(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(req): Json<HomeSectionRequest>,
) -> Result<Json<AppendResponse>> {
    if let Some(error_msg) = validate_key(&section).or_else(|| req.validate()) {
        return Err(StoreError::InvalidRequest(error_msg));
    }

    let appended = state
        .documents
        .save_home_section(&section, &req.title, &req.description)?;

    Ok(Json(AppendResponse::new(
        DEFAULT_NAMESPACE,
        Table::HomePage,
        section,
        appended,
        state.store.remaining_space(),
    )))
}

/// Handler for GET /search/:term
///
/// Serves the term from the namespace's search terms if cached, otherwise
/// queries the metadata API and caches the result.
pub async fn search_handler(
    State(state): State<AppState>,
    Path(term): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>> {
    if let Some(error_msg) = validate_key(&term) {
        return Err(StoreError::InvalidRequest(error_msg));
    }
    let client = state
        .metadata
        .clone()
        .ok_or_else(|| StoreError::Unavailable("Metadata API is not configured".to_string()))?;

    let documents = state.cursor(&query.namespace)?;
    if documents.namespace() == DEFAULT_NAMESPACE {
        documents.create_tables()?;
    }

    let remote_term = term.clone();
    let fetched = documents
        .cached_fetch(Table::SearchTerms, &term, move || async move {
            client
                .search(&remote_term)
                .await
                .map_err(|err| StoreError::Upstream(format!("{:#}", err)))
        })
        .await?;

    Ok(Json(SearchResponse::new(term, documents.namespace(), fetched)))
}

/// Handler for GET /stats
///
/// Returns space accounting and cache-aside counters.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.store.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
