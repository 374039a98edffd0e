use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::auth::TokenCache;
use super::constants::{self, headers, timeouts};
use super::error::{OptionSetError, Result};
use super::metadata::models::Collection;
use super::metadata::{OptionMetadata, OptionSetDef, PicklistAttributeDef};
use super::models::Credentials;
use super::operations::{
    BatchReport, BatchRequest, BatchRequestBuilder, BatchResponseParser, BulkOptions, BulkPhase,
    OptionAction,
};
use super::payload::{CreateOptionSetRequest, OptionItem, PayloadBuilder, TargetRef};
use super::progress::{NoopProgress, ProgressSink};

/// Status and raw body of a successful single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
}

impl ApiResponse {
    /// Parse the body as JSON; an empty body (204) yields `Null`
    pub fn json(&self) -> Result<serde_json::Value> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Dataverse OptionSet client with connection pooling and a cached token
pub struct OptionSetClient {
    base_url: String,
    http_client: reqwest::Client,
    token_cache: TokenCache,
    payloads: PayloadBuilder,
    progress: Arc<dyn ProgressSink>,
}

impl OptionSetClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("optionset-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_http_client(credentials, http_client))
    }

    /// Create a client on top of a preconfigured HTTP client
    pub fn with_http_client(credentials: Credentials, http_client: reqwest::Client) -> Self {
        Self {
            base_url: credentials.base_url.clone(),
            token_cache: TokenCache::new(credentials, http_client.clone()),
            http_client,
            payloads: PayloadBuilder::default(),
            progress: Arc::new(NoopProgress),
        }
    }

    /// Send token requests to another identity provider host
    pub fn with_authority(self, authority_host: &str) -> Self {
        let credentials = self.token_cache.credentials().clone();
        Self {
            token_cache: TokenCache::with_authority(
                credentials,
                authority_host,
                self.http_client.clone(),
            ),
            ..self
        }
    }

    pub fn with_progress(self, progress: impl ProgressSink + 'static) -> Self {
        Self {
            progress: Arc::new(progress),
            ..self
        }
    }

    pub fn with_language_code(self, language_code: i32) -> Self {
        Self {
            payloads: PayloadBuilder::new(language_code),
            ..self
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn language_code(&self) -> i32 {
        self.payloads.language_code()
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.token_cache
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Global option set by schema name; `None` on 404
    pub async fn get_global_optionset(&self, name: &str) -> Result<Option<OptionSetDef>> {
        let url = constants::global_optionset_endpoint(&self.base_url, name);
        self.get_optional(&url, timeouts::SINGLE).await
    }

    pub async fn list_global_optionsets(&self) -> Result<Vec<OptionSetDef>> {
        let url = constants::global_optionsets_endpoint(&self.base_url);
        match self.get_optional::<Collection<OptionSetDef>>(&url, timeouts::LIST).await? {
            Some(collection) => Ok(collection.value),
            None => Err(OptionSetError::NotFound {
                what: "GlobalOptionSetDefinitions".to_string(),
            }),
        }
    }

    /// Global option sets whose DisplayName in `language_code` contains `text`.
    ///
    /// The API cannot `$filter` on DisplayName, so this lists everything and
    /// matches client-side.
    pub async fn search_global_optionsets_by_label(
        &self,
        text: &str,
        language_code: i32,
    ) -> Result<Vec<OptionSetDef>> {
        let all = self.list_global_optionsets().await?;
        let total = all.len();
        let matches: Vec<_> = all
            .into_iter()
            .filter(|def| def.display_name_contains(text, language_code))
            .collect();
        debug!(
            "Label search '{}' matched {} of {} global option sets",
            text,
            matches.len(),
            total
        );
        Ok(matches)
    }

    /// Picklist attribute with its local option set; `None` on 404
    pub async fn get_local_optionset(
        &self,
        entity: &str,
        attribute: &str,
    ) -> Result<Option<PicklistAttributeDef>> {
        let url = constants::local_optionset_endpoint(&self.base_url, entity, attribute);
        self.get_optional(&url, timeouts::SINGLE).await
    }

    /// Current options of the target; empty when the target does not exist
    pub async fn get_optionset_options(&self, target: &TargetRef) -> Result<Vec<OptionMetadata>> {
        let options = match target {
            TargetRef::Global { name } => self
                .get_global_optionset(name)
                .await?
                .map(|def| def.options),
            TargetRef::Local { entity, attribute } => self
                .get_local_optionset(entity, attribute)
                .await?
                .and_then(|attr| attr.option_set)
                .map(|def| def.options),
        };

        if options.is_none() {
            debug!("Option set {} not found, treating as empty", target);
        }
        Ok(options.unwrap_or_default())
    }

    pub async fn get_existing_values(&self, target: &TargetRef) -> Result<BTreeSet<i32>> {
        Ok(self
            .get_optionset_options(target)
            .await?
            .into_iter()
            .filter_map(|opt| opt.value)
            .collect())
    }

    /// `label -> value` for every option that has a label in `language_code`
    pub async fn get_existing_labels(
        &self,
        target: &TargetRef,
        language_code: i32,
    ) -> Result<BTreeMap<String, i32>> {
        Ok(self
            .get_optionset_options(target)
            .await?
            .iter()
            .filter_map(|opt| {
                let value = opt.value?;
                let label = opt.label.label_for(language_code)?;
                Some((label.to_string(), value))
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Single-record writes
    // ------------------------------------------------------------------

    /// Create a global option set; fails if the name is taken
    pub async fn create_global_optionset(
        &self,
        request: &CreateOptionSetRequest,
    ) -> Result<ApiResponse> {
        info!(
            "Creating global option set {} with {} option(s)",
            request.name,
            request.options.len()
        );
        let url = constants::global_optionsets_endpoint(&self.base_url);
        let body = self.payloads.create_body(request);
        self.post_json(&url, &body, timeouts::CREATE).await
    }

    pub async fn insert_option(&self, item: &OptionItem, target: &TargetRef) -> Result<ApiResponse> {
        let body = self.payloads.insert_payload(item, target);
        self.post_action(OptionAction::Insert, &body).await
    }

    pub async fn update_option(
        &self,
        item: &OptionItem,
        target: &TargetRef,
        merge_labels: bool,
    ) -> Result<ApiResponse> {
        let body = self.payloads.update_payload(item, target, merge_labels);
        self.post_action(OptionAction::Update, &body).await
    }

    /// Only `item.value` is sent
    pub async fn delete_option(&self, item: &OptionItem, target: &TargetRef) -> Result<ApiResponse> {
        let body = self.payloads.delete_payload(item, target);
        self.post_action(OptionAction::Delete, &body).await
    }

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Empty `options` return an empty report without a token refresh or request
    pub async fn bulk_insert_options(
        &self,
        options: &[OptionItem],
        target: &TargetRef,
        bulk: BulkOptions,
    ) -> Result<BatchReport> {
        self.execute_bulk(OptionAction::Insert, options, target, bulk)
            .await
    }

    /// Empty `options` return an empty report without a token refresh or request
    pub async fn bulk_update_options(
        &self,
        options: &[OptionItem],
        target: &TargetRef,
        bulk: BulkOptions,
    ) -> Result<BatchReport> {
        self.execute_bulk(OptionAction::Update, options, target, bulk)
            .await
    }

    /// Empty `options` return an empty report without a token refresh or request
    pub async fn bulk_delete_options(
        &self,
        options: &[OptionItem],
        target: &TargetRef,
        bulk: BulkOptions,
    ) -> Result<BatchReport> {
        self.execute_bulk(OptionAction::Delete, options, target, bulk)
            .await
    }

    /// Insert only the options whose value is not in the target yet.
    ///
    /// Returns the batch report (`None` when nothing was new and no batch
    /// was sent) plus the skipped duplicates in input order.
    pub async fn safe_bulk_insert(
        &self,
        options: &[OptionItem],
        target: &TargetRef,
        continue_on_error: bool,
    ) -> Result<(Option<BatchReport>, Vec<OptionItem>)> {
        let existing = self.get_existing_values(target).await?;
        let (skipped, to_insert): (Vec<OptionItem>, Vec<OptionItem>) = options
            .iter()
            .cloned()
            .partition(|opt| existing.contains(&opt.value));

        if !skipped.is_empty() {
            self.progress.emit(&format!(
                "Skipping {} duplicate(s) already in the OptionSet",
                skipped.len()
            ));
        }

        if to_insert.is_empty() {
            self.progress
                .emit("Nothing to insert, all options already exist.");
            return Ok((None, skipped));
        }

        let bulk = BulkOptions::insert().continue_on_error(continue_on_error);
        let report = self.bulk_insert_options(&to_insert, target, bulk).await?;
        Ok((Some(report), skipped))
    }

    /// One `$batch` round trip for `options`, always on a fresh token
    async fn execute_bulk(
        &self,
        action: OptionAction,
        options: &[OptionItem],
        target: &TargetRef,
        bulk: BulkOptions,
    ) -> Result<BatchReport> {
        if options.is_empty() {
            debug!("{} batch for {} skipped: no options", action.verb(), target);
            return Ok(BatchReport::new(0));
        }

        let mut phase = BulkPhase::Idle;

        advance(&mut phase, BulkPhase::TokenRefreshing, action);
        let token = self.token_cache.get_token(true).await?;

        advance(&mut phase, BulkPhase::PayloadBuilding, action);
        let batch = match action {
            OptionAction::Insert => {
                let payloads: Vec<_> = options
                    .iter()
                    .map(|item| self.payloads.insert_payload(item, target))
                    .collect();
                encode(&mut phase, action, &payloads)?
            }
            OptionAction::Update => {
                let payloads: Vec<_> = options
                    .iter()
                    .map(|item| self.payloads.update_payload(item, target, bulk.merge_labels))
                    .collect();
                encode(&mut phase, action, &payloads)?
            }
            OptionAction::Delete => {
                let payloads: Vec<_> = options
                    .iter()
                    .map(|item| self.payloads.delete_payload(item, target))
                    .collect();
                encode(&mut phase, action, &payloads)?
            }
        };

        self.progress.emit(&format!(
            "Sending batch {} for {} options …",
            action.verb(),
            options.len()
        ));

        advance(&mut phase, BulkPhase::InFlight, action);
        let mut request = self
            .http_client
            .post(constants::batch_endpoint(&self.base_url))
            .bearer_auth(&token)
            .header("Content-Type", batch.content_type())
            .header("Accept", "application/json")
            .header("OData-MaxVersion", headers::ODATA_VERSION)
            .header("OData-Version", headers::ODATA_VERSION)
            .timeout(timeouts::BATCH);
        if bulk.continue_on_error {
            request = request.header("Prefer", headers::PREFER_CONTINUE_ON_ERROR);
        }

        let response = request.body(batch.body.clone()).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!(
                "{} batch for {} failed with HTTP {}",
                action.verb(),
                target,
                status.as_u16()
            );
            error!("Batch request body:\n{}", batch.body);
            error!("Batch response:\n{}", text);
            return Err(OptionSetError::remote(status.as_u16(), text, Some(batch.body)));
        }

        advance(&mut phase, BulkPhase::ResponseDecoding, action);
        let report = BatchResponseParser::parse(&text, options);

        advance(&mut phase, BulkPhase::Reported, action);
        self.progress.emit(&format!(
            "Batch {} complete: {}/{} succeeded",
            action.verb(),
            report.succeeded,
            report.total
        ));
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Transport helpers
    // ------------------------------------------------------------------

    /// GET and deserialize; 404 maps to `None`, other failures to `RemoteApi`
    async fn get_optional<T: DeserializeOwned>(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<T>> {
        let token = self.token_cache.get_token(false).await?;

        debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .header("OData-MaxVersion", headers::ODATA_VERSION)
            .header("OData-Version", headers::ODATA_VERSION)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("GET {} returned 404", url);
            return Ok(None);
        }

        let text = response.text().await?;
        if !status.is_success() {
            error!("GET {} failed with HTTP {}: {}", url, status.as_u16(), text);
            return Err(OptionSetError::remote(status.as_u16(), text, None));
        }

        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn post_action<B: Serialize>(&self, action: OptionAction, body: &B) -> Result<ApiResponse> {
        let url = constants::action_endpoint(&self.base_url, action.action_name());
        self.post_json(&url, body, timeouts::SINGLE).await
    }

    /// POST a JSON body; any non-2xx fails fast with `RemoteApi`
    async fn post_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<ApiResponse> {
        let token = self.token_cache.get_token(false).await?;
        let payload = serde_json::to_string(body)?;

        debug!("POST {}", url);
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&token)
            .header("Content-Type", headers::CONTENT_TYPE_JSON)
            .header("Accept", "application/json")
            .header("OData-MaxVersion", headers::ODATA_VERSION)
            .header("OData-Version", headers::ODATA_VERSION)
            .timeout(timeout)
            .body(payload.clone())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!("POST {} failed with HTTP {}: {}", url, status.as_u16(), text);
            return Err(OptionSetError::remote(status.as_u16(), text, Some(payload)));
        }

        Ok(ApiResponse {
            status_code: status.as_u16(),
            body: text,
        })
    }
}

fn advance(phase: &mut BulkPhase, next: BulkPhase, action: OptionAction) {
    debug!("{} batch: {:?} -> {:?}", action.verb(), phase, next);
    *phase = next;
}

fn encode<T: Serialize>(
    phase: &mut BulkPhase,
    action: OptionAction,
    payloads: &[T],
) -> Result<BatchRequest> {
    advance(phase, BulkPhase::BatchEncoding, action);
    let batch = BatchRequestBuilder::new(action)
        .add_payloads(payloads)?
        .build();
    debug!(
        "Encoded {} {} payload(s) under boundary {}",
        batch.item_count,
        action.verb(),
        batch.boundary
    );
    Ok(batch)
}
