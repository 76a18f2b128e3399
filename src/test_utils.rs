//! In-memory stand-ins for the store and the external APIs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, http::StatusCode};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

use crate::config::LinkTokenSettings;
use crate::error::AppError;
use crate::models::linked_account::{LinkedAccount, ReconcileState};
use crate::models::plaid::{
    LinkTokenCreateRequest, PublicTokenExchangeResponse, TransactionsSyncResponse,
};
use crate::models::transaction::{LedgerTransaction, NewTransaction};
use crate::services::plaid_client::{Aggregator, PlaidError};
use crate::services::sms_service::{SmsError, SmsNotifier};
use crate::services::twilio_signature::RequestValidator;
use crate::state::AppState;
use crate::stores::LedgerStore;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_fake_api(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind fake API");
    let addr = listener.local_addr().expect("fake API has no address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("fake API stopped");
    });

    format!("http://{addr}")
}

/// Everything [`MemoryStore`] holds, plus call counters.
#[derive(Debug, Default)]
pub struct MemoryState {
    pub accounts: Vec<LinkedAccount>,
    pub pending: Vec<LedgerTransaction>,
    pub approved: Vec<LedgerTransaction>,
    /// Source ids of rejected transactions
    pub rejected: Vec<String>,
    pub next_transaction_id: i64,
    /// Every trait call, reads included
    pub calls: usize,
    pub writes: usize,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_transaction_id += 1;
        self.next_transaction_id
    }
}

/// [`LedgerStore`] backed by vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(access_token: &str, item_id: &str) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().accounts.push(LinkedAccount {
            id: 1,
            access_token: access_token.to_string(),
            item_id: item_id.to_string(),
            cursor: None,
            current_month: Utc::now(),
            needs_reconcile: false,
            currently_reconciling: false,
            current_tx: None,
        });
        store
    }

    pub fn snapshot<T>(&self, read: impl FnOnce(&MemoryState) -> T) -> T {
        read(&self.state.lock().unwrap())
    }

    pub fn update_account(&self, change: impl FnOnce(&mut LinkedAccount)) {
        let mut state = self.state.lock().unwrap();
        change(&mut state.accounts[0]);
    }

    /// Add a pending transaction dated one minute after the previous one.
    pub fn seed_pending(&self, name: &str, amount_cents: i64) -> LedgerTransaction {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let transaction = LedgerTransaction {
            id,
            source_transaction_id: Some(format!("seed-{id}")),
            name: name.to_string(),
            amount_cents,
            category: "Shops".to_string(),
            category_id: 19000000,
            date: base_date() + Duration::minutes(id),
        };
        state.pending.push(transaction.clone());
        transaction
    }
}

fn base_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn sorted(mut transactions: Vec<LedgerTransaction>) -> Vec<LedgerTransaction> {
    transactions.sort_by_key(|tx| (tx.date, tx.id));
    transactions
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.state.lock().unwrap().calls += 1;
        Ok(())
    }

    async fn linked_account(&self) -> Result<Option<LinkedAccount>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.accounts.first().cloned())
    }

    async fn save_item_link(
        &self,
        access_token: &str,
        item_id: &str,
    ) -> Result<LinkedAccount, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.writes += 1;

        match state.accounts.first_mut() {
            Some(account) => {
                account.access_token = access_token.to_string();
                account.item_id = item_id.to_string();
                Ok(account.clone())
            }
            None => {
                let account = LinkedAccount {
                    id: 1,
                    access_token: access_token.to_string(),
                    item_id: item_id.to_string(),
                    cursor: None,
                    current_month: Utc::now(),
                    needs_reconcile: false,
                    currently_reconciling: false,
                    current_tx: None,
                };
                state.accounts.push(account.clone());
                Ok(account)
            }
        }
    }

    async fn save_cursor(&self, account_id: i32, cursor: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.writes += 1;
        if let Some(account) = state.accounts.iter_mut().find(|a| a.id == account_id) {
            account.cursor = Some(cursor.to_string());
        }
        Ok(())
    }

    async fn save_reconcile_state(
        &self,
        account_id: i32,
        reconcile: &ReconcileState,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.writes += 1;
        if let Some(account) = state.accounts.iter_mut().find(|a| a.id == account_id) {
            account.needs_reconcile = reconcile.needs_reconcile;
            account.currently_reconciling = reconcile.currently_reconciling;
            account.current_tx = reconcile.current_tx.clone();
            account.current_month = reconcile.current_month;
        }
        Ok(())
    }

    async fn mark_needs_reconcile(&self, account_id: i32) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.writes += 1;
        if let Some(account) = state.accounts.iter_mut().find(|a| a.id == account_id) {
            account.needs_reconcile = true;
        }
        Ok(())
    }

    async fn add_pending(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Option<LedgerTransaction>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if let Some(source_id) = &transaction.source_transaction_id {
            let known = state
                .pending
                .iter()
                .chain(state.approved.iter())
                .any(|tx| tx.source_transaction_id.as_ref() == Some(source_id))
                || state.rejected.contains(source_id);
            if known {
                return Ok(None);
            }
        }

        state.writes += 1;
        let row = LedgerTransaction {
            id: state.next_id(),
            source_transaction_id: transaction.source_transaction_id.clone(),
            name: transaction.name.clone(),
            amount_cents: transaction.amount_cents,
            category: transaction.category.clone(),
            category_id: transaction.category_id,
            date: transaction.date,
        };
        state.pending.push(row.clone());
        Ok(Some(row))
    }

    async fn remove_pending_by_source_id(
        &self,
        source_transaction_id: &str,
    ) -> Result<u64, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.writes += 1;
        let before = state.pending.len();
        state
            .pending
            .retain(|tx| tx.source_transaction_id.as_deref() != Some(source_transaction_id));
        Ok((before - state.pending.len()) as u64)
    }

    async fn pending_transactions(&self) -> Result<Vec<LedgerTransaction>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(sorted(state.pending.clone()))
    }

    async fn approved_transactions(&self) -> Result<Vec<LedgerTransaction>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(sorted(state.approved.clone()))
    }

    async fn pending_transaction(&self, id: i64) -> Result<Option<LedgerTransaction>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        Ok(state.pending.iter().find(|tx| tx.id == id).cloned())
    }

    async fn approve(&self, id: i64) -> Result<LedgerTransaction, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let position = state
            .pending
            .iter()
            .position(|tx| tx.id == id)
            .ok_or(AppError::TransactionNotFound)?;

        state.writes += 1;
        let mut approved = state.pending.remove(position);
        approved.id = state.next_id();
        state.approved.push(approved.clone());
        Ok(approved)
    }

    async fn reject(&self, id: i64) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let position = state
            .pending
            .iter()
            .position(|tx| tx.id == id)
            .ok_or(AppError::TransactionNotFound)?;

        state.writes += 1;
        let rejected = state.pending.remove(position);
        if let Some(source_id) = rejected.source_transaction_id {
            state.rejected.push(source_id);
        }
        Ok(())
    }
}

/// [`Aggregator`] returning canned answers and recording what it was asked.
///
/// Exchanging `public-x` yields access token `access-public-x` and item id
/// `item-public-x`.
#[derive(Debug)]
pub struct StubAggregator {
    link_token: Result<Value, (StatusCode, Value)>,
    exchange_error: Option<(StatusCode, Value)>,
    sync_pages: Mutex<VecDeque<TransactionsSyncResponse>>,
    link_requests: Mutex<Vec<LinkTokenCreateRequest>>,
    exchanged: Mutex<Vec<String>>,
    sync_cursors: Mutex<Vec<Option<String>>>,
}

impl StubAggregator {
    pub fn new() -> Self {
        Self {
            link_token: Ok(json!({
                "link_token": "link-sandbox-abc",
                "expiration": "2024-03-14T12:00:00Z",
                "request_id": "req-1"
            })),
            exchange_error: None,
            sync_pages: Mutex::new(VecDeque::new()),
            link_requests: Mutex::new(Vec::new()),
            exchanged: Mutex::new(Vec::new()),
            sync_cursors: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_link_token(mut self, status: StatusCode, body: Value) -> Self {
        self.link_token = Err((status, body));
        self
    }

    pub fn failing_exchange(mut self, status: StatusCode, body: Value) -> Self {
        self.exchange_error = Some((status, body));
        self
    }

    pub fn with_sync_pages(self, pages: Vec<TransactionsSyncResponse>) -> Self {
        *self.sync_pages.lock().unwrap() = pages.into();
        self
    }

    pub fn link_requests(&self) -> Vec<LinkTokenCreateRequest> {
        self.link_requests.lock().unwrap().clone()
    }

    pub fn exchanged(&self) -> Vec<String> {
        self.exchanged.lock().unwrap().clone()
    }

    pub fn sync_cursors(&self) -> Vec<Option<String>> {
        self.sync_cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl Aggregator for StubAggregator {
    async fn create_link_token(
        &self,
        request: &LinkTokenCreateRequest,
    ) -> Result<Value, PlaidError> {
        self.link_requests.lock().unwrap().push(request.clone());

        self.link_token
            .clone()
            .map_err(|(status, body)| PlaidError::Api { status, body })
    }

    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<PublicTokenExchangeResponse, PlaidError> {
        self.exchanged.lock().unwrap().push(public_token.to_string());

        if let Some((status, body)) = self.exchange_error.clone() {
            return Err(PlaidError::Api { status, body });
        }

        Ok(PublicTokenExchangeResponse {
            access_token: format!("access-{public_token}"),
            item_id: format!("item-{public_token}"),
            request_id: None,
        })
    }

    async fn sync_transactions(
        &self,
        _access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionsSyncResponse, PlaidError> {
        self.sync_cursors
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));

        let page = self.sync_pages.lock().unwrap().pop_front();
        Ok(page.unwrap_or_else(|| TransactionsSyncResponse {
            added: Vec::new(),
            modified: Vec::new(),
            removed: Vec::new(),
            next_cursor: cursor.unwrap_or_default().to_string(),
            has_more: false,
        }))
    }
}

/// [`SmsNotifier`] that keeps messages in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send is rejected.
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsNotifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), SmsError> {
        if self.fail {
            return Err(SmsError::Api {
                status: StatusCode::UNAUTHORIZED,
                body: "{\"code\": 20003}".to_string(),
            });
        }

        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

pub fn link_settings() -> LinkTokenSettings {
    LinkTokenSettings {
        client_name: "YourAppName".to_string(),
        country_codes: vec!["US".to_string()],
        products: vec!["transactions".to_string()],
        webhook_url: Some("https://example.com/webhook".to_string()),
        redirect_uri: None,
    }
}

/// State wired to the given stand-ins, with no owner phone restriction and
/// SMS signatures checked against [`sign_sms`].
pub fn test_state(
    store: Arc<MemoryStore>,
    aggregator: Arc<StubAggregator>,
    notifier: Arc<RecordingNotifier>,
) -> AppState {
    AppState {
        store,
        aggregator,
        notifier,
        link_settings: link_settings(),
        owner_phone: None,
        sms_validator: Some(sms_validator()),
    }
}

const SMS_AUTH_TOKEN: &str = "test-auth-token";
const SMS_WEBHOOK_URL: &str = "https://example.com/sms";

pub fn sms_validator() -> RequestValidator {
    RequestValidator::new(SMS_AUTH_TOKEN, Some(SMS_WEBHOOK_URL.to_string()))
}

/// `X-Twilio-Signature` for posting `form` to the test state's `/sms`.
pub fn sign_sms(form: &[(&str, &str)]) -> String {
    let params: Vec<(String, String)> = form
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    sms_validator().sign(SMS_WEBHOOK_URL, &params)
}
