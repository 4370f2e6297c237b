//! HTTP backends: algod v2 REST as a [`Ledger`], plus a minimal indexer client.

use crate::ledger::{CreatedApp, GroupOutcome, Ledger, SimulateOutcome, TxnResult};
use crate::transaction::{SignedTransaction, StateSchema, SuggestedParams, VALIDITY_WINDOW};
use crate::{Account, Error};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use game_types::Address;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const ALGOD_TOKEN_HEADER: &str = "X-Algod-API-Token";
const INDEXER_TOKEN_HEADER: &str = "X-Indexer-API-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Confirmation polling: 40 × 250ms covers ten localnet/devnet rounds.
const CONFIRM_ATTEMPTS: u32 = 40;
const CONFIRM_INTERVAL: Duration = Duration::from_millis(250);

// --- algod REST types ---

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ParamsResponse {
    #[serde(default)]
    fee: u64,
    genesis_hash: String,
    genesis_id: String,
    last_round: u64,
    min_fee: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct PendingResponse {
    #[serde(default)]
    confirmed_round: Option<u64>,
    #[serde(default)]
    pool_error: String,
    #[serde(default)]
    logs: Vec<String>,
    #[serde(default)]
    application_index: Option<u64>,
}

#[derive(Serialize)]
struct SimulateRequest<'a> {
    #[serde(rename = "txn-groups")]
    txn_groups: Vec<SimulateRequestGroup<'a>>,
}

#[derive(Serialize)]
struct SimulateRequestGroup<'a> {
    txns: &'a [SignedTransaction],
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SimulateResponse {
    txn_groups: Vec<SimulateGroupResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SimulateGroupResult {
    #[serde(default)]
    txn_results: Vec<SimulateTxnResult>,
    #[serde(default)]
    app_budget_added: u64,
    #[serde(default)]
    app_budget_consumed: u64,
    #[serde(default)]
    failure_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SimulateTxnResult {
    txn_result: PendingResponse,
}

#[derive(Deserialize)]
struct BoxResponse {
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AccountResponse {
    amount: u64,
    #[serde(default)]
    created_apps: Vec<AppResponse>,
}

#[derive(Deserialize)]
struct AppResponse {
    id: u64,
    params: AppParams,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AppParams {
    approval_program: String,
    clear_state_program: String,
    #[serde(default)]
    global_state_schema: Option<SchemaResponse>,
    #[serde(default)]
    local_state_schema: Option<SchemaResponse>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct SchemaResponse {
    #[serde(default)]
    num_uint: u64,
    #[serde(default)]
    num_byte_slice: u64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

impl ParamsResponse {
    fn into_params(self) -> Result<SuggestedParams, Error> {
        let hash = B64.decode(&self.genesis_hash)?;
        let genesis_hash: [u8; 32] = hash
            .as_slice()
            .try_into()
            .map_err(|_| Error::Encode(format!("genesis hash must be 32 bytes, got {}", hash.len())))?;
        Ok(SuggestedParams {
            min_fee: self.fee.max(self.min_fee),
            first_valid: self.last_round,
            last_valid: self.last_round + VALIDITY_WINDOW,
            genesis_id: self.genesis_id,
            genesis_hash,
        })
    }
}

impl PendingResponse {
    fn into_result(self, tx_id: String) -> Result<TxnResult, Error> {
        let logs = self
            .logs
            .iter()
            .map(|l| B64.decode(l))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TxnResult {
            tx_id,
            logs,
            created_app_id: self.application_index.filter(|id| *id != 0),
        })
    }
}

impl SimulateResponse {
    fn into_outcome(self, group: &[SignedTransaction]) -> Result<SimulateOutcome, Error> {
        let result = self
            .txn_groups
            .into_iter()
            .next()
            .ok_or_else(|| Error::Encode("simulate response has no groups".into()))?;
        if let Some(failure) = result.failure_message.filter(|m| !m.is_empty()) {
            return Err(Error::rejected(failure));
        }
        let txns = result
            .txn_results
            .into_iter()
            .zip(group)
            .map(|(r, stxn)| r.txn_result.into_result(stxn.id()?))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SimulateOutcome {
            txns,
            budget_consumed: result.app_budget_consumed,
            budget_added: result.app_budget_added,
        })
    }
}

impl AppResponse {
    fn into_created(self) -> Result<CreatedApp, Error> {
        let schema = |s: Option<SchemaResponse>| {
            let s = s.unwrap_or_default();
            StateSchema::new(s.num_uint, s.num_byte_slice)
        };
        // The account endpoint carries no creation note.
        Ok(CreatedApp {
            id: self.id,
            name: None,
            approval_program: B64.decode(&self.params.approval_program)?,
            clear_program: B64.decode(&self.params.clear_state_program)?,
            global_schema: schema(self.params.global_state_schema),
            local_schema: schema(self.params.local_state_schema),
        })
    }
}

fn build_http() -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))
}

/// Map non-2xx responses to [`Error::Algod`], using the JSON `message` when present.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    Err(Error::Algod {
        status: status.as_u16(),
        message,
    })
}

/// algod v2 REST client.
pub struct AlgodHttp {
    http: reqwest::Client,
    base_url: String,
    token: String,
    dispenser: Option<Account>,
}

impl AlgodHttp {
    pub fn new(base_url: &str, token: &str) -> Result<Self, Error> {
        Ok(Self {
            http: build_http()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            dispenser: None,
        })
    }

    /// Account used to fund fixture accounts.
    pub fn with_dispenser(mut self, dispenser: Account) -> Self {
        self.dispenser = Some(dispenser);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self
            .http
            .get(self.url(path))
            .header(ALGOD_TOKEN_HEADER, &self.token)
            .query(query)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn wait_for_confirmation(&self, tx_id: &str) -> Result<PendingResponse, Error> {
        let path = format!("/v2/transactions/pending/{tx_id}");
        for attempt in 1..=CONFIRM_ATTEMPTS {
            let pending: PendingResponse = self.get_json(&path, &[]).await?;
            if !pending.pool_error.is_empty() {
                return Err(Error::rejected(format!(
                    "transaction {tx_id}: {}",
                    pending.pool_error
                )));
            }
            if pending.confirmed_round.is_some_and(|r| r > 0) {
                return Ok(pending);
            }
            debug!(tx_id, attempt, "Waiting for confirmation");
            tokio::time::sleep(CONFIRM_INTERVAL).await;
        }
        Err(Error::Http(format!(
            "transaction {tx_id} not confirmed after {CONFIRM_ATTEMPTS} attempts"
        )))
    }
}

#[async_trait]
impl Ledger for AlgodHttp {
    async fn suggested_params(&self) -> Result<SuggestedParams, Error> {
        let params: ParamsResponse = self.get_json("/v2/transactions/params", &[]).await?;
        params.into_params()
    }

    async fn send_group(&self, group: Vec<SignedTransaction>) -> Result<GroupOutcome, Error> {
        let mut body = Vec::new();
        for stxn in &group {
            body.extend(stxn.encode()?);
        }
        let resp = self
            .http
            .post(self.url("/v2/transactions"))
            .header(ALGOD_TOKEN_HEADER, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(body)
            .send()
            .await?;
        let submitted: SubmitResponse = check(resp).await?.json().await?;
        info!(tx_id = %submitted.tx_id, txns = group.len(), "Submitted group");

        let mut confirmed_round = 0;
        let mut txns = Vec::with_capacity(group.len());
        for stxn in &group {
            let tx_id = stxn.id()?;
            let pending = self.wait_for_confirmation(&tx_id).await?;
            confirmed_round = pending.confirmed_round.unwrap_or_default();
            txns.push(pending.into_result(tx_id)?);
        }
        Ok(GroupOutcome {
            confirmed_round,
            txns,
        })
    }

    async fn simulate_group(
        &self,
        group: Vec<SignedTransaction>,
    ) -> Result<SimulateOutcome, Error> {
        let request = SimulateRequest {
            txn_groups: vec![SimulateRequestGroup { txns: &group }],
        };
        let resp = self
            .http
            .post(self.url("/v2/transactions/simulate"))
            .header(ALGOD_TOKEN_HEADER, &self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/msgpack")
            .query(&[("format", "json")])
            .body(rmp_serde::to_vec_named(&request)?)
            .send()
            .await?;
        let simulated: SimulateResponse = check(resp).await?.json().await?;
        simulated.into_outcome(&group)
    }

    async fn application_box_by_name(&self, app_id: u64, name: &[u8]) -> Result<Vec<u8>, Error> {
        let path = format!("/v2/applications/{app_id}/box");
        let query = [("name", format!("b64:{}", B64.encode(name)))];
        let found: BoxResponse = self.get_json(&path, &query).await?;
        Ok(B64.decode(found.value)?)
    }

    async fn account_balance(&self, address: &Address) -> Result<u64, Error> {
        let account: AccountResponse = self
            .get_json(&format!("/v2/accounts/{address}"), &[])
            .await?;
        Ok(account.amount)
    }

    async fn created_apps(&self, creator: &Address) -> Result<Vec<CreatedApp>, Error> {
        let account: AccountResponse = self
            .get_json(&format!("/v2/accounts/{creator}"), &[])
            .await?;
        account
            .created_apps
            .into_iter()
            .map(AppResponse::into_created)
            .collect()
    }

    fn dispenser(&self) -> Option<Account> {
        self.dispenser.clone()
    }
}

/// Indexer connection handed to the client. Only the health probe is used.
#[derive(Clone)]
pub struct IndexerHttp {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexerHealth {
    pub round: u64,
    #[serde(default)]
    pub db_available: bool,
    #[serde(default)]
    pub is_migrating: bool,
}

impl IndexerHttp {
    pub fn new(base_url: &str, token: &str) -> Result<Self, Error> {
        Ok(Self {
            http: build_http()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<IndexerHealth, Error> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .header(INDEXER_TOKEN_HEADER, &self.token)
            .send()
            .await?;
        let health: IndexerHealth = check(resp).await?.json().await?;
        if health.is_migrating {
            warn!(round = health.round, "Indexer is migrating");
        }
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    #[test]
    fn test_params_response() {
        let json = format!(
            r#"{{"consensus-version":"future","fee":0,"genesis-hash":"{}","genesis-id":"dockernet-v1","last-round":42,"min-fee":1000}}"#,
            B64.encode([5u8; 32])
        );
        let params = serde_json::from_str::<ParamsResponse>(&json)
            .unwrap()
            .into_params()
            .unwrap();
        assert_eq!(params.min_fee, 1000);
        assert_eq!(params.first_valid, 42);
        assert_eq!(params.last_valid, 42 + VALIDITY_WINDOW);
        assert_eq!(params.genesis_id, "dockernet-v1");
        assert_eq!(params.genesis_hash, [5u8; 32]);
    }

    #[test]
    fn test_params_bad_genesis_hash() {
        let json = r#"{"genesis-hash":"AAAA","genesis-id":"x","last-round":1,"min-fee":1000}"#;
        let parsed: ParamsResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.into_params().is_err());
    }

    fn signed() -> SignedTransaction {
        let account = Account::generate();
        let params = SuggestedParams {
            min_fee: 1000,
            first_valid: 1,
            last_valid: 100,
            genesis_id: "x".into(),
            genesis_hash: [0; 32],
        };
        Transaction::payment(account.address(), account.address(), 0, &params)
            .sign(&account)
            .unwrap()
    }

    #[test]
    fn test_simulate_response_logs_and_budget() {
        let json = format!(
            r#"{{"last-round":9,"version":2,"txn-groups":[{{"app-budget-added":700,"app-budget-consumed":31,
               "txn-results":[{{"app-budget-consumed":31,"txn-result":{{"logs":["{}"],"pool-error":""}}}}]}}]}}"#,
            B64.encode(b"\x15\x1f\x7c\x75ok")
        );
        let group = vec![signed()];
        let outcome = serde_json::from_str::<SimulateResponse>(&json)
            .unwrap()
            .into_outcome(&group)
            .unwrap();
        assert_eq!(outcome.budget_added, 700);
        assert_eq!(outcome.budget_consumed, 31);
        assert_eq!(outcome.txns[0].logs, vec![b"\x15\x1f\x7c\x75ok".to_vec()]);
        assert_eq!(outcome.txns[0].tx_id, group[0].id().unwrap());
    }

    #[test]
    fn test_simulate_failure_is_rejection() {
        let json = r#"{"txn-groups":[{"failure-message":"logic eval error: assert failed","txn-results":[]}]}"#;
        let err = serde_json::from_str::<SimulateResponse>(json)
            .unwrap()
            .into_outcome(&[signed()])
            .unwrap_err();
        assert!(matches!(err, Error::Algod { status: 400, ref message } if message.contains("assert failed")));
    }

    #[test]
    fn test_account_created_apps() {
        let json = format!(
            r#"{{"address":"x","amount":5000000,"created-apps":[{{"id":1234,"params":{{
                "approval-program":"{}","clear-state-program":"{}",
                "global-state-schema":{{"num-uint":1,"num-byte-slice":2}}}}}}]}}"#,
            B64.encode(b"approval"),
            B64.encode(b"clear")
        );
        let account: AccountResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(account.amount, 5_000_000);
        let app = account
            .created_apps
            .into_iter()
            .next()
            .unwrap()
            .into_created()
            .unwrap();
        assert_eq!(app.id, 1234);
        assert_eq!(app.name, None);
        assert_eq!(app.approval_program, b"approval");
        assert_eq!(app.clear_program, b"clear");
        assert_eq!(app.global_schema, StateSchema::new(1, 2));
        assert!(app.local_schema.is_empty());
    }

    #[test]
    fn test_pending_created_app() {
        let pending: PendingResponse =
            serde_json::from_str(r#"{"confirmed-round":7,"application-index":1001}"#).unwrap();
        let result = pending.into_result("TX".into()).unwrap();
        assert_eq!(result.created_app_id, Some(1001));
        assert!(result.logs.is_empty());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let algod = AlgodHttp::new("http://localhost:4001/", "a".repeat(64).as_str()).unwrap();
        assert_eq!(algod.url("/v2/status"), "http://localhost:4001/v2/status");
        assert!(algod.dispenser().is_none());
    }
}
