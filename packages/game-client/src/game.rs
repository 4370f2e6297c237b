//! Typed client for the game contract.

use crate::composer::{AtomicComposer, ComposerResult, MethodArg, MethodCall, SimulateResult};
use crate::deploy::{plan, AppSpec, DeployAction, DeployOutcome, OnSchemaBreak, OnUpdate};
use crate::transaction::{AppCall, BoxReference, Transaction};
use crate::{Account, Error, IndexerHttp, Ledger};
use game_contract::{ADMIN_UPSERT_ASSET, BUY_ASSET, FUND_ACCOUNT, HELLO, REGISTER};
use game_types::{AbiRecord, AbiValue, Address, Asset, AssetId, Method, User};
use std::sync::Arc;
use tracing::info;

pub use crate::composer::TransactionWithSigner;

/// Per-call extras: box references and an optional note.
#[derive(Debug, Clone, Default)]
pub struct TransactionParameters {
    pub boxes: Vec<BoxReference>,
    pub note: Vec<u8>,
}

impl TransactionParameters {
    /// Reference boxes of the called application by name.
    pub fn with_boxes<I, B>(names: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self {
            boxes: names.into_iter().map(BoxReference::own).collect(),
            note: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallResult<T> {
    pub return_value: T,
    pub tx_id: String,
    pub confirmed_round: u64,
}

/// Client bound to one application and one signer.
///
/// Cloning is cheap; the ledger is shared.
#[derive(Clone)]
pub struct GameClient {
    ledger: Arc<dyn Ledger>,
    indexer: Option<IndexerHttp>,
    signer: Account,
    app_id: u64,
    spec: AppSpec,
}

impl GameClient {
    pub fn new(ledger: Arc<dyn Ledger>, creator: Account, indexer: Option<IndexerHttp>) -> Self {
        Self {
            ledger,
            indexer,
            signer: creator,
            app_id: 0,
            spec: AppSpec::game(),
        }
    }

    pub fn with_spec(mut self, spec: AppSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Same application, different signer.
    pub fn with_signer(&self, signer: Account) -> Self {
        Self {
            signer,
            ..self.clone()
        }
    }

    /// Bind to an already deployed application.
    pub fn with_app_id(mut self, app_id: u64) -> Self {
        self.app_id = app_id;
        self
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    pub fn app_address(&self) -> Address {
        Address::for_application(self.app_id)
    }

    pub fn signer(&self) -> &Account {
        &self.signer
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    pub fn indexer(&self) -> Option<&IndexerHttp> {
        self.indexer.as_ref()
    }

    /// Reuse the signer's matching application or create one, per policy.
    pub async fn deploy(
        &mut self,
        on_schema_break: OnSchemaBreak,
        on_update: OnUpdate,
    ) -> Result<DeployOutcome, Error> {
        let existing = self.ledger.created_apps(&self.signer.address()).await?;
        let outcome = match plan(&self.spec, &existing, on_schema_break, on_update)? {
            DeployAction::Reuse(app_id) => DeployOutcome::Unchanged { app_id },
            DeployAction::Create => DeployOutcome::Created {
                app_id: self.create_app().await?,
            },
            DeployAction::Append { previous } => DeployOutcome::Appended {
                app_id: self.create_app().await?,
                previous,
            },
        };
        self.app_id = outcome.app_id();
        info!(app = %self.spec.name, app_id = self.app_id, ?outcome, "Deployed");
        Ok(outcome)
    }

    async fn create_app(&self) -> Result<u64, Error> {
        let params = self.ledger.suggested_params().await?;
        let call = AppCall {
            approval_program: self.spec.approval_program.clone(),
            clear_program: self.spec.clear_program.clone(),
            global_schema: self.spec.global_schema,
            local_schema: self.spec.local_schema,
            ..AppCall::default()
        };
        let txn = Transaction::app_call(self.signer.address(), call, &params)
            .with_note(self.spec.note())
            .sign(&self.signer)?;
        let outcome = self.ledger.send_group(vec![txn]).await?;
        outcome
            .txns
            .first()
            .and_then(|t| t.created_app_id)
            .ok_or_else(|| Error::Deploy("create confirmed without an application id".into()))
    }

    /// Payment from `from` to the application account, for use as a `pay` argument.
    pub async fn payment(&self, from: &Account, amount: u64) -> Result<TransactionWithSigner, Error> {
        let params = self.ledger.suggested_params().await?;
        Ok(TransactionWithSigner {
            txn: Transaction::payment(from.address(), self.app_address(), amount, &params),
            signer: from.clone(),
        })
    }

    /// Top up the application account from the signer. Returns the confirmed round.
    pub async fn fund_app(&self, amount: u64) -> Result<u64, Error> {
        let pay = self.payment(&self.signer, amount).await?;
        let outcome = self
            .ledger
            .send_group(vec![pay.txn.sign(&pay.signer)?])
            .await?;
        info!(app_id = self.app_id, amount, "Funded application account");
        Ok(outcome.confirmed_round)
    }

    fn method_call(
        &self,
        signature: &str,
        args: Vec<MethodArg>,
        params: TransactionParameters,
    ) -> Result<MethodCall, Error> {
        if self.app_id == 0 {
            return Err(Error::Deploy("application is not deployed".into()));
        }
        let mut call = MethodCall::new(self.app_id, Method::parse(signature)?, self.signer.clone())
            .boxes(params.boxes)
            .note(params.note);
        call.args = args;
        Ok(call)
    }

    async fn call(
        &self,
        signature: &str,
        args: Vec<MethodArg>,
        params: TransactionParameters,
    ) -> Result<CallResult<Option<AbiValue>>, Error> {
        let mut composer = AtomicComposer::new();
        composer.add_method_call(self.method_call(signature, args, params)?)?;
        let result = composer.execute(self.ledger.as_ref()).await?;
        let ret = result
            .method_results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Composer(format!("no result for {signature}")))?;
        Ok(CallResult {
            return_value: ret.value,
            tx_id: ret.tx_id,
            confirmed_round: result.confirmed_round,
        })
    }

    pub async fn hello(&self, name: &str) -> Result<CallResult<String>, Error> {
        let result = self
            .call(HELLO, vec![AbiValue::from(name).into()], TransactionParameters::default())
            .await?;
        map_return(result, |value| {
            value.as_str().map(str::to_string).ok_or("string")
        })
    }

    pub async fn register(
        &self,
        name: &str,
        params: TransactionParameters,
    ) -> Result<CallResult<User>, Error> {
        let result = self
            .call(REGISTER, vec![AbiValue::from(name).into()], params)
            .await?;
        map_return(result, |value| User::from_abi(value.clone()).map_err(|_| "user tuple"))
    }

    /// `payment` must pay the application account from the signer.
    pub async fn fund_account(
        &self,
        payment: TransactionWithSigner,
        params: TransactionParameters,
    ) -> Result<CallResult<u64>, Error> {
        let result = self
            .call(FUND_ACCOUNT, vec![MethodArg::Txn(payment)], params)
            .await?;
        map_return(result, |value| value.as_u64().ok_or("uint64"))
    }

    pub async fn admin_upsert_asset(
        &self,
        asset: &Asset,
        params: TransactionParameters,
    ) -> Result<CallResult<()>, Error> {
        let result = self
            .call(ADMIN_UPSERT_ASSET, vec![asset.to_abi().into()], params)
            .await?;
        Ok(void(result))
    }

    pub async fn buy_asset(
        &self,
        asset_id: AssetId,
        quantity: u64,
        params: TransactionParameters,
    ) -> Result<CallResult<()>, Error> {
        let args = vec![AbiValue::bytes(&asset_id).into(), AbiValue::Uint(quantity).into()];
        let result = self.call(BUY_ASSET, args, params).await?;
        Ok(void(result))
    }

    /// Queue several calls into one atomic group.
    pub fn compose(&self) -> GameComposer<'_> {
        GameComposer {
            client: self,
            composer: AtomicComposer::new(),
            error: None,
        }
    }
}

fn map_return<T>(
    result: CallResult<Option<AbiValue>>,
    convert: impl FnOnce(&AbiValue) -> Result<T, &'static str>,
) -> Result<CallResult<T>, Error> {
    let value = result
        .return_value
        .as_ref()
        .ok_or_else(|| Error::Composer("method returned no value".into()))?;
    let return_value =
        convert(value).map_err(|want| Error::Composer(format!("expected {want}, got {value:?}")))?;
    Ok(CallResult {
        return_value,
        tx_id: result.tx_id,
        confirmed_round: result.confirmed_round,
    })
}

fn void(result: CallResult<Option<AbiValue>>) -> CallResult<()> {
    CallResult {
        return_value: (),
        tx_id: result.tx_id,
        confirmed_round: result.confirmed_round,
    }
}

/// Builder for an atomic group of game calls. The first build error is kept
/// and reported by `simulate`/`execute`.
pub struct GameComposer<'a> {
    client: &'a GameClient,
    composer: AtomicComposer,
    error: Option<Error>,
}

impl GameComposer<'_> {
    fn add(mut self, signature: &str, args: Vec<MethodArg>, params: TransactionParameters) -> Self {
        if self.error.is_some() {
            return self;
        }
        let added = self
            .client
            .method_call(signature, args, params)
            .and_then(|call| self.composer.add_method_call(call).map(|_| ()));
        if let Err(e) = added {
            self.error = Some(e);
        }
        self
    }

    pub fn hello(self, name: &str) -> Self {
        self.add(HELLO, vec![AbiValue::from(name).into()], TransactionParameters::default())
    }

    pub fn register(self, name: &str, params: TransactionParameters) -> Self {
        self.add(REGISTER, vec![AbiValue::from(name).into()], params)
    }

    pub fn fund_account(self, payment: TransactionWithSigner, params: TransactionParameters) -> Self {
        self.add(FUND_ACCOUNT, vec![MethodArg::Txn(payment)], params)
    }

    pub fn admin_upsert_asset(self, asset: &Asset, params: TransactionParameters) -> Self {
        self.add(ADMIN_UPSERT_ASSET, vec![asset.to_abi().into()], params)
    }

    pub fn buy_asset(self, asset_id: AssetId, quantity: u64, params: TransactionParameters) -> Self {
        let args = vec![AbiValue::bytes(&asset_id).into(), AbiValue::Uint(quantity).into()];
        self.add(BUY_ASSET, args, params)
    }

    pub async fn simulate(self) -> Result<SimulateResult, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.composer.simulate(self.client.ledger()).await
    }

    pub async fn execute(self) -> Result<ComposerResult, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.composer.execute(self.client.ledger()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalNet;
    use game_types::boxes;

    async fn deployed() -> GameClient {
        let net = Arc::new(LocalNet::new());
        let creator = net.dispenser().unwrap();
        let mut client = GameClient::new(net, creator, None);
        client
            .deploy(OnSchemaBreak::AppendApp, OnUpdate::AppendApp)
            .await
            .unwrap();
        client.fund_app(10_000_000).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_call_before_deploy_fails() {
        let net = Arc::new(LocalNet::new());
        let client = GameClient::new(net, Account::generate(), None);
        assert!(matches!(client.hello("x").await, Err(Error::Deploy(_))));
    }

    #[tokio::test]
    async fn test_hello_and_register() {
        let client = deployed().await;
        assert_eq!(client.hello("World").await.unwrap().return_value, "Hello, World");

        let user_box = boxes::user_box_name(&client.signer().address());
        let user = client
            .register("Alice", TransactionParameters::with_boxes([user_box]))
            .await
            .unwrap()
            .return_value;
        assert_eq!(user.name, "Alice");
        assert_eq!(user.balance, 0);
        assert!(user.registered_at > 0);
    }

    #[tokio::test]
    async fn test_with_signer_shares_app() {
        let client = deployed().await;
        let other = client.with_signer(Account::generate());
        assert_eq!(other.app_id(), client.app_id());
        assert_ne!(other.signer(), client.signer());
    }

    #[tokio::test]
    async fn test_composer_group_and_deferred_error() {
        let client = deployed().await;
        let result = client.compose().hello("a").hello("b").execute().await.unwrap();
        let values: Vec<_> = result.method_results.iter().filter_map(|r| r.value.as_ref()).collect();
        assert_eq!(values, vec![&AbiValue::from("Hello, a"), &AbiValue::from("Hello, b")]);

        let undeployed = client.clone().with_app_id(0);
        assert!(undeployed.compose().hello("a").simulate().await.is_err());
    }

    #[tokio::test]
    async fn test_composer_upsert_and_buy_in_one_group() {
        let client = deployed().await;
        let address = client.signer().address();
        let potion = boxes::asset_id("POTION").unwrap();
        let user_box = boxes::user_box_name(&address);
        let holding_box = boxes::user_asset_box_name(&address, &potion);

        let payment = client.payment(client.signer(), 1_000).await.unwrap();
        let result = client
            .compose()
            .register("Oak", TransactionParameters::with_boxes([user_box.clone()]))
            .fund_account(payment, TransactionParameters::with_boxes([user_box.clone()]))
            .admin_upsert_asset(
                &Asset::new("POTION", "Restores 20 HP", 300),
                TransactionParameters::with_boxes([boxes::asset_box_name(&potion)]),
            )
            .buy_asset(
                potion,
                2,
                TransactionParameters::with_boxes([
                    boxes::asset_box_name(&potion),
                    user_box.clone(),
                    holding_box.clone(),
                ]),
            )
            .execute()
            .await
            .unwrap();
        assert_eq!(result.method_results.len(), 4);

        let ledger = client.ledger();
        let stored = ledger
            .application_box_by_name(client.app_id(), &user_box)
            .await
            .unwrap();
        assert_eq!(User::decode(&stored).unwrap().balance, 400);
        let held = ledger
            .application_box_by_name(client.app_id(), &holding_box)
            .await
            .unwrap();
        assert_eq!(game_types::decode_quantity(&held).unwrap(), 2);
    }
}
