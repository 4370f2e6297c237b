use anyhow::Result;
use game_client::account::DEFAULT_ACCOUNT_FUNDING;
use game_client::{
    get_account, Account, GameClient, KeyStore, Ledger, LocalNet, OnSchemaBreak, OnUpdate,
    TransactionParameters, MICROALGOS_PER_ALGO,
};
use game_types::boxes::{asset_box_name, asset_id};
use game_types::{decode_quantity, AbiRecord, AbiType, AbiValue, Asset, User};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Operating funds sent to the application account (100 algos).
pub const APP_FUNDING: u64 = 100 * MICROALGOS_PER_ALGO;
/// Creator account funding (1,000 algos). Covers `APP_FUNDING`, the creator's
/// minimum balance and fees.
pub const ACCOUNT_FUNDING: u64 = DEFAULT_ACCOUNT_FUNDING;
/// Per-test player funding (10 algos).
pub const PLAYER_FUNDING: u64 = 10 * MICROALGOS_PER_ALGO;

/// Shared ledger, key store, creator account and deployed client.
pub struct Session {
    pub ledger: Arc<dyn Ledger>,
    pub keys: KeyStore,
    pub account: Account,
    pub client: GameClient,
}

static SESSION: OnceCell<Session> = OnceCell::const_new();

pub fn setup_localnet() -> Arc<dyn Ledger> {
    Arc::new(LocalNet::new())
}

/// Session-scoped fixture: deployed once, shared by every test.
pub async fn session() -> Result<&'static Session> {
    SESSION.get_or_try_init(init_session).await
}

async fn init_session() -> Result<Session> {
    new_session(setup_localnet()).await
}

/// Deploy and fund the game app on `ledger` with a fresh creator.
pub async fn new_session(ledger: Arc<dyn Ledger>) -> Result<Session> {
    let keys = KeyStore::in_memory();
    let account = get_account(ledger.as_ref(), &keys, "ACCOUNT", ACCOUNT_FUNDING).await?;

    let mut client = GameClient::new(Arc::clone(&ledger), account.clone(), None);
    client
        .deploy(OnSchemaBreak::AppendApp, OnUpdate::AppendApp)
        .await?;
    client.fund_app(APP_FUNDING).await?;

    Ok(Session {
        ledger,
        keys,
        account,
        client,
    })
}

/// Named, funded account acting through the shared client.
pub async fn player(session: &Session, name: &str) -> Result<(Account, GameClient)> {
    let account = get_account(session.ledger.as_ref(), &session.keys, name, PLAYER_FUNDING).await?;
    let client = session.client.with_signer(account.clone());
    Ok((account, client))
}

pub async fn read_box(client: &GameClient, name: &[u8]) -> Result<Vec<u8>, game_client::Error> {
    client
        .ledger()
        .application_box_by_name(client.app_id(), name)
        .await
}

/// Decode raw box bytes with an explicit ABI type string.
pub fn decode_box(abi: &str, bytes: &[u8]) -> Result<AbiValue> {
    Ok(AbiType::parse(abi)?.decode(bytes)?)
}

pub async fn read_user(client: &GameClient, name: &[u8]) -> Result<User> {
    Ok(User::decode(&read_box(client, name).await?)?)
}

pub async fn read_asset(client: &GameClient, name: &[u8]) -> Result<Asset> {
    Ok(Asset::decode(&read_box(client, name).await?)?)
}

/// Quantity held in a user-asset box; a missing box counts as zero.
pub async fn read_quantity(client: &GameClient, name: &[u8]) -> Result<u64> {
    match read_box(client, name).await {
        Ok(bytes) => Ok(decode_quantity(&bytes)?),
        Err(e) if e.is_not_found() => Ok(0),
        Err(e) => Err(e.into()),
    }
}

static CATALOG: OnceCell<()> = OnceCell::const_new();

pub fn catalog() -> [Asset; 3] {
    [
        Asset::new("POKEBALL", "Catches Pokemon", 200),
        Asset::new("POTION", "Restores 20 HP", 300),
        Asset::new("BICYCLE", "Allows you to travel faster", 1_000_000),
    ]
}

/// Upsert the shared catalog once per session.
pub async fn ensure_catalog(session: &Session) -> Result<()> {
    CATALOG
        .get_or_try_init(|| async {
            for asset in catalog() {
                let box_name = asset_box_name(&asset_id(&asset.name)?);
                session
                    .client
                    .admin_upsert_asset(&asset, TransactionParameters::with_boxes([box_name]))
                    .await?;
            }
            Ok::<_, anyhow::Error>(())
        })
        .await?;
    Ok(())
}
