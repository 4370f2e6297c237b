use crate::constants::*;
use crate::env::Runtime;
use crate::errors::GameError;
use crate::GameContract;
use game_types::boxes::{asset_box_name, asset_id, user_asset_box_name, AssetId};
use game_types::{decode_quantity, encode_quantity, AbiRecord, Asset};

impl<R: Runtime> GameContract<'_, R> {
    /// Insert or replace a catalogue entry. Creator only.
    pub fn admin_upsert_asset(&mut self, asset: Asset) -> Result<(), GameError> {
        if self.rt.sender() != self.rt.creator() {
            return Err(GameError::only_creator());
        }
        self.rt.consume(SHA256_COST)?;
        let key = asset_box_name(&asset_id(&asset.name)?);
        self.rt.consume(BOX_WRITE_COST)?;
        self.rt.box_put(&key, &asset.encode()?)
    }

    /// Debit `price * quantity` from the caller's balance and add `quantity`
    /// to their holding of the asset.
    pub fn buy_asset(&mut self, asset_id: AssetId, quantity: u64) -> Result<(), GameError> {
        if quantity == 0 {
            return Err(GameError::InvalidInput("quantity must be positive".into()));
        }

        self.rt.consume(BOX_READ_COST)?;
        let bytes = self
            .rt
            .box_get(&asset_box_name(&asset_id))?
            .ok_or_else(GameError::asset_not_found)?;
        let asset = Asset::decode(&bytes)?;

        let buyer = self.rt.sender();
        let mut user = self.load_user(&buyer)?;

        let cost = asset
            .price
            .checked_mul(quantity)
            .ok_or_else(|| GameError::overflow("price * quantity"))?;
        if user.balance < cost {
            return Err(GameError::InsufficientBalance {
                needed: cost,
                available: user.balance,
            });
        }
        user.balance -= cost;
        self.store_user(&buyer, &user)?;

        self.rt.consume(SHA256_COST)?;
        let holding_key = user_asset_box_name(&buyer, &asset_id);
        self.rt.consume(BOX_READ_COST)?;
        let held = match self.rt.box_get(&holding_key)? {
            Some(bytes) => decode_quantity(&bytes)?,
            None => 0,
        };
        let held = held
            .checked_add(quantity)
            .ok_or_else(|| GameError::overflow("quantity"))?;
        self.rt.consume(BOX_WRITE_COST)?;
        self.rt.box_put(&holding_key, &encode_quantity(held))
    }
}
