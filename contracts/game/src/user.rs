use crate::constants::*;
use crate::env::{GroupTxn, Runtime};
use crate::errors::GameError;
use crate::GameContract;
use game_types::boxes::user_box_name;
use game_types::{AbiRecord, User};

impl<R: Runtime> GameContract<'_, R> {
    /// Create the caller's profile with a zero balance.
    pub fn register(&mut self, name: String) -> Result<User, GameError> {
        let key = user_box_name(&self.rt.sender());
        self.rt.consume(BOX_READ_COST)?;
        if self.rt.box_get(&key)?.is_some() {
            return Err(GameError::user_already_registered());
        }

        let user = User {
            registered_at: self.rt.latest_timestamp(),
            name,
            balance: 0,
        };
        self.rt.consume(BOX_WRITE_COST)?;
        self.rt.box_put(&key, &user.encode()?)?;
        Ok(user)
    }

    /// Credit the payment preceding this call to the caller's game balance.
    pub fn fund_account(&mut self) -> Result<u64, GameError> {
        let sender = self.rt.sender();
        let amount = match self.rt.group_txn(1) {
            Some(GroupTxn::Payment {
                sender: payer,
                receiver,
                amount,
            }) => {
                if receiver != self.rt.current_app_address() {
                    return Err(GameError::InvalidInput(
                        "payment receiver must be the application account".into(),
                    ));
                }
                if payer != sender {
                    return Err(GameError::InvalidInput(
                        "payment sender must be the caller".into(),
                    ));
                }
                amount
            }
            _ => {
                return Err(GameError::InvalidInput(
                    "fund_account must follow a payment transaction".into(),
                ))
            }
        };

        let mut user = self.load_user(&sender)?;
        user.balance = user
            .balance
            .checked_add(amount)
            .ok_or_else(|| GameError::overflow("balance"))?;
        self.store_user(&sender, &user)?;
        Ok(user.balance)
    }

    pub(crate) fn load_user(&mut self, address: &game_types::Address) -> Result<User, GameError> {
        self.rt.consume(BOX_READ_COST)?;
        let bytes = self
            .rt
            .box_get(&user_box_name(address))?
            .ok_or_else(GameError::user_not_registered)?;
        Ok(User::decode(&bytes)?)
    }

    pub(crate) fn store_user(
        &mut self,
        address: &game_types::Address,
        user: &User,
    ) -> Result<(), GameError> {
        self.rt.consume(BOX_WRITE_COST)?;
        self.rt.box_put(&user_box_name(address), &user.encode()?)
    }
}
