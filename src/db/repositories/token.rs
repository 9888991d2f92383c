use chrono::Utc;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::db::{StoreError, StoreResult};
use crate::entities::{prelude::*, tokens};
use crate::models::{Scope, Token, User};

pub struct TokenRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> TokenRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, token: &Token) -> StoreResult<()> {
        let model = tokens::ActiveModel {
            id: NotSet,
            hash: Set(token.hash.clone()),
            user_id: Set(token.user_id),
            expiry: Set(token.expiry),
            scope: Set(token.scope.as_str().to_string()),
        };

        Tokens::insert(model).exec_without_returning(self.conn).await?;
        Ok(())
    }

    /// Removes every token of `scope` owned by `user_id`.
    pub async fn delete_for_user(&self, scope: Scope, user_id: Uuid) -> StoreResult<u64> {
        let result = Tokens::delete_many()
            .filter(tokens::Column::Scope.eq(scope.as_str()))
            .filter(tokens::Column::UserId.eq(user_id))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Owner of an unexpired token with this hash and scope. Expired and
    /// unknown tokens are both `NotFound`.
    pub async fn get_user(&self, scope: Scope, hash: Vec<u8>) -> StoreResult<User> {
        Users::find()
            .inner_join(Tokens)
            .filter(tokens::Column::Hash.eq(hash))
            .filter(tokens::Column::Scope.eq(scope.as_str()))
            .filter(tokens::Column::Expiry.gt(Utc::now()))
            .one(self.conn)
            .await?
            .map(User::from)
            .ok_or(StoreError::NotFound)
    }
}
