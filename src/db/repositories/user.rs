use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use super::unique_violation_as_duplicate_email;
use crate::db::{StoreError, StoreResult};
use crate::entities::{prelude::*, users};
use crate::models::{Password, User, user::now_micros};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            password: Password::from_hash(model.password_hash),
            activated: model.activated,
            created_at: model.created_at,
            last_updated: model.last_updated,
        }
    }
}

/// The version written by an update that expected `previous`. Strictly
/// later than `previous` even when the clock has not advanced.
#[must_use]
pub fn next_version(previous: DateTime<Utc>) -> DateTime<Utc> {
    now_micros().max(previous + Duration::microseconds(1))
}

pub struct UserRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, user: &User) -> StoreResult<()> {
        let model = users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            password_hash: Set(user.password.hash().to_string()),
            activated: Set(user.activated),
            created_at: Set(user.created_at),
            last_updated: Set(user.last_updated),
        };

        Users::insert(model)
            .exec_without_returning(self.conn)
            .await
            .map_err(unique_violation_as_duplicate_email)?;

        Ok(())
    }

    /// Writes `user` only if the stored row still carries
    /// `expected_last_updated`. Returns the user with its new version.
    pub async fn update(
        &self,
        user: &User,
        expected_last_updated: DateTime<Utc>,
    ) -> StoreResult<User> {
        let next = next_version(expected_last_updated);

        let result = Users::update_many()
            .col_expr(users::Column::Email, Expr::value(user.email.clone()))
            .col_expr(users::Column::FirstName, Expr::value(user.first_name.clone()))
            .col_expr(users::Column::LastName, Expr::value(user.last_name.clone()))
            .col_expr(
                users::Column::PasswordHash,
                Expr::value(user.password.hash().to_string()),
            )
            .col_expr(users::Column::Activated, Expr::value(user.activated))
            .col_expr(users::Column::LastUpdated, Expr::value(next))
            .filter(users::Column::Id.eq(user.id))
            .filter(users::Column::LastUpdated.eq(expected_last_updated))
            .exec(self.conn)
            .await
            .map_err(unique_violation_as_duplicate_email)?;

        if result.rows_affected == 0 {
            return Err(StoreError::EditConflict);
        }

        let mut updated = user.clone();
        updated.last_updated = next;
        Ok(updated)
    }

    pub async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(self.conn)
            .await?
            .map(User::from)
            .ok_or(StoreError::NotFound)
    }

    pub async fn get_by_id(&self, id: uuid::Uuid) -> StoreResult<User> {
        Users::find_by_id(id)
            .one(self.conn)
            .await?
            .map(User::from)
            .ok_or(StoreError::NotFound)
    }
}
