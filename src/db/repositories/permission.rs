use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set};
use uuid::Uuid;

use crate::db::StoreResult;
use crate::entities::{permissions, prelude::*, users_permissions};
use crate::models::Permissions as PermissionSet;

pub struct PermissionRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> PermissionRepository<'a, C> {
    #[must_use]
    pub const fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn for_user(&self, user_id: Uuid) -> StoreResult<PermissionSet> {
        let codes: Vec<String> = Permissions::find()
            .select_only()
            .column(permissions::Column::Code)
            .inner_join(UsersPermissions)
            .filter(users_permissions::Column::UserId.eq(user_id))
            .into_tuple()
            .all(self.conn)
            .await?;

        Ok(codes.into_iter().collect())
    }

    /// Grants the catalogue codes among `codes`. Codes outside the
    /// catalogue and grants the user already holds are skipped. Returns
    /// the number of new grants.
    pub async fn grant(&self, user_id: Uuid, codes: &[String]) -> StoreResult<u64> {
        if codes.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i32> = Permissions::find()
            .select_only()
            .column(permissions::Column::Id)
            .filter(permissions::Column::Code.is_in(codes.iter().map(String::as_str)))
            .into_tuple()
            .all(self.conn)
            .await?;

        if ids.is_empty() {
            return Ok(0);
        }

        let rows = ids.into_iter().map(|permission_id| users_permissions::ActiveModel {
            user_id: Set(user_id),
            permission_id: Set(permission_id),
        });

        let inserted = UsersPermissions::insert_many(rows)
            .on_conflict(
                OnConflict::columns([
                    users_permissions::Column::UserId,
                    users_permissions::Column::PermissionId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;

        Ok(inserted)
    }
}
