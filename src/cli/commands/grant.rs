use crate::config::Config;
use crate::db::{Store, StoreError};

pub async fn cmd_grant(config: &Config, email: &str, codes: &[String]) -> anyhow::Result<()> {
    let store = Store::connect(&config.database).await?;

    let user = match store.get_user_by_email(email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            println!("No user with email {email}.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let granted = store.grant_permissions(user.id, codes).await?;
    let permissions = store.get_permissions_for_user(user.id).await?;

    println!("✓ Granted {granted} new permission(s) to {email}");
    println!(
        "  Now holds: {}",
        permissions.iter().collect::<Vec<_>>().join(", ")
    );

    Ok(())
}
