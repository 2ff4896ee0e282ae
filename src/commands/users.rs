use std::io::Write;

use super::{CommandError, Context};
use crate::storage::DatabaseError;
use crate::util::strip_control_chars;

pub(super) async fn register(ctx: &mut Context, name: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let user = ctx.db.create_user(name).await.map_err(|e| match e {
        DatabaseError::AlreadyExists { .. } => CommandError::UserExists(name.to_string()),
        other => other.into(),
    })?;
    tracing::info!(user = %user.name, id = %user.id, "User created");
    writeln!(out, "User {} created (id {})", strip_control_chars(&user.name), user.id)?;

    login(ctx, name, out).await
}

pub(super) async fn login(ctx: &mut Context, name: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    if ctx.db.get_user_by_name(name).await?.is_none() {
        return Err(CommandError::UnknownUser(name.to_string()));
    }

    ctx.config.set_user(name, &ctx.config_path)?;
    writeln!(out, "Logged in as: {}", strip_control_chars(name))?;
    Ok(())
}

pub(super) async fn list(ctx: &Context, out: &mut dyn Write) -> Result<(), CommandError> {
    let current = ctx.config.current_user_name.as_deref();
    for user in ctx.db.get_users().await? {
        if current == Some(user.name.as_str()) {
            writeln!(out, "* {} (current)", strip_control_chars(&user.name))?;
        } else {
            writeln!(out, "* {}", strip_control_chars(&user.name))?;
        }
    }
    Ok(())
}

pub(super) async fn reset(ctx: &Context, out: &mut dyn Write) -> Result<(), CommandError> {
    let removed = ctx.db.reset().await?;
    tracing::info!(users = removed, "Database reset");
    writeln!(out, "Database reset: {} users removed", removed)?;
    Ok(())
}
