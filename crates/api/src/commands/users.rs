//! User management commands
//!
//! CRUD over the users API. Every command needs an established session;
//! without one it fails with `UserDeskError::Auth` before any request is
//! made.

use userdesk_domain::{Result as DomainResult, UserDeskError, UserInput, UserRecord};
use userdesk_infra::UserMutation;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

fn require_session(ctx: &AppContext) -> DomainResult<()> {
    if ctx.auth.is_authenticated() {
        Ok(())
    } else {
        Err(UserDeskError::Auth("Please sign in to manage users.".to_string()))
    }
}

/// Fetch every user.
pub async fn list_users(ctx: &AppContext) -> DomainResult<Vec<UserRecord>> {
    execute_command("users::list_users", || async move {
        require_session(ctx)?;
        Ok::<_, UserDeskError>(ctx.users.list().await?)
    })
    .await
}

/// Fetch one user by id.
pub async fn get_user(ctx: &AppContext, id: i64) -> DomainResult<UserRecord> {
    execute_command("users::get_user", || async move {
        require_session(ctx)?;
        Ok::<_, UserDeskError>(ctx.users.get(id).await?)
    })
    .await
}

/// Create (`id == None`) or update a user.
///
/// The input is checked locally first; backend field errors come back as
/// `UserDeskError::InvalidInput` with every message joined.
pub async fn save_user(
    ctx: &AppContext,
    id: Option<i64>,
    input: UserInput,
) -> DomainResult<UserMutation> {
    execute_command("users::save_user", || async move {
        require_session(ctx)?;
        input.validate()?;
        let result = match id {
            Some(id) => ctx.users.update(id, &input).await,
            None => ctx.users.create(&input).await,
        };
        Ok::<_, UserDeskError>(result?)
    })
    .await
}

/// Delete a user, returning the confirmation message.
pub async fn delete_user(ctx: &AppContext, id: i64) -> DomainResult<String> {
    execute_command("users::delete_user", || async move {
        require_session(ctx)?;
        Ok::<_, UserDeskError>(ctx.users.delete(id).await?)
    })
    .await
}
