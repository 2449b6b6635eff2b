use serde_json::json;

use tally_core::permissions::permitted_intents;
use tally_core::{AuthorizedContext, Entities};

use super::{HandlerResult, Reply};
use crate::AppState;

/// Lists what the caller's verified role may do.
pub async fn help(state: &AppState, ctx: &AuthorizedContext, _entities: &Entities) -> HandlerResult {
    let intents = permitted_intents(&ctx.role);
    Ok(Reply::with_data(
        state.formatter.help(&ctx.display_name, ctx.role.as_str(), &intents),
        json!({ "role": ctx.role.as_str(), "intents": intents }),
    ))
}
