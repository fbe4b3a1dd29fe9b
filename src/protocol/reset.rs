use crate::presence::UserPresence;
use crate::store::{CredentialStore, Storage};
use super::CommandError;

pub(crate) async fn handle_reset<S: Storage, P: UserPresence>(
    store: &mut CredentialStore<S>,
    presence: &mut P,
) -> Result<Vec<u8>, CommandError> {
    if !presence.confirm().await {
        return Err(CommandError::Approval);
    }
    let wiped = store.reset().inspect_err(|e| {
        tracing::error!("Credential store wipe failed: {e}");
    })?;
    tracing::info!(wiped, "Credential store reset");
    Ok(Vec::new())
}
