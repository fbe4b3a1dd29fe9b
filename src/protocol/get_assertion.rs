use crate::crypto::{SIGNATURE_SIZE, Signer};
use crate::presence::UserPresence;
use crate::store::{ApplicationId, CREDENTIAL_ID_SIZE, CredentialStore, Storage};
use super::CommandError;
use super::types::ClientData;

pub(crate) async fn handle_get_assertion<S, P, K>(
    store: &CredentialStore<S>,
    presence: &mut P,
    signer: &mut K,
    application_id: ApplicationId,
    client_data: ClientData,
) -> Result<Vec<u8>, CommandError>
where
    S: Storage,
    P: UserPresence,
    K: Signer,
{
    if !presence.confirm().await {
        return Err(CommandError::Approval);
    }

    let (slot, cred) = store.find(&application_id).ok_or(CommandError::NotFound)?;
    let signature = signer.sign(&cred.private_key, &client_data)?;
    tracing::info!(slot, cred_id = hex::encode(cred.credential_id), "Assertion signed");

    let mut response = Vec::with_capacity(CREDENTIAL_ID_SIZE + SIGNATURE_SIZE);
    response.extend_from_slice(&cred.credential_id);
    response.extend_from_slice(&signature.0);
    Ok(response)
}
