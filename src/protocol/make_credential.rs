use rand::Rng;
use rand::rngs::StdRng;

use crate::crypto::{KeyGen, PUBLIC_KEY_SIZE};
use crate::presence::UserPresence;
use crate::store::{
    ApplicationId, CREDENTIAL_ID_SIZE, CredentialId, CredentialStore, Storage, StoreError,
};
use super::CommandError;

/// Random id that no live record uses.
fn fresh_credential_id<S: Storage>(store: &CredentialStore<S>, rng: &mut StdRng) -> CredentialId {
    loop {
        let id: CredentialId = rng.r#gen();
        if !store.contains_credential_id(&id) {
            return id;
        }
    }
}

pub(crate) async fn handle_make_credential<S, P, K>(
    store: &mut CredentialStore<S>,
    presence: &mut P,
    keygen: &mut K,
    rng: &mut StdRng,
    application_id: ApplicationId,
) -> Result<Vec<u8>, CommandError>
where
    S: Storage,
    P: UserPresence,
    K: KeyGen,
{
    // 1. User presence
    if !presence.confirm().await {
        return Err(CommandError::Approval);
    }

    // 2. Key pair
    let (public_key, private_key) = keygen.generate_keypair()?;

    // 3. Credential id
    let credential_id = fresh_credential_id(store, rng);

    // 4. Store, replacing any record for the same application
    let slot = store
        .upsert(application_id, credential_id, private_key)
        .inspect_err(|e| {
            if !matches!(e, StoreError::Full) {
                tracing::error!("Credential store write failed: {e}");
            }
        })?;
    tracing::info!(slot, cred_id = hex::encode(credential_id), "Credential stored");

    let mut response = Vec::with_capacity(CREDENTIAL_ID_SIZE + PUBLIC_KEY_SIZE);
    response.extend_from_slice(&credential_id);
    response.extend_from_slice(&public_key.0);
    Ok(response)
}
