use crate::store::{APPLICATION_ID_SIZE, CREDENTIAL_ID_SIZE, CredentialStore, Storage};

/// Count byte, then `credential_id | application_id` per record. Not gated on
/// user presence.
pub(crate) fn handle_list_credentials<S: Storage>(store: &CredentialStore<S>) -> Vec<u8> {
    let entries = store.list();
    let mut response =
        Vec::with_capacity(1 + entries.len() * (CREDENTIAL_ID_SIZE + APPLICATION_ID_SIZE));
    // Capacity never exceeds u8::MAX.
    response.push(entries.len() as u8);
    for (credential_id, application_id) in &entries {
        response.extend_from_slice(credential_id);
        response.extend_from_slice(application_id);
    }
    tracing::debug!(count = entries.len(), "Credentials listed");
    response
}
