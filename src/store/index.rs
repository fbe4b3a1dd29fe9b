use crate::crypto::PrivateKey;

use super::{
    ApplicationId, Credential, CredentialId, RECORD_SIZE, StoreError, medium::Storage,
};

const COUNT_ADDRESS: usize = 0;
const TABLE_ADDRESS: usize = 1;
/// The count is a single byte on the medium and on the wire.
const MAX_CAPACITY: usize = u8::MAX as usize;

fn slot_address(slot: usize) -> usize {
    TABLE_ADDRESS + slot * RECORD_SIZE
}

/// Number of records a medium of `size` bytes can hold.
pub fn capacity_for(size: usize) -> usize {
    (size.saturating_sub(TABLE_ADDRESS) / RECORD_SIZE).min(MAX_CAPACITY)
}

/// Fixed-capacity credential table over a non-volatile medium.
///
/// Records live in slots `[0, count)`, the count sits at address 0. The table
/// is cached in memory and written through on every mutation.
pub struct CredentialStore<S> {
    storage: S,
    capacity: usize,
    records: Vec<Credential>,
}

impl<S: Storage> CredentialStore<S> {
    /// Load the table from `storage`. A count beyond capacity means the
    /// medium was never formatted; it is reset to an empty table.
    pub fn open(mut storage: S) -> Result<Self, StoreError> {
        let capacity = capacity_for(storage.size());
        if capacity == 0 {
            return Err(StoreError::TooSmall(storage.size()));
        }

        let mut count = [0u8; 1];
        storage.read(COUNT_ADDRESS, &mut count)?;
        let count = count[0] as usize;
        if count > capacity {
            tracing::warn!(count, capacity, "Unformatted credential table, formatting");
            storage.write(COUNT_ADDRESS, &[0])?;
            return Ok(Self {
                storage,
                capacity,
                records: Vec::new(),
            });
        }

        let mut records = Vec::with_capacity(capacity);
        for slot in 0..count {
            let mut buf = [0u8; RECORD_SIZE];
            storage.read(slot_address(slot), &mut buf)?;
            records.push(Credential::from_bytes(&buf));
        }
        Ok(Self {
            storage,
            capacity,
            records,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn credential_count(&self) -> usize {
        self.records.len()
    }

    /// Linear scan by full content comparison of the application id.
    pub fn find(&self, application_id: &ApplicationId) -> Option<(usize, &Credential)> {
        self.records
            .iter()
            .enumerate()
            .find(|(_, record)| record.application_id == *application_id)
    }

    pub fn contains_credential_id(&self, credential_id: &CredentialId) -> bool {
        self.records
            .iter()
            .any(|record| record.credential_id == *credential_id)
    }

    /// Replace the record for `application_id` in place, or append a new one.
    /// Returns the slot written.
    ///
    /// The record reaches the medium before the count does, so an interrupted
    /// append never exposes an unwritten slot.
    pub fn upsert(
        &mut self,
        application_id: ApplicationId,
        credential_id: CredentialId,
        private_key: PrivateKey,
    ) -> Result<usize, StoreError> {
        let record = Credential {
            application_id,
            credential_id,
            private_key,
        };

        let existing = self.find(&application_id).map(|(slot, _)| slot);
        if let Some(slot) = existing {
            self.storage.write(slot_address(slot), &record.to_bytes())?;
            self.records[slot] = record;
            tracing::debug!(slot, "Credential replaced");
            return Ok(slot);
        }

        let slot = self.records.len();
        if slot >= self.capacity {
            return Err(StoreError::Full);
        }
        self.storage.write(slot_address(slot), &record.to_bytes())?;
        self.storage.write(COUNT_ADDRESS, &[(slot + 1) as u8])?;
        self.records.push(record);
        tracing::debug!(slot, "Credential appended");
        Ok(slot)
    }

    /// `(credential_id, application_id)` for every live record, in slot order.
    pub fn list(&self) -> Vec<(CredentialId, ApplicationId)> {
        self.records
            .iter()
            .map(|record| (record.credential_id, record.application_id))
            .collect()
    }

    /// Drop every record and zero the slots they occupied. Returns how many
    /// records were wiped.
    pub fn reset(&mut self) -> Result<usize, StoreError> {
        let occupied = self.records.len();
        self.storage.write(COUNT_ADDRESS, &[0])?;
        self.records.clear();
        let zero = [0u8; RECORD_SIZE];
        for slot in 0..occupied {
            self.storage.write(slot_address(slot), &zero)?;
        }
        Ok(occupied)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PRIVATE_KEY_SIZE;
    use crate::store::MemoryStorage;

    const SIZE: usize = 1024;

    fn key(byte: u8) -> PrivateKey {
        PrivateKey([byte; PRIVATE_KEY_SIZE])
    }

    #[test]
    fn test_capacity_for_default_eeprom() {
        assert_eq!(capacity_for(1024), 17);
        assert_eq!(capacity_for(RECORD_SIZE), 0);
        assert_eq!(capacity_for(RECORD_SIZE + 1), 1);
        assert_eq!(capacity_for(usize::MAX), 255);
    }

    #[test]
    fn test_open_formats_erased_medium() {
        let store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        assert_eq!(store.credential_count(), 0);
        assert_eq!(store.storage().as_bytes()[COUNT_ADDRESS], 0);
    }

    #[test]
    fn test_open_rejects_tiny_medium() {
        let res = CredentialStore::open(MemoryStorage::new(8));
        assert!(matches!(res, Err(StoreError::TooSmall(8))));
    }

    #[test]
    fn test_upsert_appends_then_replaces() {
        let mut store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        assert_eq!(store.upsert([1; 20], [0xA1; 16], key(1)).unwrap(), 0);
        assert_eq!(store.upsert([2; 20], [0xA2; 16], key(2)).unwrap(), 1);
        assert_eq!(store.upsert([1; 20], [0xB1; 16], key(3)).unwrap(), 0);
        assert_eq!(store.credential_count(), 2);

        let (slot, record) = store.find(&[1; 20]).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(record.credential_id, [0xB1; 16]);
        assert_eq!(record.private_key, key(3));
    }

    #[test]
    fn test_find_compares_content() {
        let mut store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        store.upsert([7; 20], [0; 16], key(1)).unwrap();
        let needle: ApplicationId = [7; 20];
        assert!(store.find(&needle).is_some());
        let mut other = needle;
        other[19] = 8;
        assert!(store.find(&other).is_none());
    }

    #[test]
    fn test_full_table_rejects_new_but_accepts_existing() {
        let mut store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        for i in 0..store.capacity() {
            store.upsert([i as u8; 20], [i as u8; 16], key(1)).unwrap();
        }
        let before = store.storage().as_bytes().to_vec();
        assert!(matches!(
            store.upsert([0xEE; 20], [0xEE; 16], key(2)),
            Err(StoreError::Full)
        ));
        assert_eq!(store.storage().as_bytes(), before.as_slice());

        store.upsert([3; 20], [0xCC; 16], key(4)).unwrap();
        assert_eq!(store.credential_count(), store.capacity());
    }

    #[test]
    fn test_reopen_preserves_table() {
        let mut store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        store.upsert([1; 20], [0x11; 16], key(1)).unwrap();
        store.upsert([2; 20], [0x22; 16], key(2)).unwrap();
        let store = CredentialStore::open(store.into_storage()).unwrap();
        assert_eq!(
            store.list(),
            vec![([0x11; 16], [1; 20]), ([0x22; 16], [2; 20])]
        );
    }

    #[test]
    fn test_power_loss_before_count_write_hides_slot() {
        let mut store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        store.upsert([1; 20], [0x11; 16], key(1)).unwrap();

        // Slot write succeeds, count write does not.
        store.storage_mut().fail_after_writes(1);
        assert!(matches!(
            store.upsert([2; 20], [0x22; 16], key(2)),
            Err(StoreError::PowerLoss)
        ));
        assert_eq!(store.credential_count(), 1);

        let bytes = store.into_storage().into_bytes();
        assert_eq!(bytes[COUNT_ADDRESS], 1);
        let reopened = CredentialStore::open(MemoryStorage::from_bytes(bytes)).unwrap();
        assert_eq!(reopened.list(), vec![([0x11; 16], [1; 20])]);
    }

    #[test]
    fn test_reset_zeroes_occupied_slots() {
        let mut store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        store.upsert([1; 20], [0x11; 16], key(1)).unwrap();
        store.upsert([2; 20], [0x22; 16], key(2)).unwrap();
        assert_eq!(store.reset().unwrap(), 2);
        assert_eq!(store.credential_count(), 0);
        assert!(store.list().is_empty());

        let bytes = store.storage().as_bytes();
        assert_eq!(bytes[COUNT_ADDRESS], 0);
        assert!(bytes[slot_address(0)..slot_address(2)].iter().all(|b| *b == 0));
        // Never-used slots keep their erased state.
        assert_eq!(bytes[slot_address(2)], 0xFF);
    }

    #[test]
    fn test_contains_credential_id() {
        let mut store = CredentialStore::open(MemoryStorage::new(SIZE)).unwrap();
        store.upsert([1; 20], [0x11; 16], key(1)).unwrap();
        assert!(store.contains_credential_id(&[0x11; 16]));
        assert!(!store.contains_credential_id(&[0x12; 16]));
    }
}
