use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::StoreError;

/// Erased EEPROM cells read back as all ones.
pub const ERASED: u8 = 0xFF;

/// Byte-addressable non-volatile medium. `write` is durable once it returns.
pub trait Storage {
    fn size(&self) -> usize;
    fn read(&mut self, address: usize, buf: &mut [u8]) -> Result<(), StoreError>;
    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), StoreError>;
}

fn check_bounds(size: usize, address: usize, len: usize) -> Result<(), StoreError> {
    match address.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(StoreError::OutOfBounds { address, len }),
    }
}

/// RAM-backed medium. A write budget simulates losing power part-way through
/// a multi-write operation.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    bytes: Vec<u8>,
    write_budget: Option<usize>,
}

impl MemoryStorage {
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![ERASED; size])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            write_budget: None,
        }
    }

    /// Allow `writes` more successful writes, then fail every later one.
    pub fn fail_after_writes(&mut self, writes: usize) {
        self.write_budget = Some(writes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Storage for MemoryStorage {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn read(&mut self, address: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_bounds(self.bytes.len(), address, buf.len())?;
        buf.copy_from_slice(&self.bytes[address..address + buf.len()]);
        Ok(())
    }

    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), StoreError> {
        check_bounds(self.bytes.len(), address, bytes.len())?;
        if let Some(budget) = self.write_budget.as_mut() {
            if *budget == 0 {
                return Err(StoreError::PowerLoss);
            }
            *budget -= 1;
        }
        self.bytes[address..address + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// EEPROM image kept in a regular file.
pub struct FileStorage {
    file: File,
    size: usize,
}

impl FileStorage {
    /// Open `path`, creating an erased image of `size` bytes if it is missing
    /// or shorter. An existing longer image keeps its size.
    pub fn open(path: &Path, size: usize) -> Result<Self, StoreError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let current = file.metadata()?.len() as usize;
        if current < size {
            file.seek(SeekFrom::Start(current as u64))?;
            file.write_all(&vec![ERASED; size - current])?;
            file.sync_data()?;
            tracing::debug!(
                path = %path.display(),
                from = current,
                to = size,
                "Extended EEPROM image"
            );
        } else if current > size {
            tracing::warn!(
                path = %path.display(),
                image = current,
                requested = size,
                "EEPROM image larger than requested, keeping image size"
            );
        }
        Ok(Self {
            file,
            size: current.max(size),
        })
    }
}

impl Storage for FileStorage {
    fn size(&self) -> usize {
        self.size
    }

    fn read(&mut self, address: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_bounds(self.size, address, buf.len())?;
        self.file.seek(SeekFrom::Start(address as u64))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), StoreError> {
        check_bounds(self.size, address, bytes.len())?;
        self.file.seek(SeekFrom::Start(address as u64))?;
        self.file.write_all(bytes)?;
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_starts_erased() {
        let mut mem = MemoryStorage::new(8);
        let mut buf = [0u8; 8];
        mem.read(0, &mut buf).unwrap();
        assert_eq!(buf, [ERASED; 8]);
    }

    #[test]
    fn test_memory_rejects_out_of_bounds() {
        let mut mem = MemoryStorage::new(8);
        let res = mem.write(6, &[1, 2, 3]);
        assert!(matches!(res, Err(StoreError::OutOfBounds { address: 6, len: 3 })));
        let mut buf = [0u8; 1];
        assert!(mem.read(usize::MAX, &mut buf).is_err());
    }

    #[test]
    fn test_memory_write_budget() {
        let mut mem = MemoryStorage::new(8);
        mem.fail_after_writes(1);
        mem.write(0, &[1]).unwrap();
        assert!(matches!(mem.write(1, &[2]), Err(StoreError::PowerLoss)));
        assert_eq!(&mem.as_bytes()[..2], &[1, ERASED]);
    }

    #[test]
    fn test_file_storage_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");
        {
            let mut file = FileStorage::open(&path, 64).unwrap();
            assert_eq!(file.size(), 64);
            file.write(10, &[0xAA, 0xBB]).unwrap();
        }
        let mut file = FileStorage::open(&path, 64).unwrap();
        let mut buf = [0u8; 3];
        file.read(9, &mut buf).unwrap();
        assert_eq!(buf, [ERASED, 0xAA, 0xBB]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 64);
    }

    #[test]
    fn test_file_storage_extends_short_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eeprom.bin");
        std::fs::write(&path, [0x00u8; 4]).unwrap();
        let mut file = FileStorage::open(&path, 16).unwrap();
        let mut buf = [0u8; 6];
        file.read(2, &mut buf).unwrap();
        assert_eq!(buf, [0, 0, ERASED, ERASED, ERASED, ERASED]);
    }
}
