//! Intrusive free list for uniform-size file slots.
//!
//! Reclaimed slots are threaded through the file itself: the first 8 bytes
//! at each freed address hold the address of the next freed slot, with 0
//! terminating the chain. Only the head lives in memory; the chain is never
//! scanned eagerly. Both the index file (node blocks) and the row file (row
//! records) use one of these.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::common::Result;

/// LIFO allocator for fixed-size slots inside a single file.
///
/// # Policy
/// Last-freed, first-reused: favors locality of reuse over address
/// monotonicity. No coalescing — every slot has the same size, so there is
/// nothing to coalesce.
///
/// When the list is empty, `allocate` extends the file by one zeroed slot
/// and hands out the old end-of-file offset, so two back-to-back
/// allocations can never return the same address.
///
/// The head must be persisted by the owner (both file formats keep it in
/// their header) and handed back via [`FreeList::new`] on reopen.
#[derive(Debug)]
pub struct FreeList {
    /// Address of the most recently freed slot, 0 when empty.
    head: u64,
    /// Size of every slot this list manages.
    slot_size: u64,
}

impl FreeList {
    /// Rebuild a free list from a persisted head.
    pub fn new(head: u64, slot_size: u64) -> Self {
        debug_assert!(slot_size >= 8, "slot must be able to hold a link");
        Self { head, slot_size }
    }

    /// Current head address (0 = empty), for header persistence.
    #[inline]
    pub fn head(&self) -> u64 {
        self.head
    }

    /// The address the next `allocate` call will return, without claiming it.
    ///
    /// Valid only while no writes happen to `file` in between.
    pub fn peek(&self, file: &File) -> Result<u64> {
        if self.head != 0 {
            return Ok(self.head);
        }
        Ok(file.metadata()?.len())
    }

    /// Claim a slot: pop the head, or extend the file by one zeroed slot.
    pub fn allocate(&mut self, file: &mut File) -> Result<u64> {
        if self.head == 0 {
            let addr = file.seek(SeekFrom::End(0))?;
            file.write_all(&vec![0u8; self.slot_size as usize])?;
            return Ok(addr);
        }

        let addr = self.head;
        let mut link = [0u8; 8];
        file.seek(SeekFrom::Start(addr))?;
        file.read_exact(&mut link)?;
        self.head = u64::from_le_bytes(link);
        Ok(addr)
    }

    /// Return a slot to the list.
    ///
    /// Overwrites the first 8 bytes at `addr` with the current head and
    /// makes `addr` the new head.
    pub fn release(&mut self, file: &mut File, addr: u64) -> Result<()> {
        debug_assert_ne!(addr, 0, "cannot release the nil address");
        file.seek(SeekFrom::Start(addr))?;
        file.write_all(&self.head.to_le_bytes())?;
        self.head = addr;
        Ok(())
    }
}
