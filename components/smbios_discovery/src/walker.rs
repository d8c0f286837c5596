//! SMBIOS structure table traversal.
//!
//! Each record is a 4-byte header, the rest of its formatted area, and a
//! string set closed by two consecutive NUL bytes. Records are visited in
//! table order; nothing is cached and every traversal reads memory afresh.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::iter::FusedIterator;

use crate::{
    address::Address,
    error::{MemoryError, WalkError},
    memory::MemoryReader,
    types::{
        is_oem_type, is_valid_handle, SmbiosHandle, SmbiosType, SMBIOS_STRUCTURE_HEADER_LENGTH,
        SMBIOS_TYPE_END_OF_TABLE,
    },
};

/// Header common to every SMBIOS structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureHeader {
    pub structure_type: SmbiosType,
    /// Length of the formatted area, header included.
    pub length: u8,
    pub handle: SmbiosHandle,
}

impl From<[u8; 4]> for StructureHeader {
    fn from(bytes: [u8; 4]) -> Self {
        Self { structure_type: bytes[0], length: bytes[1], handle: u16::from_le_bytes([bytes[2], bytes[3]]) }
    }
}

/// A record located in the structure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure {
    /// Address of the header.
    pub address: Address,
    pub header: StructureHeader,
}

impl Structure {
    pub const fn handle(&self) -> SmbiosHandle {
        self.header.handle
    }

    pub const fn structure_type(&self) -> SmbiosType {
        self.header.structure_type
    }

    /// First byte of the string set.
    pub const fn string_set_address(&self) -> Address {
        self.address.saturating_add(self.header.length as u64)
    }
}

/// How far a table may extend past its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLimit {
    /// The table length is declared by the entry point.
    Exact(u32),
    /// Only an upper bound is known; the table normally ends at the end-of-table record.
    Ceiling(u32),
}

impl TableLimit {
    pub const fn bytes(self) -> u32 {
        match self {
            TableLimit::Exact(length) | TableLimit::Ceiling(length) => length,
        }
    }
}

/// Location and extent of a structure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureTable {
    pub address: Address,
    /// Number of records to visit. `None` walks until the end-of-table record.
    pub structure_count: Option<u16>,
    pub limit: TableLimit,
}

impl StructureTable {
    /// A table described by a 2.x entry point.
    pub const fn new(address: Address, structure_count: u16, table_length: u16) -> Self {
        Self { address, structure_count: Some(structure_count), limit: TableLimit::Exact(table_length as u32) }
    }

    /// A table with no record count, walked until type 127 or `ceiling` bytes.
    pub const fn unbounded(address: Address, ceiling: u32) -> Self {
        Self { address, structure_count: None, limit: TableLimit::Ceiling(ceiling) }
    }

    /// One past the last byte the walk may read.
    pub const fn end(&self) -> Address {
        self.address.saturating_add(self.limit.bytes() as u64)
    }
}

/// Iterator over the records of a structure table.
///
/// Ends after the end-of-table record, after `structure_count` records, when a
/// table without a declared length reaches its ceiling, or after the first error.
pub struct StructureWalker<'a, M: MemoryReader + ?Sized> {
    memory: &'a M,
    table: StructureTable,
    cursor: Address,
    remaining: Option<u16>,
    /// Record whose string set has not been skipped yet.
    pending: Option<Structure>,
    finished: bool,
}

impl<'a, M: MemoryReader + ?Sized> StructureWalker<'a, M> {
    pub fn new(memory: &'a M, table: &StructureTable) -> Self {
        Self {
            memory,
            table: *table,
            cursor: table.address,
            remaining: table.structure_count,
            pending: None,
            finished: false,
        }
    }

    fn fits(&self, start: Address, length: u64) -> bool {
        start.checked_add(length).is_some_and(|end| end <= self.table.end())
    }

    /// Returns the address just past the double NUL that closes `structure`.
    fn skip_string_set(&self, structure: &Structure) -> Result<Address, WalkError> {
        let end = self.table.end();
        let mut cursor = structure.string_set_address();
        let mut previous_was_nul = false;
        loop {
            if cursor >= end {
                return Err(WalkError::OutOfBounds { address: structure.address });
            }
            let byte = self.memory.read_u8(cursor)?;
            cursor = cursor.checked_add(1).ok_or(MemoryError::AddressOverflow)?;
            if byte == 0 && previous_was_nul {
                return Ok(cursor);
            }
            previous_was_nul = byte == 0;
        }
    }

    fn read_structure(&mut self) -> Result<Option<Structure>, WalkError> {
        if self.remaining == Some(0) {
            return Ok(None);
        }

        if let Some(previous) = self.pending.take() {
            self.cursor = self.skip_string_set(&previous)?;
        }

        let address = self.cursor;
        if address == self.table.end() && matches!(self.table.limit, TableLimit::Ceiling(_)) {
            log::debug!(
                "SMBIOS table at {} reached its {:#x} byte ceiling",
                self.table.address,
                self.table.limit.bytes()
            );
            return Ok(None);
        }
        if !self.fits(address, u64::from(SMBIOS_STRUCTURE_HEADER_LENGTH)) {
            return Err(WalkError::OutOfBounds { address });
        }

        let mut bytes = [0u8; SMBIOS_STRUCTURE_HEADER_LENGTH as usize];
        self.memory.read_bytes(address, &mut bytes)?;
        let header = StructureHeader::from(bytes);

        if header.length < SMBIOS_STRUCTURE_HEADER_LENGTH || !self.fits(address, u64::from(header.length)) {
            return Err(WalkError::MalformedStructure { address, length: header.length });
        }

        log::trace!(
            "SMBIOS structure type {}{} handle {:#06x} length {:#x} at {address}",
            header.structure_type,
            if is_oem_type(header.structure_type) { " (OEM)" } else { "" },
            header.handle,
            header.length
        );
        if !is_valid_handle(header.handle) {
            log::debug!("SMBIOS structure at {address} uses reserved handle {:#06x}", header.handle);
        }

        let structure = Structure { address, header };
        self.remaining = self.remaining.map(|count| count - 1);
        if header.structure_type == SMBIOS_TYPE_END_OF_TABLE {
            self.finished = true;
        } else {
            self.pending = Some(structure);
        }
        Ok(Some(structure))
    }
}

impl<M: MemoryReader + ?Sized> Iterator for StructureWalker<'_, M> {
    type Item = Result<Structure, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_structure() {
            Ok(Some(structure)) => Some(Ok(structure)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

impl<M: MemoryReader + ?Sized> FusedIterator for StructureWalker<'_, M> {}

/// Returns the handle of the first structure of `wanted_type`, in table order.
///
/// A malformed table ends the search with `None`.
pub fn find_structure<M: MemoryReader + ?Sized>(
    memory: &M,
    table: &StructureTable,
    wanted_type: SmbiosType,
) -> Option<SmbiosHandle> {
    for record in StructureWalker::new(memory, table) {
        match record {
            Ok(structure) if structure.structure_type() == wanted_type => return Some(structure.handle()),
            Ok(_) => {}
            Err(error) => {
                log::warn!("SMBIOS table at {} is malformed: {error}", table.address);
                return None;
            }
        }
    }
    log::debug!("No SMBIOS structure of type {wanted_type} in table at {}", table.address);
    None
}
