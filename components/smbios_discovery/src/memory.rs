//! Firmware memory access.
//!
//! The locator and the walker never dereference addresses themselves; every
//! byte is read through a [`MemoryReader`] supplied by the host environment.
//! Two readers are provided: [`SliceMemory`] over a captured snapshot and
//! [`IdentityMappedMemory`] for boot environments where physical memory is
//! identity mapped.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::ops::Range;

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

use crate::{address::Address, error::MemoryError};

/// Read-only access to firmware memory.
///
/// Only [`read_u8`](MemoryReader::read_u8) is required. Wider reads are
/// little-endian and built from [`read_bytes`](MemoryReader::read_bytes);
/// readers backed by contiguous memory should override `read_bytes`.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait MemoryReader {
    /// Reads the byte at `address`.
    fn read_u8(&self, address: Address) -> Result<u8, MemoryError>;

    /// Fills `buffer` with the bytes starting at `address`.
    fn read_bytes(&self, address: Address, buffer: &mut [u8]) -> Result<(), MemoryError> {
        for (offset, byte) in buffer.iter_mut().enumerate() {
            let address = address.checked_add(offset as u64).ok_or(MemoryError::AddressOverflow)?;
            *byte = self.read_u8(address)?;
        }
        Ok(())
    }

    fn read_u16(&self, address: Address) -> Result<u16, MemoryError> {
        let mut bytes = [0u8; 2];
        self.read_bytes(address, &mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    fn read_u32(&self, address: Address) -> Result<u32, MemoryError> {
        let mut bytes = [0u8; 4];
        self.read_bytes(address, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u64(&self, address: Address) -> Result<u64, MemoryError> {
        let mut bytes = [0u8; 8];
        self.read_bytes(address, &mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }
}

/// A snapshot of firmware memory held in a byte slice.
///
/// `bytes[0]` is the byte at `base`. Reads outside the slice fail with
/// [`MemoryError::OutOfRange`].
#[derive(Debug, Clone, Copy)]
pub struct SliceMemory<'a> {
    base: Address,
    bytes: &'a [u8],
}

impl<'a> SliceMemory<'a> {
    pub const fn new(base: Address, bytes: &'a [u8]) -> Self {
        Self { base, bytes }
    }

    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn offset_of(&self, address: Address) -> Result<usize, MemoryError> {
        address
            .offset_from(self.base)
            .and_then(|offset| usize::try_from(offset).ok())
            .filter(|&offset| offset < self.bytes.len())
            .ok_or(MemoryError::OutOfRange { address })
    }
}

impl MemoryReader for SliceMemory<'_> {
    fn read_u8(&self, address: Address) -> Result<u8, MemoryError> {
        let offset = self.offset_of(address)?;
        Ok(self.bytes[offset])
    }

    fn read_bytes(&self, address: Address, buffer: &mut [u8]) -> Result<(), MemoryError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let start = self.offset_of(address)?;
        let source = start.checked_add(buffer.len()).and_then(|end| self.bytes.get(start..end)).ok_or_else(|| {
            let last = address.saturating_add(buffer.len() as u64 - 1);
            MemoryError::OutOfRange { address: last }
        })?;
        buffer.copy_from_slice(source);
        Ok(())
    }
}

/// Reads physical memory directly, for environments that identity map it
/// (for example UEFI boot services).
///
/// Reads are volatile and restricted to the range given at construction.
#[derive(Debug, Clone)]
pub struct IdentityMappedMemory {
    range: Range<u64>,
}

impl IdentityMappedMemory {
    /// Creates a reader over `range`.
    ///
    /// # Safety
    ///
    /// Every address in `range` must be mapped at the same virtual address and
    /// be readable for as long as the reader is used.
    pub const unsafe fn new(range: Range<u64>) -> Self {
        Self { range }
    }

    fn pointer_to(&self, address: Address) -> Result<*const u8, MemoryError> {
        if !self.range.contains(&address.as_u64()) {
            return Err(MemoryError::OutOfRange { address });
        }
        let address = usize::try_from(address.as_u64()).map_err(|_| MemoryError::OutOfRange { address })?;
        Ok(address as *const u8)
    }
}

impl MemoryReader for IdentityMappedMemory {
    fn read_u8(&self, address: Address) -> Result<u8, MemoryError> {
        let pointer = self.pointer_to(address)?;
        // SAFETY: the constructor contract guarantees `range` is mapped and readable.
        Ok(unsafe { core::ptr::read_volatile(pointer) })
    }
}
