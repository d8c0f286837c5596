//! Error types for SMBIOS discovery
//!
//! Only absence reaches callers of the locator: individual candidates that
//! fail validation are rejected internally and the scan moves on. The walker
//! reports [`WalkError`] through [`StructureWalker`](crate::walker::StructureWalker)
//! while [`find_structure`](crate::walker::find_structure) folds it into `None`.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::fmt;

use r_efi::efi;

use crate::address::Address;

/// Failure to read firmware memory through a [`MemoryReader`](crate::memory::MemoryReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// The address is not backed by the reader.
    OutOfRange { address: Address },
    /// A multi-byte access would wrap past the top of the address space.
    AddressOverflow,
}

/// Failure to locate an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateError {
    /// No anchor with a valid checksum exists in any searched location.
    NotFound,
}

/// Failure while walking a structure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
    /// The record at `address` declares a formatted length below the header size.
    MalformedStructure { address: Address, length: u8 },
    /// The record at `address` would extend past the end of the table.
    OutOfBounds { address: Address },
    /// The table memory could not be read.
    Memory(MemoryError),
}

/// Why a matched anchor was not accepted as an entry point.
///
/// Never returned to callers; it is logged and the scan continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandidateRejection {
    ChecksumMismatch { sum: u8 },
    IntermediateChecksumMismatch { sum: u8 },
    MissingDmiAnchor,
    LengthTooShort { length: u8 },
    Unreadable(MemoryError),
}

impl From<MemoryError> for WalkError {
    fn from(error: MemoryError) -> Self {
        WalkError::Memory(error)
    }
}

impl From<MemoryError> for CandidateRejection {
    fn from(error: MemoryError) -> Self {
        CandidateRejection::Unreadable(error)
    }
}

impl From<MemoryError> for efi::Status {
    fn from(_error: MemoryError) -> Self {
        efi::Status::DEVICE_ERROR
    }
}

impl From<LocateError> for efi::Status {
    fn from(error: LocateError) -> Self {
        match error {
            LocateError::NotFound => efi::Status::NOT_FOUND,
        }
    }
}

impl From<WalkError> for efi::Status {
    fn from(error: WalkError) -> Self {
        match error {
            WalkError::MalformedStructure { .. } | WalkError::OutOfBounds { .. } => efi::Status::VOLUME_CORRUPTED,
            WalkError::Memory(error) => error.into(),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::OutOfRange { address } => write!(f, "address {address} is not readable"),
            MemoryError::AddressOverflow => write!(f, "access wraps past the end of the address space"),
        }
    }
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateError::NotFound => write!(f, "no valid SMBIOS entry point found"),
        }
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkError::MalformedStructure { address, length } => {
                write!(f, "structure at {address} declares length {length}, below the 4 byte header")
            }
            WalkError::OutOfBounds { address } => write!(f, "structure at {address} runs past the end of the table"),
            WalkError::Memory(error) => write!(f, "structure table unreadable: {error}"),
        }
    }
}

impl fmt::Display for CandidateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateRejection::ChecksumMismatch { sum } => write!(f, "checksum sums to {sum:#04x}"),
            CandidateRejection::IntermediateChecksumMismatch { sum } => {
                write!(f, "intermediate checksum sums to {sum:#04x}")
            }
            CandidateRejection::MissingDmiAnchor => write!(f, "_DMI_ anchor missing"),
            CandidateRejection::LengthTooShort { length } => write!(f, "entry point length {length:#x} is too short"),
            CandidateRejection::Unreadable(error) => write!(f, "{error}"),
        }
    }
}
