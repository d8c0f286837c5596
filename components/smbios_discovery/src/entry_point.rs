//! SMBIOS entry point structures.
//!
//! Reference SMBIOS 3.4, chapter 5.2: the 2.1 (32-bit) entry point anchored by
//! `_SM_` and the 3.0 (64-bit) entry point anchored by `_SM3_`. Both carry a
//! checksum byte chosen so that the first `entry_point_length` bytes sum to
//! zero modulo 256.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use core::fmt;

use smbios_bcd::BcdError;
use zerocopy::{
    byteorder::little_endian::{U16, U32, U64},
    FromBytes,
};

use crate::{
    address::Address,
    config::WalkerConfig,
    error::{CandidateRejection, MemoryError},
    memory::MemoryReader,
    walker::StructureTable,
};

/// _SM_, specified as four ASCII characters (5F 53 4D 5F).
pub const SMBIOS_ANCHOR_STRING: &[u8; 4] = b"_SM_";
/// _SM3_, specified as five ASCII characters (5F 53 4D 33 5F).
pub const SMBIOS_3_0_ANCHOR_STRING: &[u8; 5] = b"_SM3_";
/// _DMI_, the intermediate anchor at offset 10h of a 2.1 entry point.
pub const SMBIOS_DMI_ANCHOR_STRING: &[u8; 5] = b"_DMI_";
/// Offset of the intermediate anchor within a 2.1 entry point.
pub const SMBIOS_DMI_ANCHOR_OFFSET: usize = 0x10;
/// Bytes covered by the intermediate checksum, independent of the declared length.
pub const SMBIOS_DMI_REGION_LENGTH: usize = 0x0F;
/// Entry points are paragraph aligned.
pub const SMBIOS_ENTRY_POINT_ALIGNMENT: u64 = 0x10;

/// Largest region an 8-bit length field can describe.
const MAX_ENTRY_POINT_LENGTH: usize = u8::MAX as usize;

/// SMBIOS 2.1 (32-bit) Entry Point structure.
#[allow(dead_code)]
#[repr(C)]
#[derive(
    zerocopy_derive::FromBytes, zerocopy_derive::KnownLayout, zerocopy_derive::Immutable, zerocopy_derive::Unaligned,
)]
struct RawEntryPoint21 {
    anchor_string: [u8; 4],              // 00h
    checksum: u8,                        // 04h
    entry_point_length: u8,              // 05h
    major_version: u8,                   // 06h
    minor_version: u8,                   // 07h
    max_structure_size: U16,             // 08h
    entry_point_revision: u8,            // 0Ah
    formatted_area: [u8; 5],             // 0Bh
    intermediate_anchor_string: [u8; 5], // 10h
    intermediate_checksum: u8,           // 15h
    table_length: U16,                   // 16h
    table_address: U32,                  // 18h
    number_of_structures: U16,           // 1Ch
    bcd_revision: u8,                    // 1Eh
}

/// SMBIOS 3.0 (64-bit) Entry Point structure.
#[allow(dead_code)]
#[repr(C)]
#[derive(
    zerocopy_derive::FromBytes, zerocopy_derive::KnownLayout, zerocopy_derive::Immutable, zerocopy_derive::Unaligned,
)]
struct RawEntryPoint30 {
    anchor_string: [u8; 5],   // 00h
    checksum: u8,             // 05h
    entry_point_length: u8,   // 06h
    major_version: u8,        // 07h
    minor_version: u8,        // 08h
    docrev: u8,               // 09h
    entry_point_revision: u8, // 0Ah
    reserved: u8,             // 0Bh
    table_maximum_size: U32,  // 0Ch
    table_address: U64,       // 10h
}

/// The two entry point layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPointKind {
    /// SMBIOS 2.1+ 32-bit entry point, anchor `_SM_`.
    Smbios2,
    /// SMBIOS 3.0+ 64-bit entry point, anchor `_SM3_`.
    Smbios3,
}

impl EntryPointKind {
    pub const fn anchor(self) -> &'static [u8] {
        match self {
            EntryPointKind::Smbios2 => SMBIOS_ANCHOR_STRING,
            EntryPointKind::Smbios3 => SMBIOS_3_0_ANCHOR_STRING,
        }
    }

    const fn length_offset(self) -> u64 {
        match self {
            EntryPointKind::Smbios2 => 0x05,
            EntryPointKind::Smbios3 => 0x06,
        }
    }

    /// Shortest declared length that still covers every field the table walk needs.
    ///
    /// Some 2.1 firmware reports 1Eh instead of 1Fh, omitting the BCD revision.
    pub const fn minimum_length(self) -> u8 {
        match self {
            EntryPointKind::Smbios2 => 0x1E,
            EntryPointKind::Smbios3 => 0x18,
        }
    }
}

/// SMBIOS specification version, displayed as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SmbiosVersion {
    pub major: u8,
    pub minor: u8,
}

impl SmbiosVersion {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for SmbiosVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// SMBIOS BCD revision byte: high nibble major, low nibble minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision(u8);

impl Revision {
    /// A zero byte means the revision is not reported.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub const fn major(self) -> u8 {
        self.0 >> 4
    }

    pub const fn minor(self) -> u8 {
        self.0 & 0x0F
    }

    /// The revision as a two digit decimal number, e.g. `0x28` is `28`.
    pub fn as_decimal(self) -> Result<u8, BcdError> {
        smbios_bcd::bcd_to_decimal(self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

/// A validated SMBIOS entry point.
///
/// Produced once by the [`Locator`](crate::locator::Locator). It records where
/// the structure table lives but holds none of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    /// Where the anchor was found.
    pub address: Address,
    pub kind: EntryPointKind,
    /// Stored checksum byte.
    pub checksum: u8,
    /// Declared length of the entry point; bounds the checksum.
    pub entry_point_length: u8,
    pub version: SmbiosVersion,
    /// 2.x BCD revision, when reported.
    pub revision: Option<Revision>,
    pub entry_point_revision: u8,
    /// 2.x only.
    pub max_structure_size: Option<u16>,
    /// 3.x only.
    pub docrev: Option<u8>,
    pub table_address: Address,
    /// Exact table length, 2.x only.
    pub table_length: Option<u16>,
    /// Upper bound of the table length, 3.x only.
    pub table_maximum_size: Option<u32>,
    /// Number of structures in the table, 2.x only.
    pub structure_count: Option<u16>,
}

impl EntryPoint {
    /// The signature that matched.
    pub const fn anchor(&self) -> &'static [u8] {
        self.kind.anchor()
    }

    /// Describes the structure table for the walker.
    ///
    /// 2.x tables are bounded by their declared length and structure count.
    /// 3.x tables are bounded by `table_maximum_size` capped at the configured
    /// ceiling, and end at the end-of-table structure.
    pub fn structure_table(&self, config: &WalkerConfig) -> StructureTable {
        match (self.table_length, self.structure_count) {
            (Some(length), Some(count)) => StructureTable::new(self.table_address, count, length),
            _ => {
                let ceiling = match self.table_maximum_size {
                    Some(maximum) if maximum != 0 => maximum.min(config.table_ceiling),
                    _ => config.table_ceiling,
                };
                StructureTable::unbounded(self.table_address, ceiling)
            }
        }
    }

    /// Validates and parses the candidate of `kind` whose anchor sits at `address`.
    ///
    /// The anchor itself is assumed to have matched already.
    pub(crate) fn read<M: MemoryReader + ?Sized>(
        memory: &M,
        kind: EntryPointKind,
        address: Address,
        require_dmi_anchor: bool,
    ) -> Result<Self, CandidateRejection> {
        let length_address = address.checked_add(kind.length_offset()).ok_or(MemoryError::AddressOverflow)?;
        let length = memory.read_u8(length_address)?;
        if length < kind.minimum_length() {
            return Err(CandidateRejection::LengthTooShort { length });
        }

        // Bytes past the declared length stay zero.
        let mut region = [0u8; MAX_ENTRY_POINT_LENGTH];
        let declared = &mut region[..length as usize];
        memory.read_bytes(address, declared)?;

        let sum = checksum(declared);
        if sum != 0 {
            return Err(CandidateRejection::ChecksumMismatch { sum });
        }

        match kind {
            EntryPointKind::Smbios2 => {
                if require_dmi_anchor {
                    Self::check_dmi_region(memory, address)?;
                }
                Self::parse_21(address, &region, length)
            }
            EntryPointKind::Smbios3 => Self::parse_30(address, &region, length),
        }
    }

    /// Checks the `_DMI_` anchor and the checksum of the fixed region at 10h..1Fh.
    ///
    /// The region is read from memory rather than from the declared bytes, so a
    /// 1Eh length still has its BCD revision byte summed.
    fn check_dmi_region<M: MemoryReader + ?Sized>(memory: &M, address: Address) -> Result<(), CandidateRejection> {
        let region_address =
            address.checked_add(SMBIOS_DMI_ANCHOR_OFFSET as u64).ok_or(MemoryError::AddressOverflow)?;
        let mut region = [0u8; SMBIOS_DMI_REGION_LENGTH];
        memory.read_bytes(region_address, &mut region)?;

        if region[..SMBIOS_DMI_ANCHOR_STRING.len()] != *SMBIOS_DMI_ANCHOR_STRING {
            return Err(CandidateRejection::MissingDmiAnchor);
        }
        let sum = checksum(&region);
        if sum != 0 {
            return Err(CandidateRejection::IntermediateChecksumMismatch { sum });
        }
        Ok(())
    }

    fn parse_21(
        address: Address,
        region: &[u8; MAX_ENTRY_POINT_LENGTH],
        length: u8,
    ) -> Result<Self, CandidateRejection> {
        let (raw, _) =
            RawEntryPoint21::read_from_prefix(region).map_err(|_| CandidateRejection::LengthTooShort { length })?;

        Ok(Self {
            address,
            kind: EntryPointKind::Smbios2,
            checksum: raw.checksum,
            entry_point_length: raw.entry_point_length,
            version: SmbiosVersion::new(raw.major_version, raw.minor_version),
            revision: Revision::from_raw(raw.bcd_revision),
            entry_point_revision: raw.entry_point_revision,
            max_structure_size: Some(raw.max_structure_size.get()),
            docrev: None,
            table_address: Address::new(u64::from(raw.table_address.get())),
            table_length: Some(raw.table_length.get()),
            table_maximum_size: None,
            structure_count: Some(raw.number_of_structures.get()),
        })
    }

    fn parse_30(
        address: Address,
        region: &[u8; MAX_ENTRY_POINT_LENGTH],
        length: u8,
    ) -> Result<Self, CandidateRejection> {
        let (raw, _) =
            RawEntryPoint30::read_from_prefix(region).map_err(|_| CandidateRejection::LengthTooShort { length })?;

        Ok(Self {
            address,
            kind: EntryPointKind::Smbios3,
            checksum: raw.checksum,
            entry_point_length: raw.entry_point_length,
            version: SmbiosVersion::new(raw.major_version, raw.minor_version),
            revision: None,
            entry_point_revision: raw.entry_point_revision,
            max_structure_size: None,
            docrev: Some(raw.docrev),
            table_address: Address::new(raw.table_address.get()),
            table_length: None,
            table_maximum_size: Some(raw.table_maximum_size.get()),
            structure_count: None,
        })
    }
}

/// Modulo-256 sum of `bytes`; a valid entry point sums to zero.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use core::mem;
    use std::{string::ToString, vec, vec::Vec};

    use crate::{memory::SliceMemory, walker::TableLimit};

    const BASE: u64 = 0xF0000;

    fn entry_point_21(table_address: u32, table_length: u16, count: u16, version: (u8, u8), bcd: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x1F];
        bytes[0x00..0x04].copy_from_slice(SMBIOS_ANCHOR_STRING);
        bytes[0x05] = 0x1F;
        bytes[0x06] = version.0;
        bytes[0x07] = version.1;
        bytes[0x08..0x0A].copy_from_slice(&0x00A0u16.to_le_bytes());
        bytes[0x10..0x15].copy_from_slice(SMBIOS_DMI_ANCHOR_STRING);
        bytes[0x16..0x18].copy_from_slice(&table_length.to_le_bytes());
        bytes[0x18..0x1C].copy_from_slice(&table_address.to_le_bytes());
        bytes[0x1C..0x1E].copy_from_slice(&count.to_le_bytes());
        bytes[0x1E] = bcd;
        bytes[0x15] = 0u8.wrapping_sub(checksum(&bytes[0x10..0x1F]));
        bytes[0x04] = 0u8.wrapping_sub(checksum(&bytes));
        bytes
    }

    fn entry_point_30(table_address: u64, maximum_size: u32) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x18];
        bytes[0x00..0x05].copy_from_slice(SMBIOS_3_0_ANCHOR_STRING);
        bytes[0x06] = 0x18;
        bytes[0x07] = 3;
        bytes[0x08] = 4;
        bytes[0x0A] = 1;
        bytes[0x0C..0x10].copy_from_slice(&maximum_size.to_le_bytes());
        bytes[0x10..0x18].copy_from_slice(&table_address.to_le_bytes());
        bytes[0x05] = 0u8.wrapping_sub(checksum(&bytes));
        bytes
    }

    #[test]
    fn test_raw_layout_sizes() {
        assert_eq!(mem::size_of::<RawEntryPoint21>(), 0x1F);
        assert_eq!(mem::size_of::<RawEntryPoint30>(), 0x18);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0xFF, 0x01]), 0);
        assert_eq!(checksum(&[0x80, 0x80, 0x05]), 0x05);
    }

    #[test]
    fn test_read_21_entry_point() {
        let bytes = entry_point_21(0x000F_1000, 0x0123, 7, (2, 8), 0x28);
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), true).unwrap();
        assert_eq!(entry_point.address, Address::new(BASE));
        assert_eq!(entry_point.anchor(), b"_SM_");
        assert_eq!(entry_point.entry_point_length, 0x1F);
        assert_eq!(entry_point.checksum, bytes[0x04]);
        assert_eq!(entry_point.version.to_string(), "2.8");
        assert_eq!(entry_point.revision.map(Revision::raw), Some(0x28));
        assert_eq!(entry_point.max_structure_size, Some(0xA0));
        assert_eq!(entry_point.table_address, Address::new(0xF1000));
        assert_eq!(entry_point.table_length, Some(0x0123));
        assert_eq!(entry_point.structure_count, Some(7));
        assert_eq!(entry_point.table_maximum_size, None);
        assert_eq!(entry_point.docrev, None);
    }

    #[test]
    fn test_read_30_entry_point() {
        let bytes = entry_point_30(0x1_2345_6000, 0x2000);
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios3, Address::new(BASE), false).unwrap();
        assert_eq!(entry_point.anchor(), b"_SM3_");
        assert_eq!(entry_point.version, SmbiosVersion::new(3, 4));
        assert_eq!(entry_point.revision, None);
        assert_eq!(entry_point.docrev, Some(0));
        assert_eq!(entry_point.entry_point_revision, 1);
        assert_eq!(entry_point.table_address, Address::new(0x1_2345_6000));
        assert_eq!(entry_point.table_maximum_size, Some(0x2000));
        assert_eq!(entry_point.table_length, None);
        assert_eq!(entry_point.structure_count, None);
    }

    #[test]
    fn test_zero_bcd_revision_is_absent() {
        let bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 4), 0);
        let memory = SliceMemory::new(Address::new(BASE), &bytes);
        let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), false).unwrap();
        assert_eq!(entry_point.revision, None);
    }

    #[test]
    fn test_short_21_entry_point_has_no_revision() {
        let mut bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 1), 0x21);
        bytes.truncate(0x1E);
        bytes[0x05] = 0x1E;
        bytes[0x04] = 0;
        bytes[0x04] = 0u8.wrapping_sub(checksum(&bytes));
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), false).unwrap();
        assert_eq!(entry_point.entry_point_length, 0x1E);
        assert_eq!(entry_point.revision, None);
        assert_eq!(entry_point.structure_count, Some(1));
    }

    #[test]
    fn test_checksum_mismatch_is_rejected() {
        let mut bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 8), 0x28);
        bytes[0x04] = bytes[0x04].wrapping_add(1);
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        assert_eq!(
            EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), false),
            Err(CandidateRejection::ChecksumMismatch { sum: 1 })
        );
    }

    #[test]
    fn test_length_too_short_is_rejected() {
        let mut bytes = entry_point_30(0x1000, 0x100);
        bytes[0x06] = 0x10;
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        assert_eq!(
            EntryPoint::read(&memory, EntryPointKind::Smbios3, Address::new(BASE), false),
            Err(CandidateRejection::LengthTooShort { length: 0x10 })
        );
    }

    #[test]
    fn test_dmi_anchor_requirement() {
        let mut bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 8), 0x28);
        bytes[0x10..0x15].copy_from_slice(b"XXXXX");
        bytes[0x04] = 0;
        bytes[0x04] = 0u8.wrapping_sub(checksum(&bytes));
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        assert!(EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), false).is_ok());
        assert_eq!(
            EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), true),
            Err(CandidateRejection::MissingDmiAnchor)
        );
    }

    #[test]
    fn test_intermediate_checksum_requirement() {
        let mut bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 8), 0x28);
        // Move one unit between the two checksum regions: the overall sum holds.
        bytes[0x15] = bytes[0x15].wrapping_add(1);
        bytes[0x0B] = bytes[0x0B].wrapping_sub(1);
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        assert!(EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), false).is_ok());
        assert_eq!(
            EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), true),
            Err(CandidateRejection::IntermediateChecksumMismatch { sum: 1 })
        );
    }

    #[test]
    fn test_intermediate_checksum_ignores_declared_length() {
        // 1Eh length with the BCD revision byte still present in memory.
        let mut bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 8), 0x28);
        bytes[0x05] = 0x1E;
        bytes[0x04] = 0;
        bytes[0x04] = 0u8.wrapping_sub(checksum(&bytes[..0x1E]));
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), true).unwrap();
        assert_eq!(entry_point.entry_point_length, 0x1E);
        assert_eq!(entry_point.revision, None);

        // 20h length with one trailing byte outside the intermediate region.
        let mut bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 8), 0x28);
        bytes.push(0x5A);
        bytes[0x05] = 0x20;
        bytes[0x04] = 0;
        bytes[0x04] = 0u8.wrapping_sub(checksum(&bytes));
        let memory = SliceMemory::new(Address::new(BASE), &bytes);

        let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), true).unwrap();
        assert_eq!(entry_point.entry_point_length, 0x20);
        assert_eq!(entry_point.revision.map(Revision::raw), Some(0x28));
    }

    #[test]
    fn test_unreadable_candidate_is_rejected() {
        let bytes = entry_point_21(0x000F_1000, 0x10, 1, (2, 8), 0x28);
        let memory = SliceMemory::new(Address::new(BASE), &bytes[..0x10]);

        assert_eq!(
            EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), false),
            Err(CandidateRejection::Unreadable(MemoryError::OutOfRange { address: Address::new(BASE + 0x1E) }))
        );
    }

    #[test]
    fn test_structure_table_for_21() {
        let bytes = entry_point_21(0x000F_1000, 0x0123, 7, (2, 8), 0x28);
        let memory = SliceMemory::new(Address::new(BASE), &bytes);
        let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios2, Address::new(BASE), false).unwrap();

        let table = entry_point.structure_table(&WalkerConfig::default());
        assert_eq!(table, StructureTable::new(Address::new(0xF1000), 7, 0x0123));
    }

    #[test]
    fn test_structure_table_for_30_is_capped() {
        let config = WalkerConfig { table_ceiling: 0x1000 };
        for (maximum, expected) in [(0x800, 0x800), (0x4000, 0x1000), (0, 0x1000)] {
            let bytes = entry_point_30(0x8000_0000, maximum);
            let memory = SliceMemory::new(Address::new(BASE), &bytes);
            let entry_point = EntryPoint::read(&memory, EntryPointKind::Smbios3, Address::new(BASE), false).unwrap();

            let table = entry_point.structure_table(&config);
            assert_eq!(table.address, Address::new(0x8000_0000));
            assert_eq!(table.structure_count, None);
            assert_eq!(table.limit, TableLimit::Ceiling(expected));
        }
    }

    #[test]
    fn test_revision() {
        let revision = Revision::from_raw(0x28).unwrap();
        assert_eq!(revision.major(), 2);
        assert_eq!(revision.minor(), 8);
        assert_eq!(revision.as_decimal(), Ok(28));
        assert_eq!(revision.to_string(), "2.8");
        assert_eq!(Revision::from_raw(0x3A).unwrap().as_decimal(), Err(BcdError::InvalidBcd(0x3A)));
        assert_eq!(Revision::from_raw(0), None);
    }
}
