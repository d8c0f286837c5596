//! SMBIOS entry point locator.
//!
//! Searches for the entry point of each configured [`EntryPointKind`] in
//! priority order. For every kind the address published through the UEFI
//! configuration table (if any) is tried first, then the search window is
//! scanned on 16-byte boundaries. Each anchor match is validated on its own;
//! a candidate that fails validation is skipped and the scan continues.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use crate::{
    address::Address,
    config::LocatorConfig,
    entry_point::{EntryPoint, EntryPointKind, SMBIOS_ENTRY_POINT_ALIGNMENT},
    error::LocateError,
    memory::MemoryReader,
};

/// Longest anchor of any entry point kind.
const MAX_ANCHOR_LENGTH: usize = 5;

/// Finds the SMBIOS entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct Locator {
    config: LocatorConfig,
}

impl Locator {
    pub const fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Returns the first valid entry point, trying kinds in the configured order.
    pub fn locate<M: MemoryReader + ?Sized>(&self, memory: &M) -> Result<EntryPoint, LocateError> {
        for &kind in self.config.search_order {
            if let Some(entry_point) = self.locate_kind(memory, kind) {
                log::info!(
                    "SMBIOS {} entry point found at {} (table at {})",
                    entry_point.version,
                    entry_point.address,
                    entry_point.table_address
                );
                return Ok(entry_point);
            }
        }

        log::debug!(
            "No SMBIOS entry point in {:#x}..{:#x}",
            self.config.search_base,
            self.config.search_base.saturating_add(self.config.search_length)
        );
        Err(LocateError::NotFound)
    }

    fn locate_kind<M: MemoryReader + ?Sized>(&self, memory: &M, kind: EntryPointKind) -> Option<EntryPoint> {
        if let Some(address) = self.config.uefi_entry_point(kind) {
            match self.try_candidate(memory, kind, address) {
                Some(entry_point) => return Some(entry_point),
                None => log::debug!("UEFI published {kind:?} entry point at {address} is not valid, scanning"),
            }
        }

        self.scan_addresses(kind).find_map(|address| self.try_candidate(memory, kind, address))
    }

    /// Paragraph-aligned addresses in the window where the anchor of `kind` fits.
    fn scan_addresses(&self, kind: EntryPointKind) -> impl Iterator<Item = Address> {
        let end = self.config.search_base.saturating_add(self.config.search_length);
        let anchor_length = kind.anchor().len() as u64;
        let first = align_up(self.config.search_base, SMBIOS_ENTRY_POINT_ALIGNMENT).unwrap_or(end);

        (first..end)
            .step_by(SMBIOS_ENTRY_POINT_ALIGNMENT as usize)
            .take_while(move |address| address.checked_add(anchor_length).is_some_and(|anchor_end| anchor_end <= end))
            .map(Address::new)
    }

    fn try_candidate<M: MemoryReader + ?Sized>(
        &self,
        memory: &M,
        kind: EntryPointKind,
        address: Address,
    ) -> Option<EntryPoint> {
        let expected = kind.anchor();
        let mut buffer = [0u8; MAX_ANCHOR_LENGTH];
        let anchor = &mut buffer[..expected.len()];
        if memory.read_bytes(address, anchor).is_err() || anchor != expected {
            return None;
        }

        match EntryPoint::read(memory, kind, address, self.config.require_dmi_anchor) {
            Ok(entry_point) => Some(entry_point),
            Err(rejection) => {
                log::debug!("Rejected {kind:?} anchor at {address}: {rejection}");
                None
            }
        }
    }
}

/// Locates the entry point using [`LocatorConfig::default`].
pub fn locate_entry_point<M: MemoryReader + ?Sized>(memory: &M) -> Result<EntryPoint, LocateError> {
    Locator::default().locate(memory)
}

const fn align_up(value: u64, alignment: u64) -> Option<u64> {
    match value.checked_add(alignment - 1) {
        Some(value) => Some(value & !(alignment - 1)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::{vec, vec::Vec};

    use crate::{
        entry_point::{checksum, SmbiosVersion},
        memory::SliceMemory,
    };

    const WINDOW: u64 = 0xF0000;
    const WINDOW_LENGTH: usize = 0x10000;

    fn entry_point_21(table_address: u32, version: (u8, u8)) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x1F];
        bytes[0x00..0x04].copy_from_slice(b"_SM_");
        bytes[0x05] = 0x1F;
        bytes[0x06] = version.0;
        bytes[0x07] = version.1;
        bytes[0x10..0x15].copy_from_slice(b"_DMI_");
        bytes[0x16..0x18].copy_from_slice(&0x40u16.to_le_bytes());
        bytes[0x18..0x1C].copy_from_slice(&table_address.to_le_bytes());
        bytes[0x1C..0x1E].copy_from_slice(&3u16.to_le_bytes());
        bytes[0x1E] = (version.0 << 4) | version.1;
        bytes[0x15] = 0u8.wrapping_sub(checksum(&bytes[0x10..]));
        bytes[0x04] = 0u8.wrapping_sub(checksum(&bytes));
        bytes
    }

    fn entry_point_30(table_address: u64) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x18];
        bytes[0x00..0x05].copy_from_slice(b"_SM3_");
        bytes[0x06] = 0x18;
        bytes[0x07] = 3;
        bytes[0x08] = 2;
        bytes[0x0A] = 1;
        bytes[0x0C..0x10].copy_from_slice(&0x1000u32.to_le_bytes());
        bytes[0x10..0x18].copy_from_slice(&table_address.to_le_bytes());
        bytes[0x05] = 0u8.wrapping_sub(checksum(&bytes));
        bytes
    }

    fn window_with(placements: &[(usize, &[u8])]) -> Vec<u8> {
        let mut window = vec![0u8; WINDOW_LENGTH];
        for (offset, bytes) in placements {
            window[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }
        window
    }

    #[test]
    fn test_locates_aligned_entry_point() {
        let entry_point = entry_point_21(0x000F_8000, (2, 8));
        for offset in [0x0000, 0x0010, 0x4560, WINDOW_LENGTH - 0x20] {
            let window = window_with(&[(offset, &entry_point[..])]);
            let memory = SliceMemory::new(Address::new(WINDOW), &window);

            let found = locate_entry_point(&memory).unwrap();
            assert_eq!(found.address, Address::new(WINDOW + offset as u64));
            assert_eq!(found.kind, EntryPointKind::Smbios2);
            assert_eq!(found.version, SmbiosVersion::new(2, 8));
            assert_eq!(found.table_address, Address::new(0xF8000));
            assert_eq!(found.table_length, Some(0x40));
            assert_eq!(found.structure_count, Some(3));
        }
    }

    #[test]
    fn test_ignores_unaligned_anchor() {
        let entry_point = entry_point_21(0x000F_8000, (2, 8));
        let window = window_with(&[(0x18, &entry_point[..])]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);

        assert_eq!(locate_entry_point(&memory), Err(LocateError::NotFound));
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut entry_point = entry_point_21(0x000F_8000, (2, 8));
        entry_point[0x04] ^= 0x01;
        let window = window_with(&[(0x100, &entry_point[..])]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);

        assert_eq!(locate_entry_point(&memory), Err(LocateError::NotFound));
    }

    #[test]
    fn test_continues_past_rejected_candidate() {
        let mut bad = entry_point_21(0x000F_1000, (2, 4));
        bad[0x04] = bad[0x04].wrapping_add(3);
        let good = entry_point_21(0x000F_2000, (2, 7));
        let window = window_with(&[(0x100, &bad[..]), (0x200, &good[..])]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);

        let found = locate_entry_point(&memory).unwrap();
        assert_eq!(found.address, Address::new(WINDOW + 0x200));
        assert_eq!(found.version, SmbiosVersion::new(2, 7));
    }

    #[test]
    fn test_prefers_64_bit_entry_point() {
        let window = window_with(&[
            (0x100, &entry_point_21(0x000F_1000, (2, 8))[..]),
            (0x800, &entry_point_30(0x8000_0000)[..]),
        ]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);

        let found = locate_entry_point(&memory).unwrap();
        assert_eq!(found.kind, EntryPointKind::Smbios3);
        assert_eq!(found.anchor(), b"_SM3_");
        assert_eq!(found.address, Address::new(WINDOW + 0x800));

        let locator = Locator::new(LocatorConfig::default().with_search_order(&[EntryPointKind::Smbios2]));
        assert_eq!(locator.locate(&memory).unwrap().kind, EntryPointKind::Smbios2);
    }

    #[test]
    fn test_falls_back_to_32_bit_entry_point() {
        let window = window_with(&[(0x100, &entry_point_21(0x000F_1000, (2, 8))[..])]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);

        assert_eq!(locate_entry_point(&memory).unwrap().kind, EntryPointKind::Smbios2);
    }

    #[test]
    fn test_dmi_anchor_requirement() {
        let mut entry_point = entry_point_21(0x000F_1000, (2, 8));
        entry_point[0x10..0x15].copy_from_slice(&[0u8; 5]);
        entry_point[0x04] = 0;
        entry_point[0x04] = 0u8.wrapping_sub(checksum(&entry_point));
        let window = window_with(&[(0x100, &entry_point[..])]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);

        assert!(locate_entry_point(&memory).is_ok());

        let strict = Locator::new(LocatorConfig::default().with_dmi_anchor_required(true));
        assert_eq!(strict.locate(&memory), Err(LocateError::NotFound));

        let window = window_with(&[(0x100, &entry_point_21(0x000F_1000, (2, 8))[..])]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);
        assert!(strict.locate(&memory).is_ok());
    }

    #[test]
    fn test_uefi_entry_point_is_tried_first() {
        // Memory covers 0xE0000..0x100000; the published entry point sits below the window.
        let mut memory_bytes = vec![0u8; 0x20000];
        let published = entry_point_30(0x7F00_0000);
        memory_bytes[0x40..0x40 + published.len()].copy_from_slice(&published);
        let scanned = entry_point_30(0x000F_1000);
        memory_bytes[0x10100..0x10100 + scanned.len()].copy_from_slice(&scanned);
        let memory = SliceMemory::new(Address::new(0xE0000), &memory_bytes);

        let config = LocatorConfig::default().with_uefi_entry_point(EntryPointKind::Smbios3, Address::new(0xE0040));
        let found = Locator::new(config).locate(&memory).unwrap();
        assert_eq!(found.address, Address::new(0xE0040));
        assert_eq!(found.table_address, Address::new(0x7F00_0000));

        // An invalid published address falls back to the scan.
        let config = LocatorConfig::default().with_uefi_entry_point(EntryPointKind::Smbios3, Address::new(0xE1000));
        let found = Locator::new(config).locate(&memory).unwrap();
        assert_eq!(found.address, Address::new(0xF0100));
    }

    #[test]
    fn test_unreadable_memory_is_not_found() {
        let memory = SliceMemory::new(Address::new(0x1000), &[]);
        assert_eq!(locate_entry_point(&memory), Err(LocateError::NotFound));

        // Anchor in the last paragraph of a snapshot that ends before the entry point does.
        let entry_point = entry_point_21(0x000F_1000, (2, 8));
        let mut window = vec![0u8; 0x110];
        window[0x100..0x110].copy_from_slice(&entry_point[..0x10]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);
        assert_eq!(locate_entry_point(&memory), Err(LocateError::NotFound));
    }

    #[test]
    fn test_custom_search_window() {
        let window = window_with(&[(0x100, &entry_point_21(0x000F_1000, (2, 8))[..])]);
        let memory = SliceMemory::new(Address::new(WINDOW), &window);

        let narrow = Locator::new(LocatorConfig::default().with_search_window(WINDOW + 0x200, 0x1000));
        assert_eq!(narrow.locate(&memory), Err(LocateError::NotFound));

        // An unaligned base is rounded up to the next paragraph.
        let shifted = Locator::new(LocatorConfig::default().with_search_window(WINDOW + 0xF8, 0x100));
        assert_eq!(shifted.locate(&memory).unwrap().address, Address::new(WINDOW + 0x100));

        // The anchor must fit inside the window.
        let clipped = Locator::new(LocatorConfig::default().with_search_window(WINDOW + 0x100, 0x3));
        assert_eq!(clipped.locate(&memory), Err(LocateError::NotFound));
    }

    #[test]
    fn test_default_scan_covers_window_on_paragraphs() {
        let locator = Locator::default();
        for kind in [EntryPointKind::Smbios2, EntryPointKind::Smbios3] {
            let addresses: Vec<_> = locator.scan_addresses(kind).collect();
            assert_eq!(addresses.len(), 0x1000);
            assert_eq!(addresses.first(), Some(&Address::new(0xF0000)));
            assert_eq!(addresses.last(), Some(&Address::new(0xFFFF0)));
            assert!(addresses.iter().all(|address| address.is_aligned(16)));
        }
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0xF0000, 16), Some(0xF0000));
        assert_eq!(align_up(0xF0001, 16), Some(0xF0010));
        assert_eq!(align_up(u64::MAX, 16), None);
    }
}
