//! Discovery Configuration
//!
//! ## Locator Configuration Usage
//!
//! The defaults search the legacy BIOS window for an SMBIOS 3.x entry point
//! first and fall back to SMBIOS 2.x. Platforms booted through UEFI can point
//! the locator at the entry points published in the configuration table.
//!
//! ```rust,ignore
//! let config = smbios_discovery::config::LocatorConfig::default()
//!     .with_configuration_table(system_table.configuration_tables())
//!     .with_dmi_anchor_required(true);
//!
//! let entry_point = smbios_discovery::locator::Locator::new(config).locate(&memory)?;
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use r_efi::efi;

use crate::{address::Address, entry_point::EntryPointKind};

/// SMBIOS Configuration Table GUID: EB9D2D31-2D88-11D3-9A16-0090273FC14D
///
/// Identifies an SMBIOS 2.x (32-bit) entry point in the UEFI Configuration Table.
pub const SMBIOS_TABLE_GUID: efi::Guid =
    efi::Guid::from_fields(0xEB9D2D31, 0x2D88, 0x11D3, 0x9A, 0x16, &[0x00, 0x90, 0x27, 0x3F, 0xC1, 0x4D]);

/// SMBIOS 3.x Configuration Table GUID: F2FD1544-9794-4A2C-992E-E5BBCF20E394
///
/// Identifies an SMBIOS 3.x (64-bit) entry point in the UEFI Configuration Table.
pub const SMBIOS3_TABLE_GUID: efi::Guid =
    efi::Guid::from_fields(0xF2FD1544, 0x9794, 0x4A2C, 0x99, 0x2E, &[0xE5, 0xBB, 0xCF, 0x20, 0xE3, 0x94]);

/// Default: start of the legacy BIOS area.
pub const DEFAULT_SEARCH_BASE: u64 = 0x000F_0000;
/// Default: the 64 KiB window `0xF0000..=0xFFFFF`.
pub const DEFAULT_SEARCH_LENGTH: u64 = 0x0001_0000;
/// Default: prefer the 64-bit entry point, fall back to the 32-bit one.
pub const DEFAULT_SEARCH_ORDER: &[EntryPointKind] = &[EntryPointKind::Smbios3, EntryPointKind::Smbios2];
/// Default: accept 2.x entry points that omit the `_DMI_` intermediate anchor.
pub const DEFAULT_REQUIRE_DMI_ANCHOR: bool = false;
/// Default: walk at most 1 MiB of a table that declares no exact length.
pub const DEFAULT_TABLE_CEILING: u32 = 0x0010_0000;

/// The configuration for the entry point locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorConfig {
    /// First address of the scanned window. An unaligned base is rounded up to the next paragraph.
    pub search_base: u64,
    /// Number of bytes in the scanned window.
    pub search_length: u64,
    /// Entry point kinds to look for, highest priority first.
    pub search_order: &'static [EntryPointKind],
    /// Require the `_DMI_` anchor and intermediate checksum in 2.x entry points.
    pub require_dmi_anchor: bool,
    /// 2.x entry point published by UEFI, checked before the window is scanned.
    pub uefi_entry_point_32: Option<Address>,
    /// 3.x entry point published by UEFI, checked before the window is scanned.
    pub uefi_entry_point_64: Option<Address>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            search_base: DEFAULT_SEARCH_BASE,
            search_length: DEFAULT_SEARCH_LENGTH,
            search_order: DEFAULT_SEARCH_ORDER,
            require_dmi_anchor: DEFAULT_REQUIRE_DMI_ANCHOR,
            uefi_entry_point_32: None,
            uefi_entry_point_64: None,
        }
    }
}

impl LocatorConfig {
    pub const fn with_search_window(mut self, base: u64, length: u64) -> Self {
        self.search_base = base;
        self.search_length = length;
        self
    }

    pub const fn with_search_order(mut self, order: &'static [EntryPointKind]) -> Self {
        self.search_order = order;
        self
    }

    pub const fn with_dmi_anchor_required(mut self, required: bool) -> Self {
        self.require_dmi_anchor = required;
        self
    }

    /// Records the entry point address UEFI published for `kind`.
    pub const fn with_uefi_entry_point(mut self, kind: EntryPointKind, address: Address) -> Self {
        match kind {
            EntryPointKind::Smbios2 => self.uefi_entry_point_32 = Some(address),
            EntryPointKind::Smbios3 => self.uefi_entry_point_64 = Some(address),
        }
        self
    }

    /// Picks the SMBIOS entry points out of a UEFI configuration table.
    pub fn with_configuration_table(mut self, tables: &[efi::ConfigurationTable]) -> Self {
        for table in tables {
            let Some(kind) = entry_point_kind_for_guid(&table.vendor_guid) else {
                continue;
            };
            let address = Address::new(table.vendor_table as usize as u64);
            log::debug!("UEFI configuration table publishes {kind:?} entry point at {address}");
            self = self.with_uefi_entry_point(kind, address);
        }
        self
    }

    /// The UEFI-published address for `kind`, if any.
    pub const fn uefi_entry_point(&self, kind: EntryPointKind) -> Option<Address> {
        match kind {
            EntryPointKind::Smbios2 => self.uefi_entry_point_32,
            EntryPointKind::Smbios3 => self.uefi_entry_point_64,
        }
    }
}

/// Maps a configuration table GUID to the entry point kind it publishes.
pub fn entry_point_kind_for_guid(guid: &efi::Guid) -> Option<EntryPointKind> {
    if *guid == SMBIOS3_TABLE_GUID {
        Some(EntryPointKind::Smbios3)
    } else if *guid == SMBIOS_TABLE_GUID {
        Some(EntryPointKind::Smbios2)
    } else {
        None
    }
}

/// The configuration for the structure table walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Maximum bytes walked for a table without an exact declared length.
    pub table_ceiling: u32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self { table_ceiling: DEFAULT_TABLE_CEILING }
    }
}
