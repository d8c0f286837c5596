//! SMBIOS Discovery
//!
//! Locates the System Management BIOS entry point in firmware memory and walks
//! the structure table it describes. Memory is reached only through a
//! [`MemoryReader`], so the same code runs against live physical memory during
//! boot and against a captured snapshot in tests or host tools.
//!
//! ```rust,ignore
//! use smbios_discovery::{locate_entry_point, find_structure, WalkerConfig, SMBIOS_TYPE_SYSTEM_INFORMATION};
//!
//! let entry_point = locate_entry_point(&memory)?;
//! let table = entry_point.structure_table(&WalkerConfig::default());
//! if let Some(handle) = find_structure(&memory, &table, SMBIOS_TYPE_SYSTEM_INFORMATION) {
//!     log::info!("SMBIOS {} system information handle {handle:#06x}", entry_point.version);
//! }
//! ```
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(test)]
use smbios_internal_test_logger as _;

pub mod address;
pub mod config;
pub mod entry_point;
pub mod error;
pub mod locator;
pub mod memory;
pub mod types;
pub mod walker;

pub use address::Address;
pub use config::{LocatorConfig, WalkerConfig};
pub use entry_point::{EntryPoint, EntryPointKind, Revision, SmbiosVersion};
pub use error::{LocateError, MemoryError, WalkError};
pub use locator::{locate_entry_point, Locator};
pub use memory::{IdentityMappedMemory, MemoryReader, SliceMemory};
pub use types::*;
pub use walker::{find_structure, Structure, StructureHeader, StructureTable, StructureWalker, TableLimit};
