//! SMBIOS Standard Constants
//!
//! Structure type and handle values from the DMTF SMBIOS Reference
//! Specification, as far as discovery needs them. The formatted payload of
//! each structure type is not described here.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!

/// Types 0 through 127 (7Fh) are reserved for and defined by the SMBIOS
/// specification. Types 128 through 255 (80h to FFh) are available for system-
/// and OEM-specific information.
pub type SmbiosType = u8;

/// Specifies the structure's handle, a unique 16-bit number in the range 0 to
/// 0FEFFh (for version 2.1 and later). The handle numbers are not required to
/// be contiguous or sorted.
pub type SmbiosHandle = u16;

/// Size of the header at the start of every structure: type, length, handle.
pub const SMBIOS_STRUCTURE_HEADER_LENGTH: u8 = 4;

/// For v2.1 and later, handle values in the range 0FF00h to 0FFFFh are reserved.
pub const SMBIOS_HANDLE_RESERVED_BEGIN: SmbiosHandle = 0xFF00;

// Structure types defined by the SMBIOS Reference Specification, chapter 7.
pub const SMBIOS_TYPE_BIOS_INFORMATION: SmbiosType = 0;
pub const SMBIOS_TYPE_SYSTEM_INFORMATION: SmbiosType = 1;
pub const SMBIOS_TYPE_BASEBOARD_INFORMATION: SmbiosType = 2;
pub const SMBIOS_TYPE_SYSTEM_ENCLOSURE: SmbiosType = 3;
pub const SMBIOS_TYPE_PROCESSOR_INFORMATION: SmbiosType = 4;
/// Obsolete since 2.1.
pub const SMBIOS_TYPE_MEMORY_CONTROLLER_INFORMATION: SmbiosType = 5;
/// Obsolete since 2.1.
pub const SMBIOS_TYPE_MEMORY_MODULE_INFORMATION: SmbiosType = 6;
pub const SMBIOS_TYPE_CACHE_INFORMATION: SmbiosType = 7;
pub const SMBIOS_TYPE_PORT_CONNECTOR_INFORMATION: SmbiosType = 8;
pub const SMBIOS_TYPE_SYSTEM_SLOTS: SmbiosType = 9;
/// Obsolete since 2.6, superseded by type 41.
pub const SMBIOS_TYPE_ONBOARD_DEVICE_INFORMATION: SmbiosType = 10;
pub const SMBIOS_TYPE_OEM_STRINGS: SmbiosType = 11;
pub const SMBIOS_TYPE_SYSTEM_CONFIGURATION_OPTIONS: SmbiosType = 12;
pub const SMBIOS_TYPE_BIOS_LANGUAGE_INFORMATION: SmbiosType = 13;
pub const SMBIOS_TYPE_GROUP_ASSOCIATIONS: SmbiosType = 14;
pub const SMBIOS_TYPE_SYSTEM_EVENT_LOG: SmbiosType = 15;
pub const SMBIOS_TYPE_PHYSICAL_MEMORY_ARRAY: SmbiosType = 16;
pub const SMBIOS_TYPE_MEMORY_DEVICE: SmbiosType = 17;
pub const SMBIOS_TYPE_32BIT_MEMORY_ERROR_INFORMATION: SmbiosType = 18;
pub const SMBIOS_TYPE_MEMORY_ARRAY_MAPPED_ADDRESS: SmbiosType = 19;
pub const SMBIOS_TYPE_MEMORY_DEVICE_MAPPED_ADDRESS: SmbiosType = 20;
pub const SMBIOS_TYPE_BUILT_IN_POINTING_DEVICE: SmbiosType = 21;
pub const SMBIOS_TYPE_PORTABLE_BATTERY: SmbiosType = 22;
pub const SMBIOS_TYPE_SYSTEM_RESET: SmbiosType = 23;
pub const SMBIOS_TYPE_HARDWARE_SECURITY: SmbiosType = 24;
pub const SMBIOS_TYPE_SYSTEM_POWER_CONTROLS: SmbiosType = 25;
pub const SMBIOS_TYPE_VOLTAGE_PROBE: SmbiosType = 26;
pub const SMBIOS_TYPE_COOLING_DEVICE: SmbiosType = 27;
pub const SMBIOS_TYPE_TEMPERATURE_PROBE: SmbiosType = 28;
pub const SMBIOS_TYPE_ELECTRICAL_CURRENT_PROBE: SmbiosType = 29;
pub const SMBIOS_TYPE_OUT_OF_BAND_REMOTE_ACCESS: SmbiosType = 30;
pub const SMBIOS_TYPE_BOOT_INTEGRITY_SERVICE: SmbiosType = 31;
pub const SMBIOS_TYPE_SYSTEM_BOOT_INFORMATION: SmbiosType = 32;
pub const SMBIOS_TYPE_64BIT_MEMORY_ERROR_INFORMATION: SmbiosType = 33;
pub const SMBIOS_TYPE_MANAGEMENT_DEVICE: SmbiosType = 34;
pub const SMBIOS_TYPE_MANAGEMENT_DEVICE_COMPONENT: SmbiosType = 35;
pub const SMBIOS_TYPE_MANAGEMENT_DEVICE_THRESHOLD_DATA: SmbiosType = 36;
pub const SMBIOS_TYPE_MEMORY_CHANNEL: SmbiosType = 37;
pub const SMBIOS_TYPE_IPMI_DEVICE_INFORMATION: SmbiosType = 38;
pub const SMBIOS_TYPE_SYSTEM_POWER_SUPPLY: SmbiosType = 39;
pub const SMBIOS_TYPE_ADDITIONAL_INFORMATION: SmbiosType = 40;
pub const SMBIOS_TYPE_ONBOARD_DEVICES_EXTENDED_INFORMATION: SmbiosType = 41;
pub const SMBIOS_TYPE_MANAGEMENT_CONTROLLER_HOST_INTERFACE: SmbiosType = 42;
pub const SMBIOS_TYPE_TPM_DEVICE: SmbiosType = 43;
pub const SMBIOS_TYPE_PROCESSOR_ADDITIONAL_INFORMATION: SmbiosType = 44;
pub const SMBIOS_TYPE_FIRMWARE_INVENTORY_INFORMATION: SmbiosType = 45;
pub const SMBIOS_TYPE_STRING_PROPERTY_INFORMATION: SmbiosType = 46;

/// Upper-level software that interprets the structure table should bypass an
/// Inactive structure just like a structure type it does not recognize.
pub const SMBIOS_TYPE_INACTIVE: SmbiosType = 126;

/// The end-of-table indicator is used in the last physical structure in a table.
pub const SMBIOS_TYPE_END_OF_TABLE: SmbiosType = 127;

/// First OEM-specific structure type.
pub const SMBIOS_OEM_BEGIN: SmbiosType = 128;

/// Whether `structure_type` lies in the system/OEM specific range.
pub const fn is_oem_type(structure_type: SmbiosType) -> bool {
    structure_type >= SMBIOS_OEM_BEGIN
}

/// Whether `handle` is usable by a structure, i.e. outside the reserved range.
pub const fn is_valid_handle(handle: SmbiosHandle) -> bool {
    handle < SMBIOS_HANDLE_RESERVED_BEGIN
}
