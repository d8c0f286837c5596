use colored::Colorize;

use crate::{
    cargo::{target_dir, Cargo},
    DynError,
};

/// Library crates that must also build without `std`.
const NO_STD_CRATES: &[&str] = &["smbios_discovery", "smbios_bcd"];

pub(crate) fn test() -> Result<(), DynError> {
    Cargo::new("cargo test", &["nextest", "run", "--workspace"]).env("RUSTC_BOOTSTRAP", "1").run()
}

pub(crate) fn doctest() -> Result<(), DynError> {
    Cargo::new("cargo test --doc", &["test", "--doc", "--workspace"]).run()
}

pub(crate) fn clippy() -> Result<(), DynError> {
    Cargo::new("cargo clippy", &["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"])
        .env("RUSTC_BOOTSTRAP", "1")
        .run()
}

pub(crate) fn format() -> Result<(), DynError> {
    Cargo::new("cargo fmt", &["fmt", "--all"]).run()
}

pub(crate) fn coverage() -> Result<(), DynError> {
    let output = target_dir()?;
    let output = output.to_str().unwrap_or("./target");

    Cargo::new(
        "cargo coverage",
        &[
            "tarpaulin",
            "--workspace",
            "--out",
            "html",
            "--out",
            "xml",
            "--exclude-files",
            "**/tests/*",
            "--exclude",
            "xtask",
            "--exclude",
            "smbios_internal_test_logger",
            "--output-dir",
        ],
    )
    .arg(output)
    .env("RUSTC_BOOTSTRAP", "1")
    .run()
}

/// Checks the library crates against a UEFI target without `std`, then the whole workspace on the host.
pub(crate) fn check() -> Result<(), DynError> {
    let target = match std::env::consts::ARCH {
        "aarch64" => "aarch64-unknown-uefi",
        _ => "x86_64-unknown-uefi",
    };

    let mut no_std = Cargo::new(
        "cargo check (no_std)",
        &[
            "check",
            "--target",
            target,
            "-Zbuild-std=core,compiler_builtins",
            "-Zbuild-std-features=compiler-builtins-mem",
        ],
    )
    .env("RUSTC_BOOTSTRAP", "1")
    .without_passthrough();
    for krate in NO_STD_CRATES {
        no_std = no_std.arg("-p").arg(*krate);
    }
    no_std.run()?;

    Cargo::new("cargo check (std)", &["check", "--workspace", "--all-features"]).run()
}

pub(crate) fn docs() -> Result<(), DynError> {
    Cargo::new("cargo doc", &["doc", "--no-deps", "--workspace", "--exclude", "xtask"])
        .env("RUSTDOCFLAGS", "-D warnings")
        .run()
}

pub(crate) fn all() -> Result<(), DynError> {
    println!("\n{}", "🚀 Running: all tasks".bright_green());

    clippy()?;
    check()?;
    test()?;
    doctest()?;
    coverage()?;
    format()?;
    docs()?;

    Ok(())
}
