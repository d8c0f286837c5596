use colored::Colorize;
use std::{
    env,
    path::{Path, PathBuf},
    process::Command,
};

use crate::DynError;

/// Root of the workspace, one level above this crate.
pub(crate) fn project_root() -> Result<PathBuf, DynError> {
    Ok(Path::new(env!("CARGO_MANIFEST_DIR")).parent().ok_or("xtask is not inside the workspace")?.to_path_buf())
}

pub(crate) fn target_dir() -> Result<PathBuf, DynError> {
    Ok(project_root()?.join("target"))
}

/// One cargo command run from the workspace root.
pub(crate) struct Cargo<'a> {
    label: &'a str,
    args: Vec<String>,
    envs: Vec<(&'a str, &'a str)>,
    passthrough: bool,
}

impl<'a> Cargo<'a> {
    pub(crate) fn new(label: &'a str, args: &[&str]) -> Self {
        Self { label, args: args.iter().map(|arg| arg.to_string()).collect(), envs: Vec::new(), passthrough: true }
    }

    pub(crate) fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn env(mut self, key: &'a str, value: &'a str) -> Self {
        self.envs.push((key, value));
        self
    }

    /// Do not forward the extra command line arguments given to the task.
    pub(crate) fn without_passthrough(mut self) -> Self {
        self.passthrough = false;
        self
    }

    pub(crate) fn run(self) -> Result<(), DynError> {
        println!("─────────────────────────────────");
        println!("{}", format!("🚀 Running: {}", self.label).bright_green());

        let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        let mut command = Command::new(cargo);
        command.current_dir(project_root()?).args(&self.args).envs(self.envs.iter().copied());
        if self.passthrough {
            command.args(env::args().skip(2));
        }

        if !command.status()?.success() {
            Err(format!("❌ Failed: {}", self.label))?;
        }

        println!("{}", format!("✔️    Done: {}", self.label).bright_green());
        Ok(())
    }
}
