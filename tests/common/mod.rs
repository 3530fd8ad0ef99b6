use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fake host: a `bin/` directory that becomes the whole `PATH`, fake
/// package manager scripts that log their argv, and a config file that
/// disables the fallback directory probing.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        fs::create_dir_all(temp_dir.path().join("bin"))?;

        let env = Self { temp_dir };
        env.write_config("")?;
        env.write_script("sudo", "exec \"$@\"\n")?;
        Ok(env)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path().join("bin")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.path().join("calls.log")
    }

    /// Install a fake manager that records `name args...` and exits with `code`.
    pub fn add_manager(&self, name: &str, code: i32) -> Result<()> {
        self.add_manager_running(name, &format!("exit {code}\n"))
    }

    /// Install a fake manager that records its call, then runs `body`.
    pub fn add_manager_running(&self, name: &str, body: &str) -> Result<()> {
        let script = format!(
            "printf '%s %s\\n' \"${{0##*/}}\" \"$*\" >> '{}'\n{}",
            self.log_path().display(),
            body
        );
        self.write_script(name, &script)
    }

    /// Config contents; `fallback_dirs = []` is always prepended so only
    /// the fake `PATH` is searched.
    pub fn write_config(&self, extra: &str) -> Result<()> {
        fs::write(
            self.config_path(),
            format!("fallback_dirs = []\n{extra}"),
        )?;
        Ok(())
    }

    /// Lines logged by fake managers so far.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    fn write_script(&self, name: &str, body: &str) -> Result<()> {
        let path = self.bin_dir().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(())
    }
}
