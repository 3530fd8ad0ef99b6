//! Turning a generic action into native command lines and running them.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};

use duct::cmd;
use serde::Serialize;

use crate::common::shell::shell_quote;
use crate::error::{DerpkgError, EXIT_FAILURE};
use crate::ui::prelude::*;

use super::detect::Selection;
use super::manager::ConfirmFlag;
use super::search;
use super::{Action, CommandTable, PackageManager, Step};

static CHILD_RUNNING: AtomicBool = AtomicBool::new(false);

/// True while a native command is in the foreground.
pub fn child_running() -> bool {
    CHILD_RUNNING.load(Ordering::SeqCst)
}

struct ChildGuard;

impl ChildGuard {
    fn enter() -> Self {
        CHILD_RUNNING.store(true, Ordering::SeqCst);
        ChildGuard
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        CHILD_RUNNING.store(false, Ordering::SeqCst);
    }
}

/// A concrete native command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    fn from_argv(mut argv: Vec<String>) -> Self {
        let program = argv.remove(0);
        Self {
            program,
            args: argv,
        }
    }

    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let quoted: Vec<String> = self.argv().into_iter().map(shell_quote).collect();
        f.write_str(&quoted.join(" "))
    }
}

/// Output of a command whose stdout was captured instead of streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub code: i32,
    pub stdout: String,
}

/// Runs invocations. Stdio is inherited for `run`.
pub trait Executor {
    /// Run to completion and return the exit code.
    fn run(&self, invocation: &Invocation) -> Result<i32, DerpkgError>;

    /// Run with stdout captured; stderr still goes to the terminal.
    fn capture(&self, invocation: &Invocation) -> Result<Captured, DerpkgError>;
}

pub struct DuctExecutor;

impl Executor for DuctExecutor {
    fn run(&self, invocation: &Invocation) -> Result<i32, DerpkgError> {
        let _guard = ChildGuard::enter();
        let output = cmd(invocation.program.as_str(), &invocation.args)
            .unchecked()
            .run()
            .map_err(|source| spawn_error(invocation, source))?;
        Ok(status_code(output.status))
    }

    fn capture(&self, invocation: &Invocation) -> Result<Captured, DerpkgError> {
        let _guard = ChildGuard::enter();
        let output = cmd(invocation.program.as_str(), &invocation.args)
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|source| spawn_error(invocation, source))?;
        Ok(Captured {
            code: status_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

fn spawn_error(invocation: &Invocation, source: std::io::Error) -> DerpkgError {
    DerpkgError::Spawn {
        program: invocation.program.clone(),
        source,
    }
}

/// Exit code as a shell would report it: signals become `128 + signal`.
fn status_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(EXIT_FAILURE)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// Pass the manager's non-interactive flag to mutating actions.
    pub assume_yes: bool,
    /// Prefix privileged managers with `sudo`.
    pub use_sudo: bool,
    /// Print the plan instead of running it.
    pub dry_run: bool,
}

pub struct Dispatcher<'a, E: Executor> {
    table: &'a CommandTable,
    executor: &'a E,
    options: DispatchOptions,
}

impl<'a, E: Executor> Dispatcher<'a, E> {
    pub fn new(table: &'a CommandTable, executor: &'a E, options: DispatchOptions) -> Self {
        Self {
            table,
            executor,
            options,
        }
    }

    /// Resolve an action into the invocations it runs, without running them.
    pub fn plan(
        &self,
        selection: &Selection,
        action: Action,
        packages: &[String],
    ) -> Result<Vec<Invocation>, DerpkgError> {
        let steps = self
            .table
            .steps(selection.manager, action)
            .ok_or_else(|| DerpkgError::UnsupportedAction {
                manager: selection.manager,
                action,
                supported: self.table.supported_actions(selection.manager),
            })?;

        if action.takes_packages() {
            validate_packages(action, packages)?;
        }

        Ok(steps
            .iter()
            .map(|step| self.build(selection, action, step, packages))
            .collect())
    }

    fn build(
        &self,
        selection: &Selection,
        action: Action,
        step: &Step,
        packages: &[String],
    ) -> Invocation {
        let manager = selection.manager;
        let mut argv = step.argv.clone();

        // Templates name the binary; run the one the detector found.
        if let Some(program) = argv.first_mut()
            && program == manager.binary()
        {
            *program = selection.path.to_string_lossy().into_owned();
        }

        if self.options.assume_yes && action.mutates() {
            match manager.confirm_flag() {
                ConfirmFlag::Append(flag) => argv.push(flag.to_string()),
                ConfirmFlag::Global(flag) => argv.insert(argv.len().min(1), flag.to_string()),
            }
        }

        if step.with_packages {
            argv.extend(packages.iter().cloned());
        }

        if self.options.use_sudo && manager.needs_privileges() && action.mutates() {
            argv.insert(0, "sudo".to_string());
        }

        Invocation::from_argv(argv)
    }

    /// Run an action and return the exit code to relay.
    ///
    /// Steps run in order; the first non-zero exit stops the plan and is
    /// returned as-is.
    pub fn dispatch(
        &self,
        selection: &Selection,
        action: Action,
        packages: &[String],
    ) -> Result<i32, DerpkgError> {
        let plan = self.plan(selection, action, packages)?;

        if self.options.dry_run {
            print_dry_run(&plan);
            return Ok(0);
        }

        header(&heading(action, selection.manager, packages));
        for invocation in &plan {
            emit(
                Level::Info,
                "dispatch.running",
                &format!("> Running: {invocation}"),
                serde_json::to_value(invocation).ok(),
            );
            let code = self.executor.run(invocation)?;
            if code != 0 {
                emit(
                    Level::Error,
                    "dispatch.failed",
                    &format!("Command failed with exit code {code}"),
                    Some(serde_json::json!({ "exit_code": code })),
                );
                return Ok(code);
            }
        }

        emit(
            Level::Success,
            "dispatch.completed",
            &format!("{} completed", capitalize(action.as_str())),
            None,
        );
        Ok(0)
    }

    /// Search with the native output captured and rendered as a table.
    pub fn search_pretty(
        &self,
        selection: &Selection,
        packages: &[String],
    ) -> Result<i32, DerpkgError> {
        if self.options.dry_run {
            return self.dispatch(selection, Action::Search, packages);
        }

        let plan = self.plan(selection, Action::Search, packages)?;
        header(&heading(Action::Search, selection.manager, packages));

        let mut stdout = String::new();
        for invocation in &plan {
            emit(
                Level::Debug,
                "search.running",
                &format!("Running: {invocation}"),
                None,
            );
            let captured = self.executor.capture(invocation)?;
            if captured.code != 0 {
                emit(
                    Level::Error,
                    "search.failed",
                    &format!("Search failed with exit code {}", captured.code),
                    None,
                );
                return Ok(captured.code);
            }
            stdout.push_str(&captured.stdout);
        }

        let installed = if selection.manager == PackageManager::Flatpak {
            self.installed_flatpaks(selection)
        } else {
            Vec::new()
        };

        let hits = search::parse(selection.manager, &stdout, &installed);
        if hits.is_empty() {
            if stdout.trim().is_empty() {
                emit(Level::Warn, "search.empty", "No packages found", None);
            } else {
                print!("{stdout}");
            }
        } else {
            search::render(&hits);
        }
        Ok(0)
    }

    /// Application IDs of installed flatpaks. Failures just mean no markers.
    fn installed_flatpaks(&self, selection: &Selection) -> Vec<String> {
        let invocation = Invocation {
            program: selection.path.to_string_lossy().into_owned(),
            args: vec![
                "list".into(),
                "--app".into(),
                "--columns=application".into(),
            ],
        };
        match self.executor.capture(&invocation) {
            Ok(captured) if captured.code == 0 => captured
                .stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn validate_packages(action: Action, packages: &[String]) -> Result<(), DerpkgError> {
    if packages.is_empty() {
        return Err(DerpkgError::MissingPackages(action));
    }
    if let Some(bad) = packages.iter().find(|p| p.trim().is_empty()) {
        return Err(DerpkgError::InvalidPackage(bad.clone()));
    }
    Ok(())
}

fn print_dry_run(plan: &[Invocation]) {
    for invocation in plan {
        emit(
            Level::Info,
            "dispatch.dry_run",
            &format!("[DRY RUN] {invocation}"),
            serde_json::to_value(invocation).ok(),
        );
    }
}

fn heading(action: Action, manager: PackageManager, packages: &[String]) -> String {
    if packages.is_empty() || !action.takes_packages() {
        format!("{} using {}", capitalize(action.as_str()), manager)
    } else {
        format!(
            "{} {} using {}",
            capitalize(action.as_str()),
            packages.join(", "),
            manager
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
