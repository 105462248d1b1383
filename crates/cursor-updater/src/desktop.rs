//! Desktop launcher integration.
//!
//! Only the `Exec` key of the launcher is managed. A missing launcher is
//! created from [`LauncherTemplate`]; an existing one keeps every other byte,
//! whatever its encoding.

use std::fs;
use std::path::Path;

use crate::config::LauncherTemplate;
use crate::error::{Result, UpdateError};

/// What [`reconcile`] did to the launcher file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// The launcher did not exist and was written from the template.
    Created,
    /// The `Exec` line was replaced or appended.
    Updated,
    /// The launcher already pointed at the executable.
    Unchanged,
}

impl ReconcileAction {
    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Makes the launcher at `launcher_path` start `exec_path`.
///
/// Running this twice with the same arguments leaves byte-identical content.
pub fn reconcile(
    launcher_path: &Path,
    exec_path: &Path,
    template: &LauncherTemplate,
) -> Result<ReconcileAction> {
    let fail = |e: std::io::Error| UpdateError::DesktopIntegrationFailed {
        path: launcher_path.to_path_buf(),
        reason: e.to_string(),
    };

    let exec_line = exec_line(exec_path, template);

    if !launcher_path.exists() {
        if let Some(parent) = launcher_path.parent() {
            fs::create_dir_all(parent).map_err(fail)?;
        }
        fs::write(launcher_path, render_template(&exec_line, template)).map_err(fail)?;
        return Ok(ReconcileAction::Created);
    }

    let current = fs::read(launcher_path).map_err(fail)?;
    let patched = patch_exec(&current, exec_line.as_bytes());

    if patched == current {
        return Ok(ReconcileAction::Unchanged);
    }

    fs::write(launcher_path, patched).map_err(fail)?;
    Ok(ReconcileAction::Updated)
}

/// The managed `Exec=` line, without a line terminator.
#[must_use]
pub fn exec_line(exec_path: &Path, template: &LauncherTemplate) -> String {
    if template.exec_args.is_empty() {
        format!("Exec={}", exec_path.display())
    } else {
        format!("Exec={} {}", exec_path.display(), template.exec_args)
    }
}

fn render_template(exec_line: &str, template: &LauncherTemplate) -> String {
    format!(
        "[Desktop Entry]\n\
         Version=1.0\n\
         Type=Application\n\
         Name={}\n\
         Comment={}\n\
         {}\n\
         Icon={}\n\
         Terminal=false\n\
         Categories={}\n\
         StartupWMClass={}\n",
        template.name,
        template.comment,
        exec_line,
        template.icon,
        template.categories,
        template.startup_wm_class,
    )
}

/// Replaces the first `Exec` line of `content`, or appends one.
fn patch_exec(content: &[u8], exec_line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + exec_line.len() + 1);
    let mut replaced = false;

    for line in content.split_inclusive(|&b| b == b'\n') {
        if !replaced && is_exec_key(line) {
            let body_len = line
                .iter()
                .rposition(|&b| b != b'\r' && b != b'\n')
                .map_or(0, |i| i + 1);
            out.extend_from_slice(exec_line);
            out.extend_from_slice(&line[body_len..]);
            replaced = true;
        } else {
            out.extend_from_slice(line);
        }
    }

    if !replaced {
        if out.last().is_some_and(|&b| b != b'\n') {
            out.push(b'\n');
        }
        out.extend_from_slice(exec_line);
        out.push(b'\n');
    }

    out
}

fn is_exec_key(line: &[u8]) -> bool {
    line.iter()
        .position(|&b| b == b'=')
        .is_some_and(|eq| line[..eq].trim_ascii() == b"Exec")
}
