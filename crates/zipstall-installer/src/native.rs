use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use zipstall_core::RawExecutableMetadata;

use crate::collaborators::{
    MetadataReader, RegistrationDescriptor, SelfDeleteRequest, SelfDeleteScheduler,
    ShortcutDescriptor, ShortcutKind, ShortcutManager, SystemRegistrar,
};

const UNINSTALL_REGISTRY_KEY: &str =
    r"HKCU\Software\Microsoft\Windows\CurrentVersion\Uninstall";
const SELF_DELETE_MAX_WAIT_SECS: u32 = 30;

pub(crate) fn run_command(command: &mut Command, context_message: &str) -> Result<()> {
    let output = command
        .output()
        .with_context(|| format!("{context_message}: command failed to start"))?;
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    Err(anyhow!(
        "{context_message}: status={} stdout='{}' stderr='{}'",
        output.status,
        stdout.trim(),
        stderr.trim()
    ))
}

fn run_command_capture(command: &mut Command, context_message: &str) -> Result<String> {
    let output = command
        .output()
        .with_context(|| format!("{context_message}: command failed to start"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "{context_message}: status={} stderr='{}'",
            output.status,
            stderr.trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn escape_ps_single_quote(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}

fn escape_sh_single_quote(path: &Path) -> String {
    path.display().to_string().replace('\'', r"'\''")
}

fn shortcut_link_path(descriptor: &ShortcutDescriptor) -> Result<PathBuf> {
    let folder = match descriptor.kind {
        ShortcutKind::Desktop => {
            let profile = std::env::var("USERPROFILE")
                .context("USERPROFILE is not set; cannot resolve the desktop folder")?;
            PathBuf::from(profile).join("Desktop")
        }
        ShortcutKind::StartMenu => {
            let app_data = std::env::var("APPDATA")
                .context("APPDATA is not set; cannot resolve the start menu folder")?;
            PathBuf::from(app_data)
                .join("Microsoft")
                .join("Windows")
                .join("Start Menu")
                .join("Programs")
        }
    };
    Ok(folder.join(format!("{}.lnk", descriptor.app_name)))
}

/// Best-effort shortcut integration via the shell's scripting interface.
/// Skipped with a debug log on hosts without one.
pub struct SystemShortcutManager;

impl ShortcutManager for SystemShortcutManager {
    fn apply(&self, descriptor: &ShortcutDescriptor) -> Result<()> {
        if !cfg!(windows) {
            tracing::debug!(
                kind = descriptor.kind.as_str(),
                "shortcut integration skipped on this platform"
            );
            return Ok(());
        }

        let link = shortcut_link_path(descriptor)?;
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let icon = descriptor
            .icon
            .clone()
            .unwrap_or_else(|| descriptor.target.display().to_string());
        let script = format!(
            "$shell = New-Object -ComObject WScript.Shell; \
             $link = $shell.CreateShortcut('{}'); \
             $link.TargetPath = '{}'; \
             $link.WorkingDirectory = '{}'; \
             $link.IconLocation = '{}'; \
             $link.Save()",
            escape_ps_single_quote(&link),
            escape_ps_single_quote(&descriptor.target),
            escape_ps_single_quote(&descriptor.working_dir),
            icon.replace('\'', "''"),
        );
        run_command(
            Command::new("powershell")
                .arg("-NoProfile")
                .arg("-Command")
                .arg(script),
            "failed to create shortcut",
        )
    }

    fn remove(&self, descriptor: &ShortcutDescriptor) -> Result<()> {
        if !cfg!(windows) {
            return Ok(());
        }
        let link = shortcut_link_path(descriptor)?;
        crate::fs_utils::remove_file_if_exists(&link)
            .with_context(|| format!("failed to remove shortcut: {}", link.display()))
    }
}

/// Writes the add/remove-programs registration through the `reg` tool.
pub struct CommandRegistrar;

impl CommandRegistrar {
    fn key_for(app_name: &str) -> String {
        format!("{UNINSTALL_REGISTRY_KEY}\\{app_name}")
    }

    fn add_string_value(key: &str, name: &str, value: &str) -> Result<()> {
        run_command(
            Command::new("reg")
                .args(["add", key, "/v", name, "/t", "REG_SZ", "/d", value, "/f"]),
            "failed to write registry value",
        )
    }

    fn add_dword_value(key: &str, name: &str, value: u64) -> Result<()> {
        run_command(
            Command::new("reg").args([
                "add",
                key,
                "/v",
                name,
                "/t",
                "REG_DWORD",
                "/d",
                &value.to_string(),
                "/f",
            ]),
            "failed to write registry value",
        )
    }
}

impl SystemRegistrar for CommandRegistrar {
    fn apply(&self, descriptor: &RegistrationDescriptor) -> Result<()> {
        if !cfg!(windows) {
            tracing::debug!(app = %descriptor.app_name, "system registration skipped on this platform");
            return Ok(());
        }

        let key = Self::key_for(&descriptor.app_name);
        Self::add_string_value(&key, "DisplayName", &descriptor.display_name)?;
        Self::add_string_value(&key, "DisplayVersion", &descriptor.display_version)?;
        Self::add_string_value(&key, "Publisher", &descriptor.publisher)?;
        Self::add_string_value(
            &key,
            "InstallLocation",
            &descriptor.install_location.display().to_string(),
        )?;
        if let Some(icon) = &descriptor.icon {
            Self::add_string_value(&key, "DisplayIcon", icon)?;
        }
        if let Some(size_kib) = descriptor.estimated_size_kib {
            Self::add_dword_value(&key, "EstimatedSize", size_kib)?;
        }
        if let Some(command) = &descriptor.uninstall_command {
            Self::add_string_value(&key, "UninstallString", command)?;
        }
        Self::add_dword_value(&key, "NoModify", 1)?;
        Self::add_dword_value(&key, "NoRepair", 1)?;
        Ok(())
    }

    fn remove(&self, app_name: &str) -> Result<()> {
        if !cfg!(windows) {
            return Ok(());
        }
        run_command(
            Command::new("reg").args(["delete", &Self::key_for(app_name), "/f"]),
            "failed to delete registry key",
        )
    }
}

/// Schedules deferred removal of the running uninstaller through a detached
/// script: wait for the process to exit (bounded, then proceed anyway),
/// delete the binary, remove the install location if it ended up empty,
/// delete the script itself. Only "scheduled" is observable from here.
pub struct ScriptSelfDeleteScheduler;

impl SelfDeleteScheduler for ScriptSelfDeleteScheduler {
    fn schedule(&self, request: &SelfDeleteRequest) -> Result<()> {
        let pid = std::process::id();
        if cfg!(windows) {
            let script_path =
                std::env::temp_dir().join(format!("zipstall_selfdelete_{pid}.bat"));
            let exe = request.executable.display().to_string();
            let dir = request.install_location.display().to_string();
            let script = format!(
                "@echo off\r\n\
                 set tries=0\r\n\
                 :repeat\r\n\
                 del /f /q \"{exe}\"\r\n\
                 if not exist \"{exe}\" goto removed\r\n\
                 set /a tries+=1\r\n\
                 if %tries% geq {SELF_DELETE_MAX_WAIT_SECS} goto removed\r\n\
                 timeout /t 1 /nobreak > nul\r\n\
                 goto repeat\r\n\
                 :removed\r\n\
                 rmdir \"{dir}\" 2> nul\r\n\
                 del /f /q \"%~f0\"\r\n"
            );
            fs::write(&script_path, script).with_context(|| {
                format!("failed to write self-delete script: {}", script_path.display())
            })?;
            Command::new("cmd")
                .arg("/c")
                .arg(&script_path)
                .spawn()
                .context("failed to launch the self-delete script")?;
        } else {
            let script_path = std::env::temp_dir().join(format!("zipstall_selfdelete_{pid}.sh"));
            let exe = escape_sh_single_quote(&request.executable);
            let dir = escape_sh_single_quote(&request.install_location);
            let script = format!(
                "#!/bin/sh\n\
                 tries=0\n\
                 while kill -0 {pid} 2>/dev/null; do\n\
                 \ttries=$((tries+1))\n\
                 \t[ \"$tries\" -ge {SELF_DELETE_MAX_WAIT_SECS} ] && break\n\
                 \tsleep 1\n\
                 done\n\
                 rm -f '{exe}'\n\
                 rmdir '{dir}' 2>/dev/null\n\
                 rm -f \"$0\"\n"
            );
            fs::write(&script_path, script).with_context(|| {
                format!("failed to write self-delete script: {}", script_path.display())
            })?;
            Command::new("sh")
                .arg(&script_path)
                .spawn()
                .context("failed to launch the self-delete script")?;
        }

        tracing::debug!(executable = %request.executable.display(), "self-delete scheduled");
        Ok(())
    }
}

/// Probes version/publisher/product fields through the shell's file
/// metadata surface. Fields the host cannot produce come back absent; only
/// an unreadable file is an error.
pub struct SystemMetadataReader;

impl MetadataReader for SystemMetadataReader {
    fn read(&self, executable: &Path) -> Result<RawExecutableMetadata> {
        if !executable.exists() {
            return Err(anyhow!("file not found: {}", executable.display()));
        }
        if !cfg!(windows) {
            return Ok(RawExecutableMetadata::default());
        }

        let script = format!(
            "$info = (Get-Item '{}').VersionInfo; \
             Write-Output ('product=' + $info.ProductName); \
             Write-Output ('version=' + $info.FileVersion); \
             Write-Output ('publisher=' + $info.CompanyName)",
            escape_ps_single_quote(executable),
        );
        let output = run_command_capture(
            Command::new("powershell")
                .arg("-NoProfile")
                .arg("-Command")
                .arg(script),
            "failed to read executable metadata",
        )?;

        let mut metadata = RawExecutableMetadata::default();
        for line in output.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key {
                "product" => metadata.product_name = Some(value.to_string()),
                "version" => metadata.file_version = Some(value.to_string()),
                "publisher" => metadata.publisher = Some(value.to_string()),
                _ => {}
            }
        }
        metadata.icon = Some(format!("{},0", executable.display()));
        Ok(metadata)
    }
}

impl crate::collaborators::Collaborators {
    /// The command-based system collaborators for this host.
    pub fn native() -> Self {
        Self {
            shortcuts: Box::new(SystemShortcutManager),
            registrar: Box::new(CommandRegistrar),
            self_delete: Box::new(ScriptSelfDeleteScheduler),
        }
    }
}
