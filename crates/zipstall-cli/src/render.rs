use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};
use zipstall_installer::ProgressEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn detect_output_style(plain_flag: bool) -> OutputStyle {
    if plain_flag || !std::io::stdout().is_terminal() {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

fn status_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn warning_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightYellow.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub fn print_status(style: OutputStyle, status: &str, message: &str) {
    println!("{}", render_status_line(style, status, message));
}

pub fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("{status}: {message}"),
        OutputStyle::Rich => format!("{} {message}", colorize(status_style(), status)),
    }
}

pub fn print_warning(style: OutputStyle, message: &str) {
    match style {
        OutputStyle::Plain => eprintln!("warning: {message}"),
        OutputStyle::Rich => eprintln!("{} {message}", colorize(warning_style(), "warning:")),
    }
}

/// Turns the engine's event stream into terminal output: a live bar for the
/// per-file phases in rich mode, one line per step in plain mode.
pub struct EventRenderer {
    style: OutputStyle,
    bar: Option<ProgressBar>,
    bar_label: &'static str,
}

impl EventRenderer {
    pub fn new(style: OutputStyle) -> Self {
        Self {
            style,
            bar: None,
            bar_label: "",
        }
    }

    pub fn handle(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                operation,
                destination,
            } => {
                print_status(
                    self.style,
                    operation.as_str(),
                    &destination.display().to_string(),
                );
            }
            ProgressEvent::Extracting { index, total, path } => {
                self.step_bar("extract", *index, *total, path);
            }
            ProgressEvent::DeletingFile { index, total, path } => {
                self.step_bar("remove", *index, *total, path);
            }
            ProgressEvent::RemovingObsolete { path } => {
                if self.style == OutputStyle::Plain {
                    println!("removing obsolete: {path}");
                }
            }
            ProgressEvent::WritingManifest => {
                self.finish_bar();
                print_status(self.style, "manifest", "writing install manifest");
            }
            ProgressEvent::ApplyingShortcuts => {
                print_status(self.style, "shortcuts", "creating shortcuts");
            }
            ProgressEvent::ApplyingRegistration => {
                print_status(self.style, "register", "registering in the system list");
            }
            ProgressEvent::PruningDirectories => {
                self.finish_bar();
                print_status(self.style, "prune", "removing empty directories");
            }
            ProgressEvent::RemovingIntegrations => {
                print_status(self.style, "cleanup", "removing shortcuts and registration");
            }
            ProgressEvent::SchedulingSelfDelete => {
                print_status(self.style, "self-delete", "scheduling deferred removal");
            }
            ProgressEvent::Warning { detail } => {
                self.finish_bar();
                print_warning(self.style, detail);
            }
            ProgressEvent::Finished => {
                self.finish_bar();
            }
        }
    }

    fn step_bar(&mut self, label: &'static str, index: usize, total: usize, path: &str) {
        if self.style == OutputStyle::Plain {
            println!("{label} [{index}/{total}] {path}");
            return;
        }

        if self.bar.is_none() || self.bar_label != label {
            self.finish_bar();
            let bar = ProgressBar::new(total.max(1) as u64);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<10} [{bar:20.cyan/blue}] {pos:>3}/{len:3}",
            ) {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar.set_message(label);
            bar.enable_steady_tick(Duration::from_millis(80));
            self.bar = Some(bar);
            self.bar_label = label;
        }
        if let Some(bar) = &self.bar {
            bar.set_position(index as u64);
        }
    }

    fn finish_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        self.bar_label = "";
    }
}
