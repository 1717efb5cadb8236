use std::io::IsTerminal;

use anstyle::{AnsiColor, Style};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn current_output_style() -> OutputStyle {
    if std::env::var("SEEDBED_PLAIN").map(|v| v == "1").unwrap_or(false) {
        return OutputStyle::Plain;
    }
    if std::io::stdout().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

fn status_style(status: &str) -> Style {
    let color = match status {
        "ok" => AnsiColor::Green,
        "warn" => AnsiColor::Yellow,
        "error" => AnsiColor::Red,
        _ => AnsiColor::Cyan,
    };
    Style::new().fg_color(Some(color.into())).bold()
}

pub fn status(status: &str, message: &str) {
    match current_output_style() {
        OutputStyle::Plain => println!("[{status}] {message}"),
        OutputStyle::Rich => {
            let style = status_style(status);
            println!("{}[{status}]{} {message}", style.render(), style.render_reset());
        }
    }
}

pub fn section(title: &str) {
    match current_output_style() {
        OutputStyle::Plain => println!("== {title} =="),
        OutputStyle::Rich => {
            let style = Style::new().bold();
            println!();
            println!("{}== {title} =={}", style.render(), style.render_reset());
        }
    }
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub struct PhaseProgress {
    progress_bar: Option<ProgressBar>,
    current: u64,
    total: u64,
}

pub fn start_progress(label: &str, total: u64) -> PhaseProgress {
    let progress_bar = if current_output_style() == OutputStyle::Rich {
        let progress_bar = ProgressBar::new(total.max(1));
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.cyan.bold} {msg:<24} [{bar:20.cyan/blue}] {pos:>2}/{len:2}",
        ) {
            progress_bar.set_style(style);
        }
        progress_bar.set_message(label.to_string());
        Some(progress_bar)
    } else {
        println!("{label} (0/{total})");
        None
    };

    PhaseProgress {
        progress_bar,
        current: 0,
        total,
    }
}

impl PhaseProgress {
    pub fn step(&mut self, message: &str) {
        self.current += 1;
        match &self.progress_bar {
            Some(progress_bar) => {
                progress_bar.set_message(message.to_string());
                progress_bar.set_position(self.current);
            }
            None => println!("{message} ({}/{})", self.current, self.total),
        }
    }

    pub fn finish(self, message: &str) {
        if let Some(progress_bar) = self.progress_bar {
            progress_bar.finish_with_message(message.to_string());
        } else {
            println!("{message}");
        }
    }

    pub fn abandon(self, message: &str) {
        if let Some(progress_bar) = self.progress_bar {
            progress_bar.abandon_with_message(message.to_string());
        } else {
            println!("{message}");
        }
    }
}
