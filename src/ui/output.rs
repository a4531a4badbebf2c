//! Human-facing terminal output. Stdout lines are dropped in quiet mode;
//! errors and warnings always reach stderr.

use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;
use std::fmt::Arguments;

fn say(line: Arguments<'_>) {
    if !theme().quiet {
        println!("{}", line);
    }
}

pub fn header(text: &str) {
    say(format_args!("{} {}", Icons::ROCKET, text.style(theme().header)));
}

pub fn section(title: &str) {
    say(format_args!("\n━{}━", title.style(theme().header)));
}

pub fn status(icon: &str, label: &str, value: &str) {
    say(format_args!("{} {}: {}", icon, label.style(theme().label), value));
}

pub fn info(label: &str, value: &str) {
    say(format_args!(
        "{} {}: {}",
        Icons::INFO.style(theme().accent),
        label.style(theme().label),
        value
    ));
}

pub fn summary_row(label: &str, value: &str) {
    say(format_args!("  {} {}", label.style(theme().label), value));
}

pub fn success(message: &str) {
    say(format_args!("{} {}", Icons::CHECK, message.style(theme().success)));
}

pub fn warn(message: &str) {
    eprintln!("{} {}", Icons::WARN, message.style(theme().warn));
}

pub fn error(message: &str) {
    eprintln!("{} {}", Icons::CROSS, message.style(theme().error));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted).to_string()
}
