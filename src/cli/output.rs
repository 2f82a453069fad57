use colored::{ColoredString, Colorize};
use std::fmt;

use crate::core::utils::fmt_dmy;
use crate::domain::{Origin, PaymentRecord};

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Info => "[i]",
        MessageKind::Success => "[ok]",
        MessageKind::Warning => "[!]",
        MessageKind::Error => "[x]",
        MessageKind::Section => "",
    }
}

fn styled(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    let base = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => format!("{} {text}", label(kind)),
    };
    match kind {
        MessageKind::Success => base.bright_green().to_string(),
        MessageKind::Warning => base.bright_yellow().to_string(),
        MessageKind::Error => base.bright_red().to_string(),
        MessageKind::Section => base.bold().to_string(),
        MessageKind::Info => base,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    match kind {
        MessageKind::Error => eprintln!("{}", styled(kind, message)),
        MessageKind::Section => println!("\n{}", styled(kind, message)),
        _ => println!("{}", styled(kind, message)),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

fn origin_tag(origin: Origin) -> ColoredString {
    let tag = format!("({origin})");
    match origin {
        Origin::Manual => tag.bright_green(),
        Origin::Web => tag.bright_cyan(),
        Origin::Heuristic => tag.yellow(),
        Origin::Info => tag.dimmed(),
    }
}

/// One line per record: date, fund, kind, detail, origin.
pub fn format_record(record: &PaymentRecord) -> String {
    let mut line = format!(
        "{}  {:<6}  {} · {}",
        fmt_dmy(record.date),
        record.fund,
        record.kind.bold(),
        record.detail
    );
    if !record.source.is_empty() && record.origin != Origin::Info {
        line.push_str(&format!(" [{}]", record.source));
    }
    format!("{line} {}", origin_tag(record.origin))
}

pub fn records(rows: &[PaymentRecord]) {
    if rows.is_empty() {
        info("Sin registros.");
        return;
    }
    for row in rows {
        println!("{}", format_record(row));
    }
}
