use chrono::{DateTime, Utc};
use colored::*;
use jotter::api::StatusReport;
use jotter::ledger::VersionEntry;
use jotter::model::{Note, NoteId, PathSegment, SaveStatus};
use jotter::store::DoctorReport;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const INDENT: &str = "  ";
const SELECTED_MARKER: &str = "▸";
const BREADCRUMB_SEP: &str = " › ";

pub fn success(message: &str) {
    println!("{}", message.green());
}

pub fn info(message: &str) {
    println!("{}", message.dimmed());
}

/// One line per note, indented by depth, newest-edit time on the right.
pub fn print_tree(rows: &[(usize, Note)], selected: Option<&NoteId>) {
    if rows.is_empty() {
        println!("No notes yet.");
        return;
    }

    for (depth, note) in rows {
        let is_selected = selected == Some(note.id());
        let marker = if is_selected {
            format!("{} ", SELECTED_MARKER)
        } else {
            "  ".to_string()
        };
        let id_str = format!("{} ", note.id().short());
        let indent = INDENT.repeat(*depth);

        let preview = preview_line(note.content());
        let title_content = if preview.is_empty() {
            note.title().to_string()
        } else {
            format!("{}  {}", note.title(), preview)
        };

        let fixed_width = marker.width() + id_str.width() + indent.width() + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let shown = truncate_to_width(&title_content, available);
        let padding = available.saturating_sub(shown.width());

        let id_colored = if is_selected {
            id_str.yellow()
        } else {
            id_str.normal()
        };

        println!(
            "{}{}{}{}{}{}",
            marker.yellow(),
            id_colored,
            indent,
            shown,
            " ".repeat(padding),
            format_time_ago(note.updated_at()).dimmed()
        );
    }
}

pub fn print_note(note: &Note, path: &[PathSegment]) {
    println!("{}", format_breadcrumbs(path).dimmed());
    println!(
        "{} {}  {}",
        note.id().short().yellow(),
        note.title().bold(),
        format!("v{}", note.version()).dimmed()
    );
    println!("--------------------------------");
    println!("{}", note.content());
}

pub fn print_path(path: &[PathSegment]) {
    println!("{}", format_breadcrumbs(path));
}

pub fn print_history(entries: &[VersionEntry]) {
    let latest = entries.last().map(|e| e.version);
    for entry in entries {
        let label = format!("v{:<4}", entry.version);
        let label = if Some(entry.version) == latest {
            label.yellow()
        } else {
            label.normal()
        };
        let preview = truncate_to_width(&preview_line(&entry.content), LINE_WIDTH / 2);
        println!(
            "{} {}  {}",
            label,
            format_time_ago(entry.timestamp).dimmed(),
            preview
        );
    }
}

pub fn print_status(report: &StatusReport) {
    println!("notes:    {}", report.note_count);
    match &report.selected {
        Some(path) => println!("selected: {}", format_breadcrumbs(path)),
        None => println!("selected: {}", "none".dimmed()),
    }
    let status = report.save_status.to_string();
    let status = match report.save_status {
        SaveStatus::Saved => status.green(),
        SaveStatus::Saving => status.yellow(),
        SaveStatus::Error => status.red(),
    };
    println!("status:   {}", status);
    println!("file:     {}", report.location.display());
}

pub fn print_doctor(report: &DoctorReport) {
    if report.is_clean() {
        success("No problems found.");
        return;
    }
    if report.orphans_promoted > 0 {
        println!(
            "{}",
            format!(
                "Moved {} note(s) with a missing parent to the top level.",
                report.orphans_promoted
            )
            .yellow()
        );
    }
    if report.cycles_broken > 0 {
        println!(
            "{}",
            format!(
                "Broke {} parent loop(s) by moving notes to the top level.",
                report.cycles_broken
            )
            .yellow()
        );
    }
    if report.selection_cleared {
        println!("{}", "Cleared a selection that pointed at a missing note.".yellow());
    }
}

fn format_breadcrumbs(path: &[PathSegment]) -> String {
    path.iter()
        .map(|s| s.title.as_str())
        .collect::<Vec<_>>()
        .join(BREADCRUMB_SEP)
}

fn preview_line(content: &str) -> String {
    content
        .chars()
        .take(60)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
