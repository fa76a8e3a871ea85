// ICS (RFC 5545) calendar rendering
//
// One VEVENT per resolvable event. Text values are escaped (backslash,
// semicolon, comma, newline), timestamps are UTC `YYYYMMDDTHHMMSSZ`, lines
// are CRLF-terminated and folded at 75 octets.

use chrono::{DateTime, Utc};

use crate::analytics::CalendarEventView;

const PRODID: &str = "-//Callboard//Planning Calendar//EN";
const FOLD_AT: usize = 75;

/// Escape a text value per RFC 5545 §3.3.11
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// UTC timestamp in ICS basic format
pub fn format_utc(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Fold a content line at 75 octets with space continuation
fn fold_line(line: &str, out: &mut String) {
    let mut budget = FOLD_AT;
    let mut used = 0usize;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if used + len > budget {
            out.push_str("\r\n ");
            // Continuation lines start with a space that counts against the budget
            budget = FOLD_AT - 1;
            used = 0;
        }
        out.push(ch);
        used += len;
    }
    out.push_str("\r\n");
}

/// Render the planning calendar as an ICS document
pub fn render_calendar(events: &[CalendarEventView], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    fold_line("BEGIN:VCALENDAR", &mut out);
    fold_line("VERSION:2.0", &mut out);
    fold_line(&format!("PRODID:{}", PRODID), &mut out);
    fold_line("CALSCALE:GREGORIAN", &mut out);

    for event in events {
        fold_line("BEGIN:VEVENT", &mut out);
        fold_line(&format!("UID:{}@callboard", event.id), &mut out);
        fold_line(&format!("DTSTAMP:{}", format_utc(now)), &mut out);
        fold_line(&format!("DTSTART:{}", format_utc(event.starts_at)), &mut out);
        fold_line(&format!("DTEND:{}", format_utc(event.ends_at)), &mut out);

        let summary = if event.conflict {
            format!("Conflict · {}", event.title)
        } else {
            event.title.clone()
        };
        fold_line(&format!("SUMMARY:{}", escape_text(&summary)), &mut out);

        let location = match &event.venue_space {
            Some(space) => format!("{} - {}", event.venue_name, space),
            None => event.venue_name.clone(),
        };
        fold_line(&format!("LOCATION:{}", escape_text(&location)), &mut out);

        let mut description = format!("Status: {}", event.status);
        if let Some(reviewer) = &event.reviewer_name {
            description.push_str(&format!("\nReviewer: {}", reviewer));
        }
        if event.conflict {
            description.push_str("\nWarning: overlaps another event in the same space");
        }
        fold_line(
            &format!("DESCRIPTION:{}", escape_text(&description)),
            &mut out,
        );

        fold_line("END:VEVENT", &mut out);
    }

    fold_line("END:VCALENDAR", &mut out);
    out
}
