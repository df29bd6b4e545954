//! Fixed demo dataset served while the relational store is unreachable.

use chrono::{DateTime, TimeZone, Utc};

use super::event::{Event, Thumbnail, sort_newest_first};

const DEMO_EVENTS: [(&str, &str, (i32, u32, u32), &str); 6] = [
    ("evento-1", "Casamento - Maria & João", (2025, 1, 15), "/casamento.jpg"),
    ("evento-2", "Formatura - Turma 2024", (2024, 12, 20), "/formatura.jpg"),
    ("evento-3", "Aniversário - Sofia 15 anos", (2024, 11, 10), "/anivers-rio.jpg"),
    ("evento-4", "Corporativo - Conferência Tech 2024", (2024, 10, 5), "/corporativo.jpg"),
    ("evento-5", "Batizado - Lucas", (2024, 9, 22), "/batizado.jpg"),
    ("evento-6", "Casamento - Pedro & Ana", (2024, 8, 14), "/casamento.jpg"),
];

/// Returns the demo events, newest first, without photos.
#[must_use]
pub fn demo_events() -> Vec<Event> {
    let mut events: Vec<Event> = DEMO_EVENTS
        .iter()
        .map(|&(id, name, (y, m, d), thumbnail)| Event {
            id: id.to_string(),
            name: name.to_string(),
            date: midnight_utc(y, m, d),
            thumbnail: Thumbnail::Url(thumbnail.to_string()),
            photos: Vec::new(),
            visible: true,
        })
        .collect();
    sort_newest_first(&mut events);
    events
}

fn midnight_utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
