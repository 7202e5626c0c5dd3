use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::model::{Alarm, AlarmAction, Schedule};
use crate::parser::dates::CalendarTimestamp;
use crate::settings::Settings;

const PROD_ID: &str = "-//vct_calendar//VCT schedule//EN";
const UID_DOMAIN: &str = "vct-calendar";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const MAX_LINE_OCTETS: usize = 75;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("no events to write")]
    Empty,
    #[error("event {title:?} ends before it starts")]
    EndBeforeStart { title: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Organizer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geo {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Confirmed,
    Tentative,
}

impl EventStatus {
    fn as_str(self) -> &'static str {
        match self {
            EventStatus::Confirmed => "CONFIRMED",
            EventStatus::Tentative => "TENTATIVE",
        }
    }
}

/// One calendar entry, tournament or match.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescriptor {
    pub title: String,
    pub description: String,
    pub start: CalendarTimestamp,
    pub end: CalendarTimestamp,
    pub organizer: Organizer,
    pub url: String,
    pub status: EventStatus,
    pub geo: Geo,
    pub alarms: Vec<Alarm>,
}

/// Each tournament followed by its matches, in schedule order.
pub fn flatten(schedule: &Schedule, settings: &Settings) -> Vec<EventDescriptor> {
    let geo = Geo {
        lat: settings.geo_lat,
        lon: settings.geo_lon,
    };
    let organizer = |suffix: &str| Organizer {
        name: format!("{} {}", settings.organizer_prefix, suffix).trim().to_string(),
        email: settings.organizer_email.clone(),
    };

    let mut events = Vec::with_capacity(schedule.tournaments.len() + schedule.match_count());
    for t in &schedule.tournaments {
        events.push(EventDescriptor {
            title: t.title.clone(),
            description: t.description.clone(),
            start: t.start,
            end: t.end,
            organizer: organizer(&t.title),
            url: t.url.clone(),
            status: EventStatus::Confirmed,
            geo,
            alarms: t.reminder.iter().cloned().collect(),
        });
        for m in &t.matches {
            events.push(EventDescriptor {
                title: m.title.clone(),
                description: m.description.clone(),
                start: m.start,
                end: m.end,
                organizer: organizer(&m.series),
                url: settings.match_url.clone(),
                status: EventStatus::Tentative,
                geo,
                alarms: m.reminder.iter().cloned().collect(),
            });
        }
    }
    events
}

pub trait CalendarEmitter {
    fn emit(&self, events: &[EventDescriptor]) -> Result<String, CalendarError>;
}

/// RFC 5545 writer. Timestamps are read in `offset` and written in UTC.
pub struct IcsEmitter {
    offset: FixedOffset,
    stamp: DateTime<Utc>,
}

impl IcsEmitter {
    pub fn new(offset: FixedOffset, stamp: DateTime<Utc>) -> Self {
        Self { offset, stamp }
    }

    fn utc(&self, ts: CalendarTimestamp) -> NaiveDateTime {
        ts.naive() - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))
    }

    fn write_event(&self, out: &mut Vec<String>, event: &EventDescriptor) {
        out.push("BEGIN:VEVENT".into());
        out.push(format!("UID:{:016x}@{}", uid_hash(event), UID_DOMAIN));
        out.push(format!("DTSTAMP:{}", self.stamp.format(UTC_FORMAT)));
        out.push(format!("DTSTART:{}", self.utc(event.start).format(UTC_FORMAT)));
        out.push(format!("DTEND:{}", self.utc(event.end).format(UTC_FORMAT)));
        out.push(format!("SUMMARY:{}", escape_text(&event.title)));
        if !event.description.is_empty() {
            out.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
        }
        if !event.url.is_empty() {
            out.push(format!("URL:{}", event.url));
        }
        out.push(format!("GEO:{};{}", event.geo.lat, event.geo.lon));
        out.push(format!("STATUS:{}", event.status.as_str()));
        out.push(format!(
            "ORGANIZER;CN={}:mailto:{}",
            param_value(&event.organizer.name),
            event.organizer.email
        ));
        for alarm in &event.alarms {
            let action = match alarm.action {
                AlarmAction::Audio => "AUDIO",
            };
            out.push("BEGIN:VALARM".into());
            out.push(format!("ACTION:{}", action));
            out.push(format!("TRIGGER:-PT{}M", alarm.minutes_before));
            out.push(format!("ATTACH;VALUE=URI:{}", alarm.attach));
            out.push("END:VALARM".into());
        }
        out.push("END:VEVENT".into());
    }
}

impl CalendarEmitter for IcsEmitter {
    fn emit(&self, events: &[EventDescriptor]) -> Result<String, CalendarError> {
        if events.is_empty() {
            return Err(CalendarError::Empty);
        }
        if let Some(bad) = events.iter().find(|e| e.end < e.start) {
            return Err(CalendarError::EndBeforeStart {
                title: bad.title.clone(),
            });
        }

        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{}", PROD_ID),
            "CALSCALE:GREGORIAN".to_string(),
            "METHOD:PUBLISH".to_string(),
        ];
        for event in events {
            self.write_event(&mut lines, event);
        }
        lines.push("END:VCALENDAR".into());

        let mut doc = String::new();
        for line in &lines {
            doc.push_str(&fold(line));
            doc.push_str("\r\n");
        }
        Ok(doc)
    }
}

/// FNV-1a over title and start; same event, same UID across runs.
fn uid_hash(event: &EventDescriptor) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let key = format!("{}\u{0}{}", event.title, event.start);
    key.bytes()
        .fold(OFFSET_BASIS, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Quote a parameter value when it holds a delimiter; DQUOTE itself is not allowed.
fn param_value(value: &str) -> String {
    let cleaned: String = value.chars().filter(|&c| c != '"').collect();
    if cleaned.contains([':', ';', ',']) {
        format!("\"{}\"", cleaned)
    } else {
        cleaned
    }
}

/// Split into lines of at most 75 octets, never inside a UTF-8 sequence.
fn fold(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    for c in line.chars() {
        if used + c.len_utf8() > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            // continuation lines carry the leading space
            used = 1;
        }
        out.push(c);
        used += c.len_utf8();
    }
    out
}
