// src/services/calendar_service.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    common::error::{field_error, AppError},
    db::calendar_repo::{CalendarRepository, EventWindow},
    models::calendar::{BookingEventRow, CalendarEvent, CalendarFeed, CalendarQuery, EventKind, MaintenanceEventRow},
    services::scope_service::ResolvedScope,
};

pub fn booking_event(row: BookingEventRow) -> CalendarEvent {
    CalendarEvent {
        id: row.id,
        title: row.purpose,
        date: row.booking_date,
        start_time: row.start_time,
        end_time: row.end_time,
        room_id: row.room_id,
        room_name: row.room_name,
        status: row.status.as_str().to_string(),
        kind: EventKind::Booking,
        owner_label: Some(row.requester_name),
        color: EventKind::Booking.color().to_string(),
    }
}

pub fn maintenance_event(row: MaintenanceEventRow) -> CalendarEvent {
    CalendarEvent {
        id: row.id,
        title: row.maintenance_type,
        date: row.maintenance_date,
        start_time: row.start_time,
        end_time: row.end_time,
        room_id: row.room_id,
        room_name: row.room_name,
        status: row.status.as_str().to_string(),
        kind: EventKind::Maintenance,
        owner_label: row.notes,
        color: EventKind::Maintenance.color().to_string(),
    }
}

/// Junta as duas fontes, aplica o filtro de tipo e agrupa por dia
/// (cada dia ordenado por início).
pub fn build_feed(
    start: NaiveDate,
    end: NaiveDate,
    bookings: Vec<BookingEventRow>,
    maintenance: Vec<MaintenanceEventRow>,
    kind: Option<EventKind>,
) -> CalendarFeed {
    let wants = |k: EventKind| kind.is_none_or(|wanted| wanted == k);

    let mut events: Vec<CalendarEvent> = Vec::new();
    if wants(EventKind::Booking) {
        events.extend(bookings.into_iter().map(booking_event));
    }
    if wants(EventKind::Maintenance) {
        events.extend(maintenance.into_iter().map(maintenance_event));
    }

    let total = events.len();
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events {
        days.entry(event.date).or_default().push(event);
    }
    for day in days.values_mut() {
        day.sort_by_key(|e| (e.start_time, e.end_time));
    }

    CalendarFeed { start, end, total, days }
}

#[derive(Clone)]
pub struct CalendarService {
    repo: CalendarRepository,
    pool: PgPool,
}

impl CalendarService {
    pub fn new(repo: CalendarRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_events(&self, scope: &ResolvedScope, query: &CalendarQuery) -> Result<CalendarFeed, AppError> {
        if query.start > query.end {
            return Err(field_error("end", "date_range", "validation.date_range"));
        }

        let window = EventWindow {
            start: query.start,
            end: query.end,
            faculty_id: scope.listing_filter()?,
            room_id: query.room_id,
        };
        let (bookings, maintenance) = self.repo.fetch_events(&self.pool, window).await?;

        Ok(build_feed(query.start, query.end, bookings, maintenance, query.category))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use uuid::Uuid;

    use super::*;
    use crate::models::{booking::BookingStatus, maintenance::MaintenanceStatus};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn booking(day: u32, start: u32, end: u32) -> BookingEventRow {
        BookingEventRow {
            id: Uuid::new_v4(),
            purpose: "Kuliah umum".into(),
            booking_date: d(day),
            start_time: t(start),
            end_time: t(end),
            room_id: Uuid::new_v4(),
            room_name: "TK-101".into(),
            status: BookingStatus::Approved,
            requester_name: "Sari".into(),
        }
    }

    fn maintenance(day: u32, start: u32, end: u32) -> MaintenanceEventRow {
        MaintenanceEventRow {
            id: Uuid::new_v4(),
            maintenance_type: "Servis AC".into(),
            maintenance_date: d(day),
            start_time: t(start),
            end_time: t(end),
            room_id: Uuid::new_v4(),
            room_name: "TK-101".into(),
            status: MaintenanceStatus::InProgress,
            notes: Some("Teknisi gedung".into()),
        }
    }

    #[test]
    fn groups_by_day_and_orders_by_start() {
        let feed = build_feed(
            d(1),
            d(3),
            vec![booking(1, 9, 11), booking(2, 8, 9)],
            vec![maintenance(1, 7, 8)],
            None,
        );

        assert_eq!(feed.total, 3);
        let first_day = &feed.days[&d(1)];
        assert_eq!(first_day.len(), 2);
        assert_eq!(first_day[0].kind, EventKind::Maintenance);
        assert_eq!(first_day[1].kind, EventKind::Booking);
        assert_eq!(feed.days[&d(2)].len(), 1);
        assert!(!feed.days.contains_key(&d(3)));
    }

    #[test]
    fn labels_and_colors_follow_event_kind() {
        let feed = build_feed(d(1), d(1), vec![booking(1, 9, 11)], vec![maintenance(1, 13, 15)], None);
        let day = &feed.days[&d(1)];

        assert_eq!(day[0].owner_label.as_deref(), Some("Sari"));
        assert_eq!(day[0].color, "#4e73df");
        assert_eq!(day[0].status, "approved");
        assert_eq!(day[1].owner_label.as_deref(), Some("Teknisi gedung"));
        assert_eq!(day[1].color, "#e74a3b");
        assert_eq!(day[1].status, "in_progress");
    }

    #[test]
    fn category_filter_keeps_one_source() {
        let feed = build_feed(
            d(1),
            d(1),
            vec![booking(1, 9, 11)],
            vec![maintenance(1, 13, 15)],
            Some(EventKind::Maintenance),
        );
        assert_eq!(feed.total, 1);
        assert!(feed.days[&d(1)].iter().all(|e| e.kind == EventKind::Maintenance));
    }

    #[test]
    fn empty_window_yields_empty_feed() {
        let feed = build_feed(d(1), d(7), Vec::new(), Vec::new(), None);
        assert_eq!(feed.total, 0);
        assert!(feed.days.is_empty());
    }
}
