// src/services/conflict_checker.rs

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BookingRepository,
    models::booking::{BookedSlot, ConflictMode},
};

/// Intervalos semiabertos `[start, end)`. Cobre início dentro, fim dentro
/// e contenção nos dois sentidos; encostar (fim == início) não conflita.
pub fn intervals_overlap(start_a: NaiveTime, end_a: NaiveTime, start_b: NaiveTime, end_b: NaiveTime) -> bool {
    start_a < end_b && start_b < end_a
}

/// Primeiro horário que bloqueia `[start, end)` no modo dado.
pub fn find_conflict(
    slots: &[BookedSlot],
    start: NaiveTime,
    end: NaiveTime,
    mode: ConflictMode,
    exclude: Option<Uuid>,
) -> Option<BookedSlot> {
    let blocking = mode.blocking_statuses();
    slots
        .iter()
        .filter(|slot| Some(slot.id) != exclude)
        .filter(|slot| blocking.contains(&slot.status))
        .find(|slot| intervals_overlap(slot.start_time, slot.end_time, start, end))
        .copied()
}

#[derive(Clone)]
pub struct ConflictChecker {
    repo: BookingRepository,
}

impl ConflictChecker {
    pub fn new(repo: BookingRepository) -> Self {
        Self { repo }
    }

    /// Roda dentro da transação do chamador, depois da trava da sala.
    pub async fn has_conflict(
        &self,
        conn: &mut PgConnection,
        room_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        mode: ConflictMode,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let slots = self
            .repo
            .slots_for_room_date(&mut *conn, room_id, date, mode.blocking_statuses())
            .await?;

        match find_conflict(&slots, start, end, mode, exclude) {
            Some(slot) => {
                tracing::info!(
                    %room_id,
                    %date,
                    blocking_booking = %slot.id,
                    mode = ?mode,
                    "Conflito de horário detectado"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Mesmo que `has_conflict`, mas já devolve o erro de domínio.
    pub async fn ensure_free(
        &self,
        conn: &mut PgConnection,
        room_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        mode: ConflictMode,
        exclude: Option<Uuid>,
    ) -> Result<(), AppError> {
        if self.has_conflict(conn, room_id, date, start, end, mode, exclude).await? {
            return Err(AppError::SchedulingConflict(mode));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: NaiveTime, end: NaiveTime, status: BookingStatus) -> BookedSlot {
        BookedSlot { id: Uuid::new_v4(), start_time: start, end_time: end, status }
    }

    #[test]
    fn overlap_covers_every_shape() {
        // início dentro
        assert!(intervals_overlap(t(9, 0), t(11, 0), t(10, 0), t(12, 0)));
        // fim dentro
        assert!(intervals_overlap(t(9, 0), t(11, 0), t(8, 0), t(10, 0)));
        // contido
        assert!(intervals_overlap(t(9, 0), t(11, 0), t(9, 30), t(10, 30)));
        // contém
        assert!(intervals_overlap(t(9, 0), t(11, 0), t(8, 0), t(12, 0)));
        // idêntico
        assert!(intervals_overlap(t(9, 0), t(11, 0), t(9, 0), t(11, 0)));
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        assert!(!intervals_overlap(t(9, 0), t(11, 0), t(11, 0), t(13, 0)));
        assert!(!intervals_overlap(t(11, 0), t(13, 0), t(9, 0), t(11, 0)));
        assert!(!intervals_overlap(t(9, 0), t(10, 0), t(14, 0), t(15, 0)));
    }

    #[test]
    fn approved_morning_blocks_overlapping_request_only() {
        let slots = vec![slot(t(9, 0), t(11, 0), BookingStatus::Approved)];

        assert!(find_conflict(&slots, t(10, 0), t(12, 0), ConflictMode::Submission, None).is_some());
        assert!(find_conflict(&slots, t(11, 0), t(13, 0), ConflictMode::Submission, None).is_none());
    }

    #[test]
    fn submission_is_blocked_by_pending_but_approval_is_not() {
        let pending = slot(t(9, 0), t(11, 0), BookingStatus::Pending);
        let slots = vec![pending];

        assert_eq!(find_conflict(&slots, t(10, 0), t(12, 0), ConflictMode::Submission, None), Some(pending));
        assert!(find_conflict(&slots, t(10, 0), t(12, 0), ConflictMode::Approval, None).is_none());
    }

    #[test]
    fn rejected_bookings_never_block() {
        let slots = vec![slot(t(9, 0), t(11, 0), BookingStatus::Rejected)];

        assert!(find_conflict(&slots, t(9, 0), t(11, 0), ConflictMode::Submission, None).is_none());
        assert!(find_conflict(&slots, t(9, 0), t(11, 0), ConflictMode::Approval, None).is_none());
    }

    #[test]
    fn second_approval_of_overlapping_pair_conflicts() {
        // A e B pendentes e sobrepostos; A já foi aprovado
        let a = slot(t(9, 0), t(11, 0), BookingStatus::Approved);
        let b = slot(t(10, 0), t(12, 0), BookingStatus::Pending);
        let slots = vec![a, b];

        assert_eq!(find_conflict(&slots, b.start_time, b.end_time, ConflictMode::Approval, Some(b.id)), Some(a));
    }

    #[test]
    fn booking_never_conflicts_with_itself() {
        let own = slot(t(9, 0), t(11, 0), BookingStatus::Approved);

        assert!(find_conflict(&[own], t(9, 0), t(11, 0), ConflictMode::Approval, Some(own.id)).is_none());
    }
}
