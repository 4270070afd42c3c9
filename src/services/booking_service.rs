// src/services/booking_service.rs

use std::{borrow::Cow, collections::HashSet, sync::Arc};

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        db_utils::begin_scoped_tx,
        error::{field_error, AppError},
    },
    db::{BookingRepository, RoomRepository},
    models::{
        auth::Principal,
        booking::{
            BookingDetail, BookingListFilter, BookingStatus, BookingSummary, ConflictMode, DocumentKind,
            DocumentType, NewBooking, UploadedDocument,
        },
    },
    services::{
        conflict_checker::ConflictChecker,
        scope_service::ResolvedScope,
        storage::{discard_all, store_all, upload_problem, DocumentStorage, StoredFile, DOCUMENT_EXTENSIONS},
    },
};

pub const MAX_ADMIN_NOTES: usize = 1000;

fn push_error(errors: &mut ValidationErrors, field: &'static str, code: &'static str, key: &'static str) {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(key));
    errors.add(field, error);
}

/// Regras da solicitação que não dependem do banco.
pub fn validate_submission(
    booking: &NewBooking,
    documents: &[UploadedDocument],
    today: NaiveDate,
    max_upload_bytes: usize,
) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    if booking.end_time <= booking.start_time {
        push_error(&mut errors, "end_time", "time_window", "validation.time_window");
    }
    if booking.booking_date < today {
        push_error(&mut errors, "booking_date", "past_date", "validation.past_date");
    }
    if booking.number_of_participants < 1 {
        push_error(&mut errors, "number_of_participants", "participants", "validation.participants");
    }
    if booking.purpose.trim().is_empty() {
        push_error(&mut errors, "purpose", "required", "validation.purpose_required");
    }

    let mut seen = HashSet::new();
    for doc in documents {
        if !seen.insert(doc.kind) {
            push_error(&mut errors, doc.kind.slug(), "duplicate", "validation.duplicate_document");
            continue;
        }
        if let Some((code, key)) =
            upload_problem(&doc.original_filename, doc.bytes.len(), DOCUMENT_EXTENSIONS, max_upload_bytes)
        {
            push_error(&mut errors, doc.kind.slug(), code, key);
        }
    }
    if !seen.contains(&DocumentKind::PermitLetter) {
        push_error(&mut errors, "permit_letter", "required", "validation.permit_letter_required");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(errors))
    }
}

/// Observação obrigatória na rejeição (1..=1000 caracteres).
pub fn validate_reject_notes(notes: &str) -> Result<&str, AppError> {
    let notes = notes.trim();
    if notes.is_empty() || notes.chars().count() > MAX_ADMIN_NOTES {
        return Err(field_error("admin_notes", "length", "validation.notes_required"));
    }
    Ok(notes)
}

/// Transição permitida pela máquina de estados.
pub fn ensure_transition(from: BookingStatus, to: BookingStatus) -> Result<(), AppError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

#[derive(Clone)]
pub struct BookingService {
    repo: BookingRepository,
    room_repo: RoomRepository,
    checker: ConflictChecker,
    storage: Arc<dyn DocumentStorage>,
    max_upload_bytes: usize,
    pool: PgPool,
}

impl BookingService {
    pub fn new(
        repo: BookingRepository,
        room_repo: RoomRepository,
        checker: ConflictChecker,
        storage: Arc<dyn DocumentStorage>,
        max_upload_bytes: usize,
        pool: PgPool,
    ) -> Self {
        Self { repo, room_repo, checker, storage, max_upload_bytes, pool }
    }

    /// Cria a solicitação `pending` com seus documentos.
    /// Arquivos só são gravados depois de todas as validações; se a
    /// transação falhar eles são removidos.
    pub async fn submit(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        booking: NewBooking,
        documents: Vec<UploadedDocument>,
    ) -> Result<BookingDetail, AppError> {
        let today = chrono::Local::now().date_naive();
        validate_submission(&booking, &documents, today, self.max_upload_bytes)?;

        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        // 1. Trava a sala: serializa verificação + escrita por sala
        let room = self
            .room_repo
            .lock(&mut *tx, booking.room_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", booking.room_id)))?;

        if booking.number_of_participants > room.capacity {
            return Err(field_error(
                "number_of_participants",
                "capacity_exceeded",
                "validation.capacity_exceeded",
            ));
        }

        // 2. Conflito (pending + approved)
        self.checker
            .ensure_free(
                &mut *tx,
                room.id,
                booking.booking_date,
                booking.start_time,
                booking.end_time,
                ConflictMode::Submission,
                None,
            )
            .await?;

        // 3. Arquivos (todos ou nenhum)
        let inputs: Vec<(&str, &[u8])> =
            documents.iter().map(|d| (d.original_filename.as_str(), d.bytes.as_slice())).collect();
        let files = store_all(self.storage.as_ref(), "bookings", inputs).await?;
        let stored: Vec<(DocumentKind, StoredFile, String)> = documents
            .into_iter()
            .zip(files)
            .map(|(doc, file)| (doc.kind, file, doc.original_filename))
            .collect();

        // 4. Reserva + documentos na mesma transação
        let written = async {
            let created = self.repo.insert(&mut *tx, principal.id(), &booking).await?;
            for (kind, file, original_filename) in &stored {
                let type_id = self
                    .repo
                    .document_type_id(&mut *tx, kind.slug())
                    .await?
                    .ok_or_else(|| AppError::DanglingReference(format!("DocumentType {}", kind.slug())))?;
                self.repo
                    .insert_document(&mut *tx, created.id, type_id, &file.path, original_filename)
                    .await?;
            }
            Ok::<_, AppError>(created)
        }
        .await;

        let created = match written {
            Ok(created) => created,
            Err(e) => {
                self.discard(&stored).await;
                return Err(e);
            }
        };

        if let Err(e) = tx.commit().await {
            self.discard(&stored).await;
            return Err(e.into());
        }

        tracing::info!(
            booking_id = %created.id,
            room_id = %created.room_id,
            user_id = %principal.id(),
            date = %created.booking_date,
            documents = stored.len(),
            "Reserva solicitada"
        );

        self.get_detail(created.id).await
    }

    /// pending -> approved, revalidando conflitos só contra aprovadas.
    pub async fn approve(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        booking_id: Uuid,
        admin_notes: Option<String>,
    ) -> Result<BookingDetail, AppError> {
        let notes = admin_notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
        if notes.is_some_and(|n| n.chars().count() > MAX_ADMIN_NOTES) {
            return Err(field_error("admin_notes", "length", "validation.notes_required"));
        }

        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        let room = self
            .room_repo
            .lock_for_booking(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Booking {}", booking_id)))?;
        scope.ensure_covers(room.faculty_id)?;

        let booking = self
            .repo
            .find_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Booking {}", booking_id)))?;
        ensure_transition(booking.status, BookingStatus::Approved)?;

        self.checker
            .ensure_free(
                &mut *tx,
                booking.room_id,
                booking.booking_date,
                booking.start_time,
                booking.end_time,
                ConflictMode::Approval,
                Some(booking.id),
            )
            .await?;

        self.repo
            .record_review(&mut *tx, booking.id, BookingStatus::Approved, principal.id(), notes)
            .await?;
        tx.commit().await?;

        tracing::info!(%booking_id, reviewer = %principal.id(), room = %room.name, "Reserva aprovada");
        self.get_detail(booking_id).await
    }

    /// pending -> rejected. Sem verificação de conflito.
    pub async fn reject(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        booking_id: Uuid,
        admin_notes: &str,
    ) -> Result<BookingDetail, AppError> {
        let notes = validate_reject_notes(admin_notes)?;

        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        let room = self
            .room_repo
            .lock_for_booking(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Booking {}", booking_id)))?;
        scope.ensure_covers(room.faculty_id)?;

        let booking = self
            .repo
            .find_for_update(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Booking {}", booking_id)))?;
        ensure_transition(booking.status, BookingStatus::Rejected)?;

        self.repo
            .record_review(&mut *tx, booking.id, BookingStatus::Rejected, principal.id(), Some(notes))
            .await?;
        tx.commit().await?;

        tracing::info!(%booking_id, reviewer = %principal.id(), "Reserva rejeitada");
        self.get_detail(booking_id).await
    }

    /// Dono lê a própria reserva; admin lê as do seu escopo.
    pub async fn get(&self, principal: &Principal, scope: &ResolvedScope, booking_id: Uuid) -> Result<BookingDetail, AppError> {
        let detail = self.get_detail(booking_id).await?;
        let summary = &detail.summary;

        if summary.booking.user_id != principal.id() {
            if !principal.role().is_admin_tier() {
                return Err(AppError::ForbiddenScope);
            }
            scope.ensure_covers(summary.faculty_id)?;
        }
        Ok(detail)
    }

    pub async fn list_mine(&self, principal: &Principal, filter: &BookingListFilter) -> Result<Vec<BookingSummary>, AppError> {
        self.repo.list_for_user(principal.id(), filter).await
    }

    pub async fn list_scoped(&self, scope: &ResolvedScope, filter: &BookingListFilter) -> Result<Vec<BookingSummary>, AppError> {
        let faculty = scope.listing_filter()?;
        self.repo.list_scoped(faculty, filter).await
    }

    pub async fn document_types(&self) -> Result<Vec<DocumentType>, AppError> {
        self.repo.list_document_types().await
    }

    async fn get_detail(&self, booking_id: Uuid) -> Result<BookingDetail, AppError> {
        let summary = self
            .repo
            .find_summary(&self.pool, booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Booking {}", booking_id)))?;
        let documents = self.repo.documents_for_booking(&self.pool, booking_id).await?;
        Ok(BookingDetail { summary, documents })
    }

    async fn discard(&self, stored: &[(DocumentKind, StoredFile, String)]) {
        let files: Vec<StoredFile> = stored.iter().map(|(_, file, _)| file.clone()).collect();
        discard_all(self.storage.as_ref(), &files).await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    const MAX: usize = 1024;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn request(start: u32, end: u32) -> NewBooking {
        NewBooking {
            room_id: Uuid::new_v4(),
            booking_date: today(),
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            purpose: "Rapat himpunan".into(),
            number_of_participants: 20,
        }
    }

    fn doc(kind: DocumentKind, name: &str) -> UploadedDocument {
        UploadedDocument { kind, original_filename: name.into(), bytes: vec![1, 2, 3] }
    }

    fn failing_fields(result: Result<(), AppError>) -> Vec<String> {
        match result {
            Err(AppError::ValidationError(e)) => {
                let mut fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
                fields.sort();
                fields
            }
            other => panic!("esperava ValidationError, veio {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_request() {
        let docs = vec![doc(DocumentKind::PermitLetter, "surat.pdf"), doc(DocumentKind::Proposal, "p.docx")];
        assert!(validate_submission(&request(9, 11), &docs, today(), MAX).is_ok());
    }

    #[test]
    fn rejects_inverted_window_and_missing_permit() {
        let fields = failing_fields(validate_submission(&request(11, 9), &[], today(), MAX));
        assert_eq!(fields, vec!["end_time", "permit_letter"]);
    }

    #[test]
    fn rejects_empty_window() {
        let docs = vec![doc(DocumentKind::PermitLetter, "surat.pdf")];
        let fields = failing_fields(validate_submission(&request(10, 10), &docs, today(), MAX));
        assert_eq!(fields, vec!["end_time"]);
    }

    #[test]
    fn rejects_past_dates_and_bad_participants() {
        let mut booking = request(9, 11);
        booking.booking_date = today().pred_opt().unwrap();
        booking.number_of_participants = 0;
        booking.purpose = "   ".into();
        let docs = vec![doc(DocumentKind::PermitLetter, "surat.pdf")];

        let fields = failing_fields(validate_submission(&booking, &docs, today(), MAX));
        assert_eq!(fields, vec!["booking_date", "number_of_participants", "purpose"]);
    }

    #[test]
    fn rejects_disallowed_extension_and_duplicates() {
        let docs = vec![
            doc(DocumentKind::PermitLetter, "surat.pdf"),
            doc(DocumentKind::PermitLetter, "lagi.pdf"),
            doc(DocumentKind::AttendanceList, "hadir.exe"),
        ];
        let fields = failing_fields(validate_submission(&request(9, 11), &docs, today(), MAX));
        assert_eq!(fields, vec!["attendance_list", "permit_letter"]);
    }

    #[test]
    fn reject_notes_must_be_present_and_bounded() {
        assert!(validate_reject_notes("   ").is_err());
        assert!(validate_reject_notes(&"x".repeat(MAX_ADMIN_NOTES + 1)).is_err());
        assert_eq!(validate_reject_notes("  Jadwal bentrok  ").unwrap(), "Jadwal bentrok");
        assert!(validate_reject_notes(&"x".repeat(MAX_ADMIN_NOTES)).is_ok());
    }

    // ---
    // Com banco (pulados sem DATABASE_URL)
    // ---
    use chrono::Days;
    use sqlx::PgPool;

    use crate::common::test_support::{self, RecordingStorage, RoomFixture};

    fn service(pool: &PgPool, storage: Arc<RecordingStorage>) -> BookingService {
        let repo = BookingRepository::new(pool.clone());
        BookingService::new(
            repo.clone(),
            RoomRepository::new(pool.clone()),
            ConflictChecker::new(repo),
            storage,
            MAX,
            pool.clone(),
        )
    }

    fn upcoming() -> NaiveDate {
        chrono::Local::now().date_naive().checked_add_days(Days::new(30)).unwrap()
    }

    fn slot(fixture: &RoomFixture, start: u32, end: u32) -> NewBooking {
        NewBooking { room_id: fixture.room_id, booking_date: upcoming(), ..request(start, end) }
    }

    fn permit_and_proposal() -> Vec<UploadedDocument> {
        vec![doc(DocumentKind::PermitLetter, "surat.pdf"), doc(DocumentKind::Proposal, "proposal.pdf")]
    }

    async fn bookings_in_room(pool: &PgPool, room_id: Uuid) -> (i64, i64) {
        let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(pool)
            .await
            .unwrap();
        let documents: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM booking_documents d JOIN bookings b ON b.id = d.booking_id WHERE b.room_id = $1",
        )
        .bind(room_id)
        .fetch_one(pool)
        .await
        .unwrap();
        (bookings, documents)
    }

    /// Insere direto como pending (sem passar pela checagem de submissão).
    async fn insert_pending(pool: &PgPool, fixture: &RoomFixture, start: u32, end: u32) -> Uuid {
        BookingRepository::new(pool.clone())
            .insert(pool, fixture.student.id(), &slot(fixture, start, end))
            .await
            .unwrap()
            .id
    }

    async fn status_of(pool: &PgPool, booking_id: Uuid) -> BookingStatus {
        BookingRepository::new(pool.clone())
            .find_summary(pool, booking_id)
            .await
            .unwrap()
            .unwrap()
            .booking
            .status
    }

    #[tokio::test]
    async fn storage_failure_leaves_no_booking_and_no_files() {
        let Some(pool) = test_support::pool().await else { return };
        let fixture = test_support::seed_room(&pool, 40).await;
        let storage = Arc::new(RecordingStorage::failing_on(2));

        let result = service(&pool, storage.clone())
            .submit(&fixture.student, &fixture.student_scope(), slot(&fixture, 9, 11), permit_and_proposal())
            .await;

        assert!(result.is_err());
        assert_eq!(bookings_in_room(&pool, fixture.room_id).await, (0, 0));
        assert_eq!(storage.stored().len(), 1);
        assert_eq!(storage.removed(), storage.stored());
    }

    #[tokio::test]
    async fn database_failure_rolls_back_and_removes_stored_files() {
        let Some(pool) = test_support::pool().await else { return };
        let fixture = test_support::seed_room(&pool, 40).await;
        // NUL no caminho: o INSERT do documento falha depois do INSERT da reserva.
        let storage = Arc::new(RecordingStorage::with_path_prefix("\0"));

        let result = service(&pool, storage.clone())
            .submit(&fixture.student, &fixture.student_scope(), slot(&fixture, 9, 11), permit_and_proposal())
            .await;

        assert!(result.is_err());
        assert_eq!(bookings_in_room(&pool, fixture.room_id).await, (0, 0));
        assert_eq!(storage.stored().len(), 2);
        assert_eq!(storage.removed(), storage.stored());
    }

    #[tokio::test]
    async fn overlap_with_approved_booking_blocks_submission_but_boundary_does_not() {
        let Some(pool) = test_support::pool().await else { return };
        let fixture = test_support::seed_room(&pool, 40).await;
        let bookings = service(&pool, Arc::new(RecordingStorage::default()));

        let approved = insert_pending(&pool, &fixture, 9, 11).await;
        bookings.approve(&fixture.admin, &fixture.admin_scope(), approved, None).await.unwrap();

        let overlapping = bookings
            .submit(&fixture.student, &fixture.student_scope(), slot(&fixture, 10, 12), permit_and_proposal())
            .await;
        assert!(matches!(overlapping, Err(AppError::SchedulingConflict(ConflictMode::Submission))));

        let adjacent = bookings
            .submit(&fixture.student, &fixture.student_scope(), slot(&fixture, 11, 13), permit_and_proposal())
            .await
            .unwrap();
        assert_eq!(adjacent.summary.booking.status, BookingStatus::Pending);
        assert_eq!(adjacent.documents.len(), 2);
    }

    #[tokio::test]
    async fn second_overlapping_approval_fails_and_stays_pending() {
        let Some(pool) = test_support::pool().await else { return };
        let fixture = test_support::seed_room(&pool, 40).await;
        let bookings = service(&pool, Arc::new(RecordingStorage::default()));

        let first = insert_pending(&pool, &fixture, 9, 11).await;
        let second = insert_pending(&pool, &fixture, 10, 12).await;

        let approved = bookings.approve(&fixture.admin, &fixture.admin_scope(), first, None).await.unwrap();
        assert_eq!(approved.summary.booking.status, BookingStatus::Approved);

        let result = bookings.approve(&fixture.admin, &fixture.admin_scope(), second, None).await;
        assert!(matches!(result, Err(AppError::SchedulingConflict(ConflictMode::Approval))));
        assert_eq!(status_of(&pool, second).await, BookingStatus::Pending);

        // Rejeitar não passa pela checagem de conflito
        let rejected = bookings
            .reject(&fixture.admin, &fixture.admin_scope(), second, "Jadwal bentrok")
            .await
            .unwrap();
        assert_eq!(rejected.summary.booking.status, BookingStatus::Rejected);
    }

    #[test]
    fn terminal_bookings_cannot_be_reviewed_again() {
        assert!(ensure_transition(BookingStatus::Pending, BookingStatus::Approved).is_ok());
        assert!(matches!(
            ensure_transition(BookingStatus::Rejected, BookingStatus::Approved),
            Err(AppError::InvalidTransition { from: BookingStatus::Rejected, to: BookingStatus::Approved })
        ));
        assert!(ensure_transition(BookingStatus::Approved, BookingStatus::Rejected).is_err());
    }
}
