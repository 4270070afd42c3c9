// src/models/booking.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    /// pending -> approved | rejected. Estados finais não têm saída.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Uuid,
    #[schema(example = "2025-06-01")]
    pub booking_date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "11:00:00")]
    pub end_time: NaiveTime,
    #[schema(example = "Seminar Nasional Teknik Sipil")]
    pub purpose: String,
    #[schema(example = 35)]
    pub number_of_participants: i32,
    pub status: BookingStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Reserva com nomes auxiliares (sala, solicitante, faculdade)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub booking: Booking,
    pub room_code: String,
    pub room_name: String,
    pub requester_name: String,
    pub faculty_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub id: Uuid,
    #[schema(example = "permit_letter")]
    pub slug: String,
    #[schema(example = "Surat Permohonan")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDocument {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub document_type_id: Uuid,
    pub file_path: String,
    #[schema(example = "surat_permohonan.pdf")]
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(flatten)]
    pub summary: BookingSummary,
    pub documents: Vec<BookingDocument>,
}

// ---
// Documentos aceitos no envio (campo do formulário -> slug do tipo)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    PermitLetter,
    Proposal,
    AttendanceList,
}

impl DocumentKind {
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "permit_letter" => Some(DocumentKind::PermitLetter),
            "proposal" => Some(DocumentKind::Proposal),
            "attendance_list" => Some(DocumentKind::AttendanceList),
            _ => None,
        }
    }

    /// Mesmo valor da coluna `document_types.slug`.
    pub fn slug(self) -> &'static str {
        match self {
            DocumentKind::PermitLetter => "permit_letter",
            DocumentKind::Proposal => "proposal",
            DocumentKind::AttendanceList => "attendance_list",
        }
    }
}

/// Arquivo recebido no multipart, ainda não gravado.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub kind: DocumentKind,
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

/// Dados de uma nova solicitação de reserva.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub purpose: String,
    pub number_of_participants: i32,
}

/// Submissão considera pending + approved; aprovação só approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictMode {
    Submission,
    Approval,
}

impl ConflictMode {
    /// Status que bloqueiam um novo horário neste modo.
    pub fn blocking_statuses(self) -> &'static [BookingStatus] {
        match self {
            ConflictMode::Submission => &[BookingStatus::Pending, BookingStatus::Approved],
            ConflictMode::Approval => &[BookingStatus::Approved],
        }
    }
}

// Linha mínima usada pelo verificador de conflitos
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct BookedSlot {
    pub id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookingListFilter {
    pub status: Option<BookingStatus>,
    pub room_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_either_terminal_state() {
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Approved));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Rejected));
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Pending.can_transition_to(BookingStatus::Pending));
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for from in [BookingStatus::Approved, BookingStatus::Rejected] {
            assert!(from.is_terminal());
            for to in [BookingStatus::Pending, BookingStatus::Approved, BookingStatus::Rejected] {
                assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn document_fields_map_to_type_slugs() {
        assert_eq!(DocumentKind::from_field("permit_letter"), Some(DocumentKind::PermitLetter));
        assert_eq!(DocumentKind::from_field("attendance_list").map(DocumentKind::slug), Some("attendance_list"));
        assert_eq!(DocumentKind::from_field("purpose"), None);
    }
}
