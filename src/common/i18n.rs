// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LOCALE: &str = "id";
const FALLBACK_LOCALE: &str = "en";
pub const SUPPORTED_LOCALES: &[&str] = &["id", "en"];

const ID_MESSAGES: &[(&str, &str)] = &[
    ("error.validation", "Satu atau lebih isian tidak valid."),
    ("error.not_found", "Data tidak ditemukan."),
    ("error.unique", "Data dengan nilai tersebut sudah ada."),
    ("error.in_use", "Data masih digunakan dan tidak dapat dihapus."),
    ("error.internal", "Terjadi kesalahan yang tidak terduga."),
    ("booking.conflict_submission", "Jadwal bentrok: ruangan sudah dipesan pada waktu tersebut."),
    ("booking.conflict_approval", "Jadwal bentrok: sudah ada peminjaman yang disetujui pada waktu tersebut."),
    ("booking.invalid_transition", "Peminjaman ini sudah diproses."),
    ("scope.forbidden", "Anda tidak memiliki akses."),
    ("scope.reselect", "Silakan pilih fakultas terlebih dahulu."),
    ("auth.missing_capability", "Peran Anda tidak diizinkan melakukan tindakan ini."),
    ("auth.invalid_credentials", "Email atau kata sandi salah."),
    ("auth.invalid_token", "Token autentikasi tidak valid atau tidak ada."),
    ("auth.inactive", "Akun Anda tidak aktif."),
    ("auth.user_not_found", "Pengguna tidak ditemukan."),
    ("validation.required", "Wajib diisi."),
    ("validation.email", "Format email tidak valid."),
    ("validation.password_length", "Kata sandi minimal 6 karakter."),
    ("validation.invalid_value", "Nilai tidak valid."),
    ("validation.name_required", "Nama wajib diisi."),
    ("validation.purpose_required", "Keperluan wajib diisi."),
    ("validation.time_window", "Jam selesai harus setelah jam mulai."),
    ("validation.past_date", "Tanggal tidak boleh di masa lalu."),
    ("validation.participants", "Jumlah peserta minimal 1."),
    ("validation.capacity_exceeded", "Jumlah peserta melebihi kapasitas ruangan."),
    ("validation.capacity", "Kapasitas harus lebih dari 0."),
    ("validation.permit_letter_required", "Surat permohonan wajib diunggah."),
    ("validation.file_type", "Jenis berkas tidak didukung."),
    ("validation.file_too_large", "Ukuran berkas terlalu besar."),
    ("validation.duplicate_document", "Berkas ini sudah diunggah."),
    ("validation.quantity_positive", "Jumlah harus bilangan bulat positif."),
    ("validation.notes_required", "Catatan wajib diisi (maksimal 1000 karakter)."),
    ("validation.date_range", "Tanggal akhir harus sama atau setelah tanggal awal."),
];

const EN_MESSAGES: &[(&str, &str)] = &[
    ("error.validation", "One or more fields are invalid."),
    ("error.not_found", "Resource not found."),
    ("error.unique", "A record with this value already exists."),
    ("error.in_use", "The record is still in use and cannot be deleted."),
    ("error.internal", "An unexpected error occurred."),
    ("booking.conflict_submission", "Scheduling conflict: the room is already booked for this time."),
    ("booking.conflict_approval", "Scheduling conflict: a conflicting approved booking exists."),
    ("booking.invalid_transition", "This booking has already been reviewed."),
    ("scope.forbidden", "Forbidden."),
    ("scope.reselect", "Please select a faculty first."),
    ("auth.missing_capability", "Your role is not allowed to perform this action."),
    ("auth.invalid_credentials", "Invalid email or password."),
    ("auth.invalid_token", "Authentication token is invalid or missing."),
    ("auth.inactive", "Your account is inactive."),
    ("auth.user_not_found", "User not found."),
    ("validation.required", "This field is required."),
    ("validation.email", "Invalid email address."),
    ("validation.password_length", "Password must be at least 6 characters."),
    ("validation.invalid_value", "Invalid value."),
    ("validation.name_required", "Name is required."),
    ("validation.purpose_required", "Purpose is required."),
    ("validation.time_window", "End time must be after start time."),
    ("validation.past_date", "Date cannot be in the past."),
    ("validation.participants", "At least one participant is required."),
    ("validation.capacity_exceeded", "Participants exceed the room capacity."),
    ("validation.capacity", "Capacity must be greater than 0."),
    ("validation.permit_letter_required", "The permit letter is required."),
    ("validation.file_type", "Unsupported file type."),
    ("validation.file_too_large", "File is too large."),
    ("validation.duplicate_document", "This document was already uploaded."),
    ("validation.quantity_positive", "Quantity must be a positive integer."),
    ("validation.notes_required", "Notes are required (max 1000 characters)."),
    ("validation.date_range", "End date must be on or after the start date."),
];

// Catálogos de mensagens por idioma
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("id", ID_MESSAGES.iter().copied().collect());
        catalogs.insert("en", EN_MESSAGES.iter().copied().collect());
        Self { catalogs }
    }

    pub fn supports(lang: &str) -> bool {
        SUPPORTED_LOCALES.contains(&lang)
    }

    /// Idioma pedido -> inglês -> a própria chave.
    pub fn translate<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        [lang, FALLBACK_LOCALE]
            .iter()
            .filter_map(|l| self.catalogs.get(*l))
            .find_map(|catalog| catalog.get(key).copied())
            .unwrap_or(key)
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_have_the_same_keys() {
        let store = I18nStore::new();
        let id = &store.catalogs["id"];
        let en = &store.catalogs["en"];
        for key in en.keys() {
            assert!(id.contains_key(key), "missing id translation for {key}");
        }
        assert_eq!(id.len(), en.len());
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "scope.forbidden"), "Forbidden.");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("id", "custom.message"), "custom.message");
    }
}
