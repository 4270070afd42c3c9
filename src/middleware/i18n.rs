// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::{I18nStore, DEFAULT_LOCALE};

// Idioma preferido do cliente (primeira tag suportada do Accept-Language)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_header(value: Option<&str>) -> Self {
        let lang = value
            .map(accept_language::parse)
            .unwrap_or_default()
            .into_iter()
            .map(|tag| {
                // "en-US" -> "en"
                tag.split('-').next().unwrap_or(&tag).to_ascii_lowercase()
            })
            .find(|lang| I18nStore::supports(lang))
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        Locale(lang)
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok());

        Ok(Locale::from_header(header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_indonesian() {
        assert_eq!(Locale::from_header(None).0, "id");
        assert_eq!(Locale::from_header(Some("fr-FR")).0, "id");
    }

    #[test]
    fn picks_first_supported_language() {
        assert_eq!(Locale::from_header(Some("en-US,en;q=0.9")).0, "en");
        assert_eq!(Locale::from_header(Some("fr;q=0.9,id;q=0.8")).0, "id");
    }
}
