// src/services/facility_naming.rs
//
// Geração de código e unidade padrão para facilidades novas.
// Heurística de carga inicial: fica atrás de um trait para ser trocada.

use std::collections::HashSet;

use crate::models::facility::FacilityUnit;

pub trait FacilityNaming: Send + Sync {
    /// Código base (antes de resolver colisões).
    fn base_code(&self, name: &str) -> String;

    /// Unidade padrão, decidida só na criação.
    fn infer_unit(&self, name: &str) -> FacilityUnit;
}

const FALLBACK_CODE: &str = "FAC";

/// Iniciais das palavras; nome de uma palavra só usa os dois primeiros caracteres.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordNaming;

impl FacilityNaming for KeywordNaming {
    fn base_code(&self, name: &str) -> String {
        let words: Vec<Vec<char>> = name
            .split_whitespace()
            .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<Vec<_>>())
            .filter(|w| !w.is_empty())
            .collect();

        let take = if words.len() == 1 { 2 } else { 1 };
        let code: String = words
            .iter()
            .flat_map(|w| w.iter().take(take))
            .flat_map(|c| c.to_uppercase())
            .collect();

        if code.is_empty() { FALLBACK_CODE.to_string() } else { code }
    }

    fn infer_unit(&self, name: &str) -> FacilityUnit {
        let lower = name.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has(&["kursi", "meja"]) {
            FacilityUnit::Piece
        } else if has(&["lab", "set"]) {
            FacilityUnit::Set
        } else if has(&["meter"]) {
            FacilityUnit::Meter
        } else {
            FacilityUnit::Unit
        }
    }
}

/// `base`, depois `base1`, `base2`, ... até achar um código livre.
pub fn next_available_code(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1u32..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn single_word_uses_two_letters() {
        assert_eq!(KeywordNaming.base_code("AC"), "AC");
        assert_eq!(KeywordNaming.base_code("proyektor"), "PR");
    }

    #[test]
    fn multi_word_uses_initials() {
        assert_eq!(KeywordNaming.base_code("Meja Rapat"), "MR");
        assert_eq!(KeywordNaming.base_code("Audio Control"), "AC");
        assert_eq!(KeywordNaming.base_code("  Papan   tulis  putih "), "PTP");
    }

    #[test]
    fn punctuation_is_ignored() {
        assert_eq!(KeywordNaming.base_code("Proyektor (LCD)"), "PL");
        assert_eq!(KeywordNaming.base_code("---"), FALLBACK_CODE);
    }

    #[test]
    fn colliding_codes_get_numeric_suffix() {
        assert_eq!(next_available_code("AC", &taken(&[])), "AC");
        assert_eq!(next_available_code("AC", &taken(&["AC"])), "AC1");
        assert_eq!(next_available_code("AC", &taken(&["AC", "AC1", "AC2"])), "AC3");
        assert_eq!(next_available_code("AC", &taken(&["AC", "AC2"])), "AC1");
    }

    #[test]
    fn ac_then_audio_control_yields_distinct_codes() {
        let mut codes = taken(&[]);
        let first = next_available_code(&KeywordNaming.base_code("AC"), &codes);
        codes.insert(first.clone());
        let second = next_available_code(&KeywordNaming.base_code("Audio Control"), &codes);
        assert_eq!(first, "AC");
        assert_eq!(second, "AC1");
    }

    #[test]
    fn unit_is_inferred_from_keywords() {
        assert_eq!(KeywordNaming.infer_unit("Kursi Lipat"), FacilityUnit::Piece);
        assert_eq!(KeywordNaming.infer_unit("MEJA Rapat"), FacilityUnit::Piece);
        assert_eq!(KeywordNaming.infer_unit("Peralatan Lab Kimia"), FacilityUnit::Set);
        assert_eq!(KeywordNaming.infer_unit("Sound System Set"), FacilityUnit::Set);
        assert_eq!(KeywordNaming.infer_unit("Kabel 10 Meter"), FacilityUnit::Meter);
        assert_eq!(KeywordNaming.infer_unit("Proyektor"), FacilityUnit::Unit);
    }
}
