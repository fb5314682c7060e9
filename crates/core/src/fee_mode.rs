//! Derives single vs dual billing from the free-text fee-type summary.

use crate::domain::fee::{FeeMode, FeeType};

const PROLABORE_MARKER: &str = "prolabore";
const EXITO_MARKER: &str = "exito";

/// `Dual` iff the text mentions both Prolabore and Êxito. Accents, case and
/// separators inside "pró-labore" are ignored. Absent text is `Single`.
pub fn resolve(fee_type_summary: Option<&str>) -> FeeMode {
    let Some(text) = fee_type_summary else {
        return FeeMode::Single;
    };
    let normalized = normalize(text);
    if mentions_prolabore(&normalized) && normalized.contains(EXITO_MARKER) {
        FeeMode::Dual
    } else {
        FeeMode::Single
    }
}

/// Fee type billed by the lone payment step of a single-fee sale.
///
/// Only text naming Êxito without Prolabore selects `Exito`; anything else,
/// including empty text, bills Prolabore.
pub fn primary_fee_type(fee_type_summary: Option<&str>) -> FeeType {
    let normalized = fee_type_summary.map(normalize).unwrap_or_default();
    if normalized.contains(EXITO_MARKER) && !mentions_prolabore(&normalized) {
        FeeType::Exito
    } else {
        FeeType::Prolabore
    }
}

fn mentions_prolabore(normalized: &str) -> bool {
    let compact: String =
        normalized.chars().filter(|ch| !matches!(ch, '-' | '_' | ' ')).collect();
    compact.contains(PROLABORE_MARKER)
}

pub(crate) fn normalize(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).map(fold_diacritic).collect()
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{primary_fee_type, resolve};
    use crate::domain::fee::{FeeMode, FeeType};

    #[test]
    fn both_markers_select_dual() {
        assert_eq!(resolve(Some("Prolabore + Êxito")), FeeMode::Dual);
        assert_eq!(resolve(Some("PROLABORE e EXITO")), FeeMode::Dual);
        assert_eq!(resolve(Some("Pró-labore com êxito")), FeeMode::Dual);
    }

    #[test]
    fn one_marker_stays_single() {
        assert_eq!(resolve(Some("Prolabore")), FeeMode::Single);
        assert_eq!(resolve(Some("Êxito")), FeeMode::Single);
        assert_eq!(resolve(Some("Nenhum")), FeeMode::Single);
    }

    #[test]
    fn missing_or_empty_text_is_single() {
        assert_eq!(resolve(None), FeeMode::Single);
        assert_eq!(resolve(Some("")), FeeMode::Single);
        assert_eq!(resolve(Some("   ")), FeeMode::Single);
    }

    #[test]
    fn primary_fee_follows_the_only_marker() {
        assert_eq!(primary_fee_type(Some("Êxito")), FeeType::Exito);
        assert_eq!(primary_fee_type(Some("Prolabore")), FeeType::Prolabore);
        assert_eq!(primary_fee_type(Some("Prolabore + Êxito")), FeeType::Prolabore);
        assert_eq!(primary_fee_type(None), FeeType::Prolabore);
    }
}
