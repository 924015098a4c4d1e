// [libs/domain/models/src/endpoint_bits.rs]
/*!
 * APARATO: ENDPOINT BITMASK (ESTRATO L2)
 * RESPONSABILIDAD: Codificación de qué sub-endpoints de un Bill ya se
 * sincronizaron. Cinco bits, 31 = completo.
 */

pub const DETAIL: i32 = 1;
pub const ACTIONS: i32 = 2;
pub const SUBJECTS: i32 = 4;
pub const SUMMARIES: i32 = 8;
pub const TEXT: i32 = 16;

/// Máscara que representa "todos los sub-endpoints sincronizados".
pub const COMPLETE: i32 = DETAIL | ACTIONS | SUBJECTS | SUMMARIES | TEXT;

/// `true` si la máscara indica sincronización completa (`== 31`).
pub const fn is_complete(mask: i32) -> bool {
    mask == COMPLETE
}

/// Calcula la máscara "desde los datos": un bit por tabla hija no vacía,
/// más el bit de detalle si el Bill existe (su existencia ya implica que
/// el detalle fue observado alguna vez).
pub fn from_child_presence(
    has_actions: bool,
    has_subject: bool,
    has_summary: bool,
    has_text: bool,
) -> i32 {
    let mut mask = DETAIL;
    if has_actions {
        mask |= ACTIONS;
    }
    if has_subject {
        mask |= SUBJECTS;
    }
    if has_summary {
        mask |= SUMMARIES;
    }
    if has_text {
        mask |= TEXT;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_mask_equals_thirty_one() {
        assert_eq!(COMPLETE, 31);
        assert!(is_complete(31));
        assert!(!is_complete(19));
    }

    #[test]
    fn from_child_presence_always_sets_detail() {
        assert_eq!(from_child_presence(false, false, false, false), DETAIL);
        assert_eq!(
            from_child_presence(true, false, false, true),
            DETAIL | ACTIONS | TEXT
        );
        assert_eq!(from_child_presence(true, true, true, true), COMPLETE);
    }
}
