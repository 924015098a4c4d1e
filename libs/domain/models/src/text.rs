// [libs/domain/models/src/text.rs]
/*!
 * APARATO: BILL TEXT ENTITY (ESTRATO L2)
 */

use serde::{Deserialize, Serialize};

/// Una versión de texto de un Bill. Clave compuesta `(bill_id, date, type)`.
/// Inmutable una vez almacenada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillText {
    pub bill_id: String,
    pub date: String,
    pub version_type: String,
    pub text_url: Option<String>,
    pub pdf_url: Option<String>,
}
