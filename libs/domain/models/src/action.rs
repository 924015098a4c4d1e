// [libs/domain/models/src/action.rs]
/*!
 * APARATO: BILL ACTION ENTITY (ESTRATO L2)
 */

use serde::{Deserialize, Serialize};

/// Una entrada en el historial de acciones de un Bill. Clave compuesta
/// `(bill_id, action_date, action_code)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillAction {
    pub bill_id: String,
    pub action_code: String,
    pub action_date: String,
    pub source_system_code: Option<i32>,
    pub source_system_name: Option<String>,
    pub text: String,
    pub action_type: Option<String>,
}
