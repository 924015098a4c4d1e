// [libs/domain/models/src/summary.rs]
/*!
 * APARATO: BILL SUMMARY ENTITY (ESTRATO L2)
 */

use serde::{Deserialize, Serialize};

/// Resumen legislativo de una versión particular del Bill. Clave
/// compuesta `(bill_id, version_code)`. Un resumen entrante reemplaza al
/// almacenado solo si su `update_date` es estrictamente posterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSummary {
    pub bill_id: String,
    pub version_code: String,
    pub action_date: String,
    pub action_desc: String,
    pub text: String,
    pub update_date: String,
}
