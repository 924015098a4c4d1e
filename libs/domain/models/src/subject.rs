// [libs/domain/models/src/subject.rs]
/*!
 * APARATO: BILL SUBJECT ENTITY (ESTRATO L2)
 */

use serde::{Deserialize, Serialize};

/// El área de política de un Bill. A lo sumo una por Bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSubject {
    pub bill_id: String,
    pub policy_area_name: String,
    pub policy_area_update_date: Option<String>,
}
