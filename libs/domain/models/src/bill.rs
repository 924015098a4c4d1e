// [libs/domain/models/src/bill.rs]
/*!
 * APARATO: BILL ENTITY (ESTRATO L2)
 * RESPONSABILIDAD: Representación soberana de un proyecto de ley y su
 * clave natural compuesta.
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Las ocho variantes de vehículo legislativo reconocidas por congress.gov.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    Hr,
    S,
    Hjres,
    Sjres,
    Hconres,
    Sconres,
    Hres,
    Sres,
}

impl BillType {
    /// Todas las variantes, en el orden en que la Orquestación las recorre.
    pub const ALL: [BillType; 8] = [
        BillType::Hr,
        BillType::S,
        BillType::Hjres,
        BillType::Sjres,
        BillType::Hconres,
        BillType::Sconres,
        BillType::Hres,
        BillType::Sres,
    ];

    /// Forma canónica usada tanto en la URL de congress.gov como en el
    /// almacén de persistencia.
    pub const fn as_str(self) -> &'static str {
        match self {
            BillType::Hr => "hr",
            BillType::S => "s",
            BillType::Hjres => "hjres",
            BillType::Sjres => "sjres",
            BillType::Hconres => "hconres",
            BillType::Sconres => "sconres",
            BillType::Hres => "hres",
            BillType::Sres => "sres",
        }
    }

    /// `true` si el tipo se origina en la Cámara de Representantes.
    pub const fn is_house(self) -> bool {
        matches!(
            self,
            BillType::Hr | BillType::Hjres | BillType::Hconres | BillType::Hres
        )
    }
}

impl fmt::Display for BillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBillTypeError(pub String);

impl fmt::Display for ParseBillTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized bill type: {}", self.0)
    }
}

impl std::error::Error for ParseBillTypeError {}

impl FromStr for BillType {
    type Err = ParseBillTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "hr" => Ok(BillType::Hr),
            "s" => Ok(BillType::S),
            "hjres" => Ok(BillType::Hjres),
            "sjres" => Ok(BillType::Sjres),
            "hconres" => Ok(BillType::Hconres),
            "sconres" => Ok(BillType::Sconres),
            "hres" => Ok(BillType::Hres),
            "sres" => Ok(BillType::Sres),
            other => Err(ParseBillTypeError(other.to_string())),
        }
    }
}

/// Etapa legislativa canónica. Los valores numéricos son estables y se
/// persisten tal cual; no reordenar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stage(pub i32);

impl Stage {
    pub const INTRODUCED: Stage = Stage(20);
    pub const IN_COMMITTEE: Stage = Stage(40);
    pub const PASSED_ONE_CHAMBER: Stage = Stage(60);
    pub const PASSED_BOTH_CHAMBERS: Stage = Stage(80);
    pub const VETOED: Stage = Stage(85);
    pub const TO_PRESIDENT: Stage = Stage(90);
    pub const SIGNED: Stage = Stage(95);
    pub const BECAME_LAW: Stage = Stage(100);

    /// La etiqueta textual canónica para esta etapa.
    pub fn description(self) -> &'static str {
        match self.0 {
            20 => "Introduced",
            40 => "InCommittee",
            60 => "PassedOneChamber",
            80 => "PassedBothChambers",
            85 => "Vetoed",
            90 => "ToPresident",
            95 => "Signed",
            100 => "BecameLaw",
            _ => "Unknown",
        }
    }
}

/// Identificador natural de un proyecto de ley: `concat(number, type, congress)`.
pub fn bill_id(congress: i32, bill_type: BillType, bill_number: i32) -> String {
    format!("{}{}{}", bill_number, bill_type.as_str(), congress)
}

/// Instantánea de la persona patrocinadora principal (`sponsors[0]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SponsorSnapshot {
    pub first_name: String,
    pub last_name: String,
    pub party: String,
    pub state: String,
}

/// La entidad primaria: un proyecto de ley y su estado de sincronización.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub bill_id: String,
    pub congress: i32,
    pub bill_type: BillType,
    pub bill_number: i32,

    pub title: String,
    pub title_without_number: String,
    pub introduced_date: String,

    pub sponsor: Option<SponsorSnapshot>,

    pub stage: i32,
    pub stage_description: String,

    /// 5-bit mask; `None` significa "legado, nunca calculado".
    pub synced_endpoints: Option<i32>,
    pub last_sync_attempt: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

/// Regex que identifica y recorta el designador inicial de un título,
/// p. ej. `H.R. 1234 - ` o `S.Con.Res. 9 – `.
pub const TITLE_DESIGNATOR_PATTERN: &str =
    r"^(H\.R\.|S\.|H\.J\.Res\.|S\.J\.Res\.|H\.Con\.Res\.|S\.Con\.Res\.|H\.Res\.|S\.Res\.)\s*\d+\s*[-–]\s*";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bill_id_concatenates_number_type_congress() {
        assert_eq!(bill_id(119, BillType::Hr, 1234), "1234hr119");
    }

    #[test]
    fn bill_type_round_trips_through_str() {
        for variant in BillType::ALL {
            assert_eq!(variant.as_str().parse::<BillType>().unwrap(), variant);
        }
    }

    #[test]
    fn house_classification_matches_chamber_of_origin() {
        assert!(BillType::Hr.is_house());
        assert!(BillType::Hjres.is_house());
        assert!(BillType::Hconres.is_house());
        assert!(BillType::Hres.is_house());
        assert!(!BillType::S.is_house());
        assert!(!BillType::Sjres.is_house());
        assert!(!BillType::Sconres.is_house());
        assert!(!BillType::Sres.is_house());
    }

    #[test]
    fn stage_description_matches_canonical_table() {
        assert_eq!(Stage::BECAME_LAW.description(), "BecameLaw");
        assert_eq!(Stage::VETOED.description(), "Vetoed");
        assert_eq!(Stage(20).description(), "Introduced");
    }
}
