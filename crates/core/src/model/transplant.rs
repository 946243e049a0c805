use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tcth_types::NonEmptyText;

use crate::constants::DISCHARGED_TRANSPLANT_STATUS;

/// A transplant procedure.
///
/// `patient_id` is a soft reference: nothing checks that the patient exists, and
/// projections substitute a placeholder when it does not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transplant {
    pub id: NonEmptyText,
    pub patient_id: String,
    pub donor_type: String,
    pub graft_source: String,
    pub conditioning: String,
    pub infusion_date: NaiveDate,
    pub engraftment_date: Option<NaiveDate>,
    pub cmv_status: String,
    pub aboi: String,
    pub status: String,
}

impl Transplant {
    pub fn is_engrafted(&self) -> bool {
        self.engraftment_date.is_some()
    }

    pub fn is_discharged(&self) -> bool {
        self.status == DISCHARGED_TRANSPLANT_STATUS
    }
}
