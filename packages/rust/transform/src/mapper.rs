//! Raw row → canonical contact mapping.
//!
//! A pure transformation apart from the age derivation, which is computed
//! against an explicit per-run reference date rather than a wall-clock read,
//! so a run is reproducible and the fallback always reads the row being
//! mapped (never state left over from a previous row).

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use contactpipe_shared::{
    CONTACT_ORIGIN, CanonicalContact, ContactProperties, ID_PROPERTY_EMAIL, LEAD_STATUS_NEW,
    RawRow,
};

/// Source column headers, as they appear in the sheet's header row.
pub mod columns {
    pub const FILE_NO: &str = "File No";
    pub const PATIENT_NAME: &str = "Patient Name";
    pub const EMAIL: &str = "Email";
    pub const MOBILE: &str = "Mobile";
    pub const NATIONALITY: &str = "nationality";
    pub const GENDER: &str = "Gender";
    pub const DOB: &str = "DOB";
    pub const TREATMENT_NAME: &str = "treatment Name";
    pub const SHEET_AGE: &str = "pat_age_years";
    pub const DATE_REGISTERED: &str = "Date registered";
}

/// Expected date-of-birth format: day/month/4-digit-year.
pub const DOB_FORMAT: &str = "%d/%m/%Y";

/// Map one raw row into a canonical contact.
///
/// Direct string copies default to `""` when the column is absent. The two
/// classification fields are constants regardless of source content, and the
/// upsert descriptor keys the record by its email.
pub fn map_row(row: &RawRow<'_>, today: NaiveDate) -> CanonicalContact {
    let email = row.get(columns::EMAIL).to_string();

    CanonicalContact {
        properties: ContactProperties {
            contact_origin: CONTACT_ORIGIN.into(),
            file_no: row.get(columns::FILE_NO).into(),
            firstname: row.get(columns::PATIENT_NAME).into(),
            email: email.clone(),
            phone: row.get(columns::MOBILE).into(),
            nationality: row.get(columns::NATIONALITY).into(),
            gender: row.get(columns::GENDER).into(),
            date_of_birth: row.get(columns::DOB).into(),
            message: row.get(columns::TREATMENT_NAME).into(),
            patient_age_years: derive_age(row, today),
            date_registered: row.get(columns::DATE_REGISTERED).into(),
            hs_lead_status: LEAD_STATUS_NEW.into(),
            origin: CONTACT_ORIGIN.into(),
        },
        id: email,
        id_property: ID_PROPERTY_EMAIL.into(),
    }
}

/// Derive `patient_age_years` from the row's DOB column.
///
/// Falls back to the sheet-carried `pat_age_years` value (or `""`) when the
/// DOB does not parse. A computed age that differs from the carried value by
/// more than one year is a data-quality signal, surfaced as a warning and
/// nothing more.
fn derive_age(row: &RawRow<'_>, today: NaiveDate) -> String {
    let dob_raw = row.get(columns::DOB);
    let carried = row.get(columns::SHEET_AGE);

    match NaiveDate::parse_from_str(dob_raw.trim(), DOB_FORMAT) {
        Ok(dob) => {
            let age = age_on(dob, today);
            if let Ok(sheet_age) = carried.trim().parse::<i32>() {
                if (age - sheet_age).abs() > 1 {
                    warn!(
                        computed = age,
                        carried = sheet_age,
                        dob = dob_raw,
                        "computed age differs from sheet-carried value"
                    );
                }
            }
            age.to_string()
        }
        Err(_) => carried.to_string(),
    }
}

/// Whole years between `dob` and `today`, minus one if the birthday has not
/// yet occurred this year.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}
