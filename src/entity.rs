//! The normalized company record and its extraction from raw API payloads.
//!
//! [`Entity::from_raw`] is total: any combination of missing, null, or
//! wrongly-typed nested JSON degrades to field defaults instead of failing.
//! The only field that matters upstream is the BIN; entries without one are
//! discarded by the crawler before extraction.

use crate::soft::SoftValue;
use serde_json::Value;

/// One normalized company record.
///
/// Every non-identity field has a deterministic default so a record with
/// arbitrarily missing nested JSON is always fully constructible. An entity
/// is built once per detail-fetch cycle and is immutable afterwards; the
/// database is the sole durable owner after the upsert.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    /// Business identification number — the primary key
    pub bin: String,
    /// Company title, Russian
    pub title_ru: String,
    /// Company title, Kazakh
    pub title_kz: String,
    /// Registered address, Russian
    pub address_ru: String,
    /// Registered address, Kazakh
    pub address_kz: String,
    /// CEO full name
    pub ceo_name: String,
    /// CEO position title
    pub ceo_position: String,
    /// Primary OKED activity code
    pub primary_oked: String,
    /// Secondary OKED activity codes, input order preserved
    pub secondary_oked: Vec<String>,
    /// KATO territorial code
    pub kato_code: String,
    /// KATO territorial description
    pub kato_description: String,
    /// Registration date as reported by the registry
    pub registration_date: String,
    /// Status code
    pub status: String,
    /// Status description
    pub status_description: String,
    /// Whole years on the market
    pub years_on_market: i64,
    /// Remainder months on the market
    pub months_on_market: i64,
    /// Currently a VAT payer
    pub is_nds: bool,
    /// KRP enterprise-size code
    pub krp: String,
    /// KRP enterprise-size description
    pub krp_description: String,
    /// KFC ownership-form code
    pub kfc: String,
    /// KFC ownership-form description
    pub kfc_description: String,
    /// KSE economy-sector code
    pub kse: String,
    /// KSE economy-sector description
    pub kse_description: String,
    /// Legacy RNN tax number (not present in current payloads)
    pub rnn: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Company website
    pub website: String,
    /// Postal code
    pub postal_code: String,
    /// City name
    pub city: String,
    /// Street name
    pub street: String,
    /// Total tax-committee debt
    pub total_debt_kgd: f64,
    /// Total tax-committee fines
    pub total_fine_kgd: f64,
    /// Main tax-committee debt
    pub main_debt_kgd: f64,
    /// Total e-government-reported debt
    pub total_debt_egov: f64,
    /// Pension contribution debt
    pub pension_debt: f64,
    /// Medical insurance debt
    pub medical_debt: f64,
    /// Social insurance debt
    pub social_debt: f64,
    /// Count of registry violation records
    pub violation_count: i64,
    /// Count of registry warnings
    pub warning_count: i64,
    /// Listed in the inactive-companies registry
    pub in_inactive_registry: bool,
    /// Listed in the absent-at-address registry
    pub in_absent_registry: bool,
    /// Listed in the fake-companies registry
    pub in_fake_registry: bool,
    /// Listed in the bankruptcy registry
    pub in_bankrupt_registry: bool,
    /// Listed in the invalid-registration registry
    pub in_invalid_registry: bool,
    /// Listed in the tax-debtor registry
    pub in_tax_debtor_registry: bool,
    /// Marked unreliable by Samruk-Kazyna
    pub unreliable_samruk: bool,
    /// Marked unreliable for state procurement
    pub unreliable_gz: bool,
    /// Was a VAT payer at some point
    pub was_nds: bool,
    /// Number of filial branches
    pub filials_count: i64,
    /// Number of companies registered at the same address
    pub same_address_count: i64,
    /// Number of companies sharing the same CEO
    pub same_ceo_count: i64,
}

/// Walk a key path through nested objects, yielding `None` as soon as any
/// step is missing or the parent is not an object.
fn path<'a>(root: Option<&'a Value>, keys: &[&str]) -> Option<&'a Value> {
    let mut current = root?;
    for key in keys {
        current = current.get(key)?;
    }
    Some(current)
}

/// Extract a `(code, description)` classifier pair from nodes shaped like
/// `{"value": {"value": <code>, "description": <text>}}`.
fn code_pair(node: SoftValue<'_>) -> (String, String) {
    match node.unwrap_once() {
        SoftValue::Wrapper(inner) => (
            SoftValue::of(inner.get("value")).as_str(""),
            SoftValue::of(inner.get("description")).as_str(""),
        ),
        _ => (String::new(), String::new()),
    }
}

/// Pick the first entry of a contact list, preferring the procurement
/// contact block and falling back to the e-government one. Entries may be
/// bare scalars or `{"value": ...}` wrappers.
fn first_contact(primary: Option<&Value>, fallback: Option<&Value>, key: &str) -> String {
    fn pick<'a>(src: Option<&'a Value>, key: &str) -> Option<&'a Value> {
        src.and_then(|v| v.get(key))
            .and_then(Value::as_array)
            .and_then(|items| items.first())
    }

    match pick(primary, key).or_else(|| pick(fallback, key)) {
        Some(v) if v.is_object() => SoftValue::key(Some(v), "value").as_str(""),
        Some(v) => SoftValue::of(Some(v)).as_str(""),
        None => String::new(),
    }
}

impl Entity {
    /// Build an entity from a raw listing entry and an optional detail payload.
    ///
    /// When `detail` is `None` (the detail fetch failed), every
    /// detail-derived field keeps its type default and only listing-derived
    /// fields are populated — a valid, storable "listed but undetailed"
    /// record.
    pub fn from_raw(listing: &Value, detail: Option<&Value>) -> Self {
        let mut entity = Entity {
            bin: SoftValue::key(Some(listing), "bin").as_str(""),
            violation_count: SoftValue::key(Some(listing), "reestrViolationCount").as_i64(),
            warning_count: SoftValue::key(Some(listing), "warningCount").as_i64(),
            ..Default::default()
        };

        let basic = path(detail, &["basicInfo"]);

        entity.title_ru = SoftValue::key(basic, "titleRu").as_str("");
        entity.title_kz = SoftValue::key(basic, "titleKz").as_str("");
        entity.address_ru = SoftValue::key(basic, "addressRu").as_str("");
        entity.address_kz = SoftValue::key(basic, "addressKz").as_str("");

        // CEO arrives either as {"value": {"title", "position"}} or as a
        // bare scalar name
        match SoftValue::key(basic, "ceo").unwrap_once() {
            SoftValue::Wrapper(inner) => {
                entity.ceo_name = SoftValue::of(inner.get("title")).as_str("");
                entity.ceo_position = SoftValue::of(inner.get("position")).as_str("");
            }
            other => {
                entity.ceo_name = other.as_str("");
            }
        }

        entity.primary_oked = SoftValue::key(basic, "primaryOKED").as_str("");
        entity.secondary_oked = SoftValue::key(basic, "secondaryOKED").as_list();

        let (kato_code, kato_description) = code_pair(SoftValue::key(basic, "kato"));
        entity.kato_code = kato_code;
        entity.kato_description = kato_description;

        entity.registration_date = SoftValue::key(basic, "registrationDate").as_str("");

        let (status, status_description) = code_pair(SoftValue::key(basic, "status"));
        entity.status = status;
        entity.status_description = status_description;

        entity.years_on_market = SoftValue::of(path(basic, &["onMarket", "years"])).as_i64();
        entity.months_on_market = SoftValue::of(path(basic, &["onMarket", "months"])).as_i64();
        entity.is_nds = SoftValue::key(basic, "isNds").as_bool();

        let (krp, krp_description) = code_pair(SoftValue::key(basic, "krp"));
        entity.krp = krp;
        entity.krp_description = krp_description;

        let (kfc, kfc_description) = code_pair(SoftValue::key(basic, "kfc"));
        entity.kfc = kfc;
        entity.kfc_description = kfc_description;

        let (kse, kse_description) = code_pair(SoftValue::key(basic, "kse"));
        entity.kse = kse;
        entity.kse_description = kse_description;

        let gz_contacts = path(detail, &["gosZakupContacts"]);
        let egov_contacts = path(detail, &["egovContacts"]);
        entity.email = first_contact(gz_contacts, egov_contacts, "email");
        entity.phone = first_contact(gz_contacts, egov_contacts, "phone");

        entity.postal_code = SoftValue::key(basic, "postalCode").as_str("");
        entity.city = SoftValue::key(basic, "cityName").as_str("");
        entity.street = SoftValue::key(basic, "streetName").as_str("");

        let kgd = path(detail, &["debtsInfo", "kgd"]);
        let egov = path(detail, &["debtsInfo", "egov"]);
        entity.total_debt_kgd = SoftValue::key(kgd, "totalDebt").as_f64();
        entity.total_fine_kgd = SoftValue::key(kgd, "totalFine").as_f64();
        entity.main_debt_kgd = SoftValue::key(kgd, "totalMainDebt").as_f64();
        entity.total_debt_egov = SoftValue::key(egov, "totalDebt").as_f64();
        entity.pension_debt = SoftValue::key(egov, "totalPensionDebt").as_f64();
        entity.medical_debt = SoftValue::key(egov, "totalMedicalDebt").as_f64();
        entity.social_debt = SoftValue::key(egov, "totalSocialDebt").as_f64();

        entity.scan_violation_records(detail);

        entity.filials_count =
            SoftValue::of(path(detail, &["relatedCompanies", "filials", "total"])).as_i64();
        entity.same_address_count =
            SoftValue::of(path(detail, &["relatedCompanies", "sameAddress", "total"])).as_i64();
        entity.same_ceo_count =
            SoftValue::of(path(detail, &["relatedCompanies", "sameFio", "total"])).as_i64();

        entity
    }

    /// Derive registry-membership flags from the detail payload's violation
    /// records.
    ///
    /// Flags are monotonic within one construction: each matching record
    /// ORs its flag in, and nothing ever resets one. Violation-type codes
    /// outside 0..=5 are ignored; the three description substrings are
    /// checked independently of the code.
    fn scan_violation_records(&mut self, detail: Option<&Value>) {
        let Some(records) = path(detail, &["reestrs"]).and_then(Value::as_array) else {
            return;
        };

        for record in records {
            if !record.is_object() {
                continue;
            }

            if let Some(violation) = record.get("violation").and_then(Value::as_i64) {
                match violation {
                    0 => self.in_inactive_registry = true,
                    1 => self.in_absent_registry = true,
                    2 => self.in_tax_debtor_registry = true,
                    3 => self.in_bankrupt_registry = true,
                    4 => self.in_fake_registry = true,
                    5 => self.in_invalid_registry = true,
                    _ => {}
                }
            }

            let description = SoftValue::key(Some(record), "description").as_str("");
            if description.contains("Самрук-Қазына") {
                self.unreliable_samruk = true;
            }
            if description.contains("государственных закупок") {
                self.unreliable_gz = true;
            }
            if description.contains("Плательщик НДС") {
                self.was_nds = true;
            }
        }
    }

    /// True when the identity field is populated and the record may be
    /// persisted.
    pub fn has_identity(&self) -> bool {
        !self.bin.is_empty()
    }
}
