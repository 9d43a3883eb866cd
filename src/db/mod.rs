//! Database layer for registry-harvester
//!
//! Handles SQLite persistence for the normalized company records.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`companies`] — Company upsert and query operations
//!
//! The store is keyed on the BIN; writes are whole-row `INSERT OR REPLACE`
//! so repeated upserts of the same entity converge to one identical row.
//! WAL journal mode keeps the table readable while a crawl is writing.

use crate::entity::Entity;
use sqlx::{sqlite::SqlitePool, FromRow};

mod companies;
mod migrations;

/// Raw company row as stored in SQLite.
///
/// Booleans are persisted as 0/1 integers and the secondary OKED list as
/// JSON text; [`From<CompanyRow>`](#impl-From%3CCompanyRow%3E-for-Entity)
/// converts back to the in-memory [`Entity`].
#[derive(Debug, Clone, FromRow)]
pub struct CompanyRow {
    /// Business identification number (primary key)
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
    /// Secondary OKED codes as a JSON array string
    pub secondary_oked: String,
    /// KATO territorial code
    pub kato_code: String,
    /// KATO territorial description
    pub kato_description: String,
    /// Registration date
    pub registration_date: String,
    /// Status code
    pub status: String,
    /// Status description
    pub status_description: String,
    /// Whole years on the market
    pub years_on_market: i64,
    /// Remainder months on the market
    pub months_on_market: i64,
    /// VAT payer flag (0/1)
    pub is_nds: i64,
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
    /// Legacy RNN tax number
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
    /// Inactive-companies registry flag (0/1)
    pub in_inactive_registry: i64,
    /// Absent-at-address registry flag (0/1)
    pub in_absent_registry: i64,
    /// Fake-companies registry flag (0/1)
    pub in_fake_registry: i64,
    /// Bankruptcy registry flag (0/1)
    pub in_bankrupt_registry: i64,
    /// Invalid-registration registry flag (0/1)
    pub in_invalid_registry: i64,
    /// Tax-debtor registry flag (0/1)
    pub in_tax_debtor_registry: i64,
    /// Samruk-Kazyna unreliability flag (0/1)
    pub unreliable_samruk: i64,
    /// State-procurement unreliability flag (0/1)
    pub unreliable_gz: i64,
    /// Former VAT payer flag (0/1)
    pub was_nds: i64,
    /// Number of filial branches
    pub filials_count: i64,
    /// Number of companies at the same address
    pub same_address_count: i64,
    /// Number of companies sharing the CEO
    pub same_ceo_count: i64,
}

impl From<CompanyRow> for Entity {
    fn from(row: CompanyRow) -> Self {
        // A hand-edited or corrupted list column degrades to empty rather
        // than failing the read
        let secondary_oked: Vec<String> =
            serde_json::from_str(&row.secondary_oked).unwrap_or_default();

        Entity {
            bin: row.bin,
            title_ru: row.title_ru,
            title_kz: row.title_kz,
            address_ru: row.address_ru,
            address_kz: row.address_kz,
            ceo_name: row.ceo_name,
            ceo_position: row.ceo_position,
            primary_oked: row.primary_oked,
            secondary_oked,
            kato_code: row.kato_code,
            kato_description: row.kato_description,
            registration_date: row.registration_date,
            status: row.status,
            status_description: row.status_description,
            years_on_market: row.years_on_market,
            months_on_market: row.months_on_market,
            is_nds: row.is_nds != 0,
            krp: row.krp,
            krp_description: row.krp_description,
            kfc: row.kfc,
            kfc_description: row.kfc_description,
            kse: row.kse,
            kse_description: row.kse_description,
            rnn: row.rnn,
            email: row.email,
            phone: row.phone,
            website: row.website,
            postal_code: row.postal_code,
            city: row.city,
            street: row.street,
            total_debt_kgd: row.total_debt_kgd,
            total_fine_kgd: row.total_fine_kgd,
            main_debt_kgd: row.main_debt_kgd,
            total_debt_egov: row.total_debt_egov,
            pension_debt: row.pension_debt,
            medical_debt: row.medical_debt,
            social_debt: row.social_debt,
            violation_count: row.violation_count,
            warning_count: row.warning_count,
            in_inactive_registry: row.in_inactive_registry != 0,
            in_absent_registry: row.in_absent_registry != 0,
            in_fake_registry: row.in_fake_registry != 0,
            in_bankrupt_registry: row.in_bankrupt_registry != 0,
            in_invalid_registry: row.in_invalid_registry != 0,
            in_tax_debtor_registry: row.in_tax_debtor_registry != 0,
            unreliable_samruk: row.unreliable_samruk != 0,
            unreliable_gz: row.unreliable_gz != 0,
            was_nds: row.was_nds != 0,
            filials_count: row.filials_count,
            same_address_count: row.same_address_count,
            same_ceo_count: row.same_ceo_count,
        }
    }
}

/// Database handle for registry-harvester
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
