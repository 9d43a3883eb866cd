//! Company upsert and query operations.

use crate::entity::Entity;
use crate::error::DatabaseError;
use crate::{Error, Result};

use super::{CompanyRow, Database};

/// All company columns, in schema order. Shared by the upsert column list
/// and the select projections so the two cannot drift apart.
const COMPANY_COLUMNS: &str = "bin, title_ru, title_kz, address_ru, address_kz, ceo_name, ceo_position, \
     primary_oked, secondary_oked, kato_code, kato_description, registration_date, \
     status, status_description, years_on_market, months_on_market, is_nds, \
     krp, krp_description, kfc, kfc_description, kse, kse_description, rnn, \
     email, phone, website, postal_code, city, street, \
     total_debt_kgd, total_fine_kgd, main_debt_kgd, total_debt_egov, pension_debt, medical_debt, social_debt, \
     violation_count, warning_count, \
     in_inactive_registry, in_absent_registry, in_fake_registry, in_bankrupt_registry, \
     in_invalid_registry, in_tax_debtor_registry, unreliable_samruk, unreliable_gz, was_nds, \
     filials_count, same_address_count, same_ceo_count";

impl Database {
    /// Insert or fully replace a company record keyed by BIN.
    ///
    /// The write is a single atomic statement: either the whole new row
    /// lands, or the previous row is left untouched. Repeated upserts of
    /// an unchanged entity converge to the same stored state.
    pub async fn upsert_company(&self, entity: &Entity) -> Result<()> {
        let secondary_oked = serde_json::to_string(&entity.secondary_oked)?;

        let placeholders = vec!["?"; COMPANY_COLUMNS.split(',').count()].join(", ");
        let query = format!(
            "INSERT OR REPLACE INTO companies ({}) VALUES ({})",
            COMPANY_COLUMNS, placeholders
        );

        sqlx::query(&query)
            .bind(&entity.bin)
            .bind(&entity.title_ru)
            .bind(&entity.title_kz)
            .bind(&entity.address_ru)
            .bind(&entity.address_kz)
            .bind(&entity.ceo_name)
            .bind(&entity.ceo_position)
            .bind(&entity.primary_oked)
            .bind(&secondary_oked)
            .bind(&entity.kato_code)
            .bind(&entity.kato_description)
            .bind(&entity.registration_date)
            .bind(&entity.status)
            .bind(&entity.status_description)
            .bind(entity.years_on_market)
            .bind(entity.months_on_market)
            .bind(i64::from(entity.is_nds))
            .bind(&entity.krp)
            .bind(&entity.krp_description)
            .bind(&entity.kfc)
            .bind(&entity.kfc_description)
            .bind(&entity.kse)
            .bind(&entity.kse_description)
            .bind(&entity.rnn)
            .bind(&entity.email)
            .bind(&entity.phone)
            .bind(&entity.website)
            .bind(&entity.postal_code)
            .bind(&entity.city)
            .bind(&entity.street)
            .bind(entity.total_debt_kgd)
            .bind(entity.total_fine_kgd)
            .bind(entity.main_debt_kgd)
            .bind(entity.total_debt_egov)
            .bind(entity.pension_debt)
            .bind(entity.medical_debt)
            .bind(entity.social_debt)
            .bind(entity.violation_count)
            .bind(entity.warning_count)
            .bind(i64::from(entity.in_inactive_registry))
            .bind(i64::from(entity.in_absent_registry))
            .bind(i64::from(entity.in_fake_registry))
            .bind(i64::from(entity.in_bankrupt_registry))
            .bind(i64::from(entity.in_invalid_registry))
            .bind(i64::from(entity.in_tax_debtor_registry))
            .bind(i64::from(entity.unreliable_samruk))
            .bind(i64::from(entity.unreliable_gz))
            .bind(i64::from(entity.was_nds))
            .bind(entity.filials_count)
            .bind(entity.same_address_count)
            .bind(entity.same_ceo_count)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to upsert company {}: {}",
                    entity.bin, e
                )))
            })?;

        Ok(())
    }

    /// Get a company by BIN
    pub async fn get_company(&self, bin: &str) -> Result<Option<Entity>> {
        let query = format!("SELECT {} FROM companies WHERE bin = ?", COMPANY_COLUMNS);

        let row = sqlx::query_as::<_, CompanyRow>(&query)
            .bind(bin)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get company: {}",
                    e
                )))
            })?;

        Ok(row.map(Entity::from))
    }

    /// List all stored companies
    pub async fn list_companies(&self) -> Result<Vec<Entity>> {
        let query = format!("SELECT {} FROM companies ORDER BY bin ASC", COMPANY_COLUMNS);

        let rows = sqlx::query_as::<_, CompanyRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list companies: {}",
                    e
                )))
            })?;

        Ok(rows.into_iter().map(Entity::from).collect())
    }

    /// Count stored companies
    pub async fn count_companies(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count companies: {}",
                    e
                )))
            })?;

        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::COMPANY_COLUMNS;

    #[test]
    fn test_column_list_matches_bind_count() {
        // upsert_company emits one placeholder per column and chains one
        // bind per Entity field; all three counts must stay in lockstep
        assert_eq!(COMPANY_COLUMNS.split(',').count(), 51);
    }
}
