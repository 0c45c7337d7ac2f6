//! # Company Repository
//!
//! Customers and suppliers. Deleting a company keeps its documents and
//! clears their party reference.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use stockline_core::{new_id, Company, CompanyInput, CompanyKind};

use crate::error::{DbError, DbResult};

const COMPANY_COLUMNS: &str = "id, name, kind, contact_person, phone, email, address, \
     tax_number, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Companies by name. `side` narrows to customers or suppliers;
    /// companies of kind `both` appear on either side.
    pub async fn list(&self, side: Option<CompanyKind>) -> DbResult<Vec<Company>> {
        debug!(side = ?side, "Listing companies");

        let filter = match side {
            Some(CompanyKind::Customer) => "WHERE kind IN ('customer', 'both')",
            Some(CompanyKind::Supplier) => "WHERE kind IN ('supplier', 'both')",
            Some(CompanyKind::Both) => "WHERE kind = 'both'",
            None => "",
        };
        let sql = format!(
            "SELECT {} FROM companies {} ORDER BY name COLLATE NOCASE",
            COMPANY_COLUMNS, filter
        );
        Ok(sqlx::query_as::<_, Company>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS);
        Ok(sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: &str) -> DbResult<Company> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Company", id))
    }

    pub async fn create(&self, input: &CompanyInput) -> DbResult<Company> {
        let company = Company::from_input(new_id(), input, Utc::now())?;

        info!(id = %company.id, name = %company.name, "Creating company");

        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, kind, contact_person, phone, email, address,
                tax_number, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(company.kind)
        .bind(&company.contact_person)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.address)
        .bind(&company.tax_number)
        .bind(company.is_active)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn update(&self, id: &str, input: &CompanyInput) -> DbResult<Company> {
        let mut company = self.get(id).await?;
        company.apply_input(input, Utc::now())?;

        info!(id = %id, "Updating company");

        sqlx::query(
            r#"
            UPDATE companies SET
                name = ?2, kind = ?3, contact_person = ?4, phone = ?5, email = ?6,
                address = ?7, tax_number = ?8, is_active = ?9, updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(company.kind)
        .bind(&company.contact_person)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.address)
        .bind(&company.tax_number)
        .bind(company.is_active)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(company)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        info!(id = %id, "Deleting company");

        let result = sqlx::query("DELETE FROM companies WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Company", id));
        }
        Ok(())
    }
}
