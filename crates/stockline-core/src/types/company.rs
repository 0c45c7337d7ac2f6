use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::validation;

/// Which side of a trade a company appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CompanyKind {
    Customer,
    Supplier,
    #[default]
    Both,
}

impl CompanyKind {
    pub fn is_customer(&self) -> bool {
        matches!(self, CompanyKind::Customer | CompanyKind::Both)
    }

    pub fn is_supplier(&self) -> bool {
        matches!(self, CompanyKind::Supplier | CompanyKind::Both)
    }
}

/// A trading party: customer on sales documents, supplier on purchases.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub kind: CompanyKind,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_number: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Create / edit payload for a company.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompanyInput {
    pub name: String,
    #[serde(default)]
    pub kind: CompanyKind,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CompanyInput {
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::required("company name").into());
        }
        if self.name.trim().len() > 200 {
            return Err(ValidationError::TooLong {
                field: "company name".to_string(),
                max: 200,
            }
            .into());
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            validation::validate_email(email)?;
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Company {
    pub fn from_input(id: String, input: &CompanyInput, now: DateTime<Utc>) -> CoreResult<Self> {
        input.validate()?;
        Ok(Company {
            id,
            name: input.name.trim().to_string(),
            kind: input.kind,
            contact_person: non_blank(&input.contact_person),
            phone: non_blank(&input.phone),
            email: non_blank(&input.email),
            address: non_blank(&input.address),
            tax_number: non_blank(&input.tax_number),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_input(&mut self, input: &CompanyInput, now: DateTime<Utc>) -> CoreResult<()> {
        input.validate()?;
        self.name = input.name.trim().to_string();
        self.kind = input.kind;
        self.contact_person = non_blank(&input.contact_person);
        self.phone = non_blank(&input.phone);
        self.email = non_blank(&input.email);
        self.address = non_blank(&input.address);
        self.tax_number = non_blank(&input.tax_number);
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_from_input_trims_blanks() {
        let input = CompanyInput {
            name: "  Hill Traders ".to_string(),
            kind: CompanyKind::Supplier,
            contact_person: Some("   ".to_string()),
            phone: Some(" 0300 1234567 ".to_string()),
            email: None,
            address: None,
            tax_number: None,
            is_active: None,
        };
        let company = Company::from_input("c1".to_string(), &input, Utc::now()).unwrap();
        assert_eq!(company.name, "Hill Traders");
        assert_eq!(company.contact_person, None);
        assert_eq!(company.phone.as_deref(), Some("0300 1234567"));
        assert!(company.kind.is_supplier());
        assert!(!company.kind.is_customer());
        assert!(company.is_active);
    }

    #[test]
    fn test_company_rejects_bad_email() {
        let input = CompanyInput {
            name: "Hill Traders".to_string(),
            kind: CompanyKind::Both,
            contact_person: None,
            phone: None,
            email: Some("not-an-email".to_string()),
            address: None,
            tax_number: None,
            is_active: None,
        };
        assert!(Company::from_input("c1".to_string(), &input, Utc::now()).is_err());
    }
}
