//! # Settings Repository
//!
//! Single-row business configuration (shop identity, tax, store-credit
//! policy, receipt text). Absent row means factory defaults.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use corner_core::BusinessSettings;

#[derive(Debug, sqlx::FromRow)]
struct SettingsRow {
    shop_name: String,
    shop_address: String,
    currency_symbol: String,
    tax_enabled: bool,
    tax_rate_bps: u32,
    allow_negative_balance: bool,
    receipt_header: String,
    receipt_footer: String,
}

impl SettingsRow {
    fn into_settings(self) -> DbResult<BusinessSettings> {
        let shop_address: Vec<String> = serde_json::from_str(&self.shop_address)?;
        Ok(BusinessSettings {
            shop_name: self.shop_name,
            shop_address,
            currency_symbol: self.currency_symbol,
            tax_enabled: self.tax_enabled,
            tax_rate_bps: self.tax_rate_bps,
            allow_negative_balance: self.allow_negative_balance,
            receipt_header: self.receipt_header,
            receipt_footer: self.receipt_footer,
        })
    }
}

/// Repository for the business settings row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the business settings, falling back to defaults when the shop
    /// has never saved any.
    pub async fn get(&self) -> DbResult<BusinessSettings> {
        debug!("Loading business settings");

        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT shop_name, shop_address, currency_symbol, tax_enabled, \
                    tax_rate_bps, allow_negative_balance, receipt_header, \
                    receipt_footer \
             FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_settings(),
            None => Ok(BusinessSettings::default()),
        }
    }

    /// Saves the business settings (upsert on the single row).
    pub async fn save(&self, settings: &BusinessSettings) -> DbResult<()> {
        info!(shop = %settings.shop_name, "Saving business settings");

        let shop_address = serde_json::to_string(&settings.shop_address)?;

        sqlx::query(
            "INSERT INTO settings (\
                id, shop_name, shop_address, currency_symbol, tax_enabled, \
                tax_rate_bps, allow_negative_balance, receipt_header, \
                receipt_footer, updated_at\
             ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(id) DO UPDATE SET \
                shop_name = ?1, shop_address = ?2, currency_symbol = ?3, \
                tax_enabled = ?4, tax_rate_bps = ?5, \
                allow_negative_balance = ?6, receipt_header = ?7, \
                receipt_footer = ?8, updated_at = ?9",
        )
        .bind(&settings.shop_name)
        .bind(&shop_address)
        .bind(&settings.currency_symbol)
        .bind(settings.tax_enabled)
        .bind(settings.tax_rate_bps)
        .bind(settings.allow_negative_balance)
        .bind(&settings.receipt_header)
        .bind(&settings.receipt_footer)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
