//! Repository-supplied inputs bundled for one import run

use std::collections::HashMap;

use super::account::Account;
use super::currency::Currency;
use super::ids::{AccountId, CurrencyId, TimezoneId};
use super::mapping::CsvAccountMapping;
use super::timezone::Timezone;
use super::transfer::ExistingTransferInfo;

/// Immutable view of the application state an import runs against
///
/// The engine never talks to storage. The caller loads whatever the run
/// needs, builds a snapshot, and hands it over; [`ImportSnapshot::build`]
/// applies the normalizations the lookup paths rely on.
#[derive(Debug, Clone, Default)]
pub struct ImportSnapshot {
    accounts_by_name: HashMap<String, AccountId>,
    currencies_by_id: HashMap<CurrencyId, Currency>,
    currencies_by_code: HashMap<String, CurrencyId>,
    timezones_by_id: HashMap<TimezoneId, Timezone>,
    timezones_by_name: HashMap<String, TimezoneId>,
    account_mappings: Vec<CsvAccountMapping>,
    existing_transfers: Vec<ExistingTransferInfo>,
}

impl ImportSnapshot {
    /// Assemble a snapshot, normalizing the lookup tables
    ///
    /// Currency codes key case-insensitively through their uppercase form.
    /// Account mappings are sorted ascending by id so that earlier mappings
    /// win ties. When two accounts share a name the first one keeps it.
    pub fn build(
        accounts: Vec<Account>,
        currencies: Vec<Currency>,
        timezones: Vec<Timezone>,
        mut account_mappings: Vec<CsvAccountMapping>,
        existing_transfers: Vec<ExistingTransferInfo>,
    ) -> Self {
        let mut accounts_by_name = HashMap::with_capacity(accounts.len());
        for account in accounts {
            accounts_by_name.entry(account.name).or_insert(account.id);
        }

        let mut currencies_by_id = HashMap::with_capacity(currencies.len());
        let mut currencies_by_code = HashMap::with_capacity(currencies.len());
        for currency in currencies {
            currencies_by_code
                .entry(Currency::normalize_code(&currency.code))
                .or_insert(currency.id);
            currencies_by_id.insert(currency.id, currency);
        }

        let mut timezones_by_id = HashMap::with_capacity(timezones.len());
        let mut timezones_by_name = HashMap::with_capacity(timezones.len());
        for timezone in timezones {
            timezones_by_name
                .entry(timezone.name.clone())
                .or_insert(timezone.id);
            timezones_by_id.insert(timezone.id, timezone);
        }

        account_mappings.sort_by_key(|m| m.id);

        Self {
            accounts_by_name,
            currencies_by_id,
            currencies_by_code,
            timezones_by_id,
            timezones_by_name,
            account_mappings,
            existing_transfers,
        }
    }

    /// Account id for an exact, case-sensitive name
    pub fn account_id_by_name(&self, name: &str) -> Option<AccountId> {
        self.accounts_by_name.get(name).copied()
    }

    pub fn currency(&self, id: CurrencyId) -> Option<&Currency> {
        self.currencies_by_id.get(&id)
    }

    /// Currency by ISO code, case-insensitive
    pub fn currency_by_code(&self, code: &str) -> Option<&Currency> {
        let id = self.currencies_by_code.get(&Currency::normalize_code(code))?;
        self.currencies_by_id.get(id)
    }

    pub fn timezone(&self, id: TimezoneId) -> Option<&Timezone> {
        self.timezones_by_id.get(&id)
    }

    /// Timezone by exact zone name
    pub fn timezone_by_name(&self, name: &str) -> Option<&Timezone> {
        let id = self.timezones_by_name.get(name)?;
        self.timezones_by_id.get(id)
    }

    /// Persisted mappings, ascending by id
    pub fn account_mappings(&self) -> &[CsvAccountMapping] {
        &self.account_mappings
    }

    /// Stored transfers the batch is compared against, in storage order
    pub fn existing_transfers(&self) -> &[ExistingTransferInfo] {
        &self.existing_transfers
    }
}
