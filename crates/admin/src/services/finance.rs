//! Derived finance views. Nothing here is cached: every call reads the
//! books from the data store and joins dog details from the roster.

use kennel_core::finance::{join_purchases, join_sales};
use kennel_core::{Expense, FinancialSummary, Purchase, PurchaseView, Sale, SaleView};
use tracing::instrument;

use super::{ServiceError, flag};
use crate::db::{DataClient, ListQuery, Repository};
use crate::store::StoreHandle;

pub struct FinanceService<'a> {
    data: &'a DataClient,
    store: &'a StoreHandle,
}

impl<'a> FinanceService<'a> {
    #[must_use]
    pub const fn new(data: &'a DataClient, store: &'a StoreHandle) -> Self {
        Self { data, store }
    }

    /// Totals over the purchases, sales and expenses matching `query`.
    ///
    /// # Errors
    ///
    /// Returns the data store error; it is also recorded as `last_error`.
    #[instrument(skip(self))]
    pub async fn summary(&self, query: &ListQuery) -> Result<FinancialSummary, ServiceError> {
        let purchases = Repository::<Purchase>::new(self.data);
        let sales = Repository::<Sale>::new(self.data);
        let expenses = Repository::<Expense>::new(self.data);

        let fetched = tokio::try_join!(
            purchases.list(query),
            sales.list(query),
            expenses.list(query),
        );
        let (purchases, sales, expenses) = flag(self.store, fetched)?;

        let dog_count = self.store.read(|s| s.dogs().len());
        Ok(FinancialSummary::compute(
            &purchases, &sales, &expenses, dog_count,
        ))
    }

    /// Purchases with the bought dog's name, breed and sex.
    ///
    /// # Errors
    ///
    /// Returns the data store error; it is also recorded as `last_error`.
    pub async fn purchases(&self, query: &ListQuery) -> Result<Vec<PurchaseView>, ServiceError> {
        let purchases = flag(
            self.store,
            Repository::<Purchase>::new(self.data).list(query).await,
        )?;
        Ok(join_purchases(purchases, &self.store.dogs()))
    }

    /// Sales with the sold dog's name, breed and sex.
    ///
    /// # Errors
    ///
    /// Returns the data store error; it is also recorded as `last_error`.
    pub async fn sales(&self, query: &ListQuery) -> Result<Vec<SaleView>, ServiceError> {
        let sales = flag(
            self.store,
            Repository::<Sale>::new(self.data).list(query).await,
        )?;
        Ok(join_sales(sales, &self.store.dogs()))
    }
}
