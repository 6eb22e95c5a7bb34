//! Business metrics and the narrative analysis built on them.

use chrono::NaiveDate;
use kennel_core::{
    BusinessMetrics, Dog, Expense, GrowthEvent, HealthRecord, Litter, MetricsInput, Purchase,
    QrCode, Sale,
};
use serde::Serialize;
use tracing::instrument;

use super::{ServiceError, flag};
use crate::analysis::AnalysisClient;
use crate::db::{DataClient, ListQuery, Repository};
use crate::store::StoreHandle;

/// The metrics that were sent and the advisor's answer.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metrics: BusinessMetrics,
    pub analysis: String,
}

pub struct AnalysisService<'a> {
    data: &'a DataClient,
    store: &'a StoreHandle,
    client: Option<&'a AnalysisClient>,
}

impl<'a> AnalysisService<'a> {
    #[must_use]
    pub const fn new(
        data: &'a DataClient,
        store: &'a StoreHandle,
        client: Option<&'a AnalysisClient>,
    ) -> Self {
        Self {
            data,
            store,
            client,
        }
    }

    /// Read every table and compute the business snapshot for `today`.
    ///
    /// # Errors
    ///
    /// Returns the data store error; it is also recorded as `last_error`.
    #[instrument(skip(self))]
    pub async fn metrics(&self, today: NaiveDate) -> Result<BusinessMetrics, ServiceError> {
        let all = ListQuery::new();
        let dogs = Repository::<Dog>::new(self.data);
        let purchases = Repository::<Purchase>::new(self.data);
        let sales = Repository::<Sale>::new(self.data);
        let expenses = Repository::<Expense>::new(self.data);
        let litters = Repository::<Litter>::new(self.data);
        let health_records = Repository::<HealthRecord>::new(self.data);
        let growth_events = Repository::<GrowthEvent>::new(self.data);
        let qr_codes = Repository::<QrCode>::new(self.data);

        let fetched = tokio::try_join!(
            dogs.list(&all),
            purchases.list(&all),
            sales.list(&all),
            expenses.list(&all),
            litters.list(&all),
            health_records.list(&all),
            growth_events.list(&all),
            qr_codes.list(&all),
        );
        let (dogs, purchases, sales, expenses, litters, health_records, growth_events, qr_codes) =
            flag(self.store, fetched)?;

        Ok(BusinessMetrics::compute(&MetricsInput {
            dogs: &dogs,
            purchases: &purchases,
            sales: &sales,
            expenses: &expenses,
            litters: &litters,
            health_records: &health_records,
            growth_events: &growth_events,
            qr_codes: &qr_codes,
            today,
        }))
    }

    /// Compute the metrics and ask the advisor about them.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AnalysisDisabled`] without an analysis
    /// client, otherwise the data store or analysis error (also recorded as
    /// `last_error`).
    #[instrument(skip(self))]
    pub async fn analyze(&self, today: NaiveDate) -> Result<AnalysisReport, ServiceError> {
        let client = self.client.ok_or(ServiceError::AnalysisDisabled)?;
        let metrics = self.metrics(today).await?;

        let result = {
            let _loading = self.store.loading();
            client.analyze(&metrics).await
        };

        let analysis = flag(self.store, result)?;
        Ok(AnalysisReport { metrics, analysis })
    }
}
