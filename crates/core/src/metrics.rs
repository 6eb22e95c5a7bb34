//! The business snapshot handed to the narrative analysis.
//!
//! Grouped by the five dimensions the advisor is asked to cover: finance,
//! health, breeding, inventory and operations.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::finance::{FinancialSummary, monthly_net};
use crate::models::{Dog, Expense, GrowthEvent, HealthRecord, Litter, Purchase, QrCode, Sale};
use crate::types::{DogId, HealthRecordType, Money};

/// Checkups older than this many days count as overdue.
pub const CHECKUP_INTERVAL_DAYS: i64 = 365;

/// Everything the metrics are computed from. All slices are full table reads.
#[derive(Debug, Clone, Copy)]
pub struct MetricsInput<'a> {
    pub dogs: &'a [Dog],
    pub purchases: &'a [Purchase],
    pub sales: &'a [Sale],
    pub expenses: &'a [Expense],
    pub litters: &'a [Litter],
    pub health_records: &'a [HealthRecord],
    pub growth_events: &'a [GrowthEvent],
    pub qr_codes: &'a [QrCode],
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusinessMetrics {
    pub generated_on: NaiveDate,
    pub finance: FinanceMetrics,
    pub health: HealthMetrics,
    pub breeding: BreedingMetrics,
    pub inventory: InventoryMetrics,
    pub operations: OperationsMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceMetrics {
    #[serde(flatten)]
    pub summary: FinancialSummary,
    pub monthly_net: BTreeMap<String, Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthMetrics {
    pub records_by_type: BTreeMap<HealthRecordType, usize>,
    /// Dogs in the kennel with no checkup in the last year.
    pub dogs_overdue_checkup: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreedingMetrics {
    pub litter_count: usize,
    pub puppy_count: usize,
    /// Puppies per litter, rounded to two decimals as text.
    pub average_litter_size: String,
    pub active_dams: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryMetrics {
    pub by_status: BTreeMap<String, usize>,
    pub by_gender: BTreeMap<String, usize>,
    pub by_breed: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationsMetrics {
    pub growth_events_recorded: usize,
    pub dogs_without_qr_code: usize,
    pub dogs_without_photos: usize,
}

impl BusinessMetrics {
    #[must_use]
    pub fn compute(input: &MetricsInput<'_>) -> Self {
        Self {
            generated_on: input.today,
            finance: FinanceMetrics {
                summary: FinancialSummary::compute(
                    input.purchases,
                    input.sales,
                    input.expenses,
                    input.dogs.len(),
                ),
                monthly_net: monthly_net(input.purchases, input.sales, input.expenses),
            },
            health: health_metrics(input),
            breeding: breeding_metrics(input.litters),
            inventory: inventory_metrics(input.dogs),
            operations: operations_metrics(input),
        }
    }
}

fn health_metrics(input: &MetricsInput<'_>) -> HealthMetrics {
    let mut records_by_type = BTreeMap::new();
    for record in input.health_records {
        *records_by_type.entry(record.record_type).or_insert(0) += 1;
    }

    let recently_checked: HashSet<DogId> = input
        .health_records
        .iter()
        .filter(|r| r.record_type == HealthRecordType::Checkup)
        .filter(|r| (input.today - r.date).num_days() <= CHECKUP_INTERVAL_DAYS)
        .map(|r| r.dog_id)
        .collect();

    let dogs_overdue_checkup = input
        .dogs
        .iter()
        .filter(|dog| dog.status.is_in_kennel() && !recently_checked.contains(&dog.id))
        .count();

    HealthMetrics {
        records_by_type,
        dogs_overdue_checkup,
    }
}

fn breeding_metrics(litters: &[Litter]) -> BreedingMetrics {
    let puppy_count: usize = litters.iter().map(Litter::size).sum();
    let average_litter_size = if litters.is_empty() {
        "0.00".to_string()
    } else {
        #[allow(clippy::cast_precision_loss)] // litter counts are tiny
        let average = puppy_count as f64 / litters.len() as f64;
        format!("{average:.2}")
    };
    let active_dams = litters
        .iter()
        .map(|l| l.dam_id)
        .collect::<HashSet<_>>()
        .len();

    BreedingMetrics {
        litter_count: litters.len(),
        puppy_count,
        average_litter_size,
        active_dams,
    }
}

fn inventory_metrics(dogs: &[Dog]) -> InventoryMetrics {
    let mut by_status = BTreeMap::new();
    let mut by_gender = BTreeMap::new();
    let mut by_breed = BTreeMap::new();
    for dog in dogs {
        *by_status.entry(dog.status.to_string()).or_insert(0) += 1;
        *by_gender.entry(dog.gender.to_string()).or_insert(0) += 1;
        *by_breed.entry(dog.breed.trim().to_string()).or_insert(0) += 1;
    }
    InventoryMetrics {
        by_status,
        by_gender,
        by_breed,
    }
}

fn operations_metrics(input: &MetricsInput<'_>) -> OperationsMetrics {
    let with_code: HashSet<DogId> = input.qr_codes.iter().map(|q| q.dog_id).collect();
    OperationsMetrics {
        growth_events_recorded: input.growth_events.len(),
        dogs_without_qr_code: input
            .dogs
            .iter()
            .filter(|dog| !with_code.contains(&dog.id))
            .count(),
        dogs_without_photos: input.dogs.iter().filter(|dog| dog.photos.is_empty()).count(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::finance::tests::{day, expense, sale};
    use crate::types::{DogStatus, ExpenseCategory, Gender, HealthRecordId, LitterId};

    fn dog(name: &str, gender: Gender, status: DogStatus) -> Dog {
        Dog {
            id: DogId::generate(),
            name: name.to_string(),
            breed: "Labrador".to_string(),
            gender,
            birth_date: day(2020, 5, 5),
            color: "yellow".to_string(),
            weight: None,
            microchip_id: None,
            registration_number: None,
            owner_contact: None,
            status,
            photos: vec![],
            sire_id: None,
            dam_id: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn checkup(dog_id: DogId, date: NaiveDate) -> HealthRecord {
        HealthRecord {
            id: HealthRecordId::generate(),
            dog_id,
            record_type: HealthRecordType::Checkup,
            date,
            description: "Yearly".to_string(),
            document_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_compute_covers_all_dimensions() {
        let sire = dog("Max", Gender::Male, DogStatus::Owned);
        let dam = dog("Daisy", Gender::Female, DogStatus::Owned);
        let sold = dog("Buddy", Gender::Male, DogStatus::Sold);
        let dogs = vec![sire.clone(), dam.clone(), sold.clone()];
        let litters = vec![Litter {
            id: LitterId::generate(),
            sire_id: sire.id,
            dam_id: dam.id,
            birth_date: day(2023, 4, 1),
            puppy_ids: vec![sold.id, DogId::generate(), DogId::generate()],
            notes: None,
            created_at: Utc::now(),
        }];
        let health = vec![
            checkup(sire.id, day(2024, 1, 10)),
            checkup(dam.id, day(2022, 1, 10)),
        ];
        let sales = vec![sale(sold.id, 300_000, day(2024, 2, 2))];
        let expenses = vec![expense(dam.id, ExpenseCategory::Medical, 40_000, day(2024, 2, 9))];
        let qr = vec![QrCode::new(sire.id, "https://qr.example.com/max", Utc::now()).unwrap()];

        let metrics = BusinessMetrics::compute(&MetricsInput {
            dogs: &dogs,
            purchases: &[],
            sales: &sales,
            expenses: &expenses,
            litters: &litters,
            health_records: &health,
            growth_events: &[],
            qr_codes: &qr,
            today: day(2024, 6, 1),
        });

        assert_eq!(metrics.finance.summary.net_profit, Money::from_cents(260_000));
        assert_eq!(metrics.finance.summary.dog_count, 3);
        assert_eq!(metrics.health.records_by_type[&HealthRecordType::Checkup], 2);
        assert_eq!(metrics.health.dogs_overdue_checkup, 1);
        assert_eq!(metrics.breeding.puppy_count, 3);
        assert_eq!(metrics.breeding.average_litter_size, "3.00");
        assert_eq!(metrics.breeding.active_dams, 1);
        assert_eq!(metrics.inventory.by_status["owned"], 2);
        assert_eq!(metrics.inventory.by_gender["male"], 2);
        assert_eq!(metrics.operations.dogs_without_qr_code, 2);
        assert_eq!(metrics.operations.dogs_without_photos, 3);
    }

    #[test]
    fn test_serializes_five_dimensions() {
        let metrics = BusinessMetrics::compute(&MetricsInput {
            dogs: &[],
            purchases: &[],
            sales: &[],
            expenses: &[],
            litters: &[],
            health_records: &[],
            growth_events: &[],
            qr_codes: &[],
            today: day(2024, 1, 1),
        });
        let json = serde_json::to_value(&metrics).unwrap();
        for key in ["finance", "health", "breeding", "inventory", "operations"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["breeding"]["average_litter_size"], "0.00");
        assert!(json["finance"]["expenses_by_category"].is_object());
    }
}
