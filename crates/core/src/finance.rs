//! Derived finance figures and the display joins for trades.
//!
//! Nothing here is persisted: summaries are recomputed from the purchase,
//! sale and expense tables every time they are shown, and the dog name/breed
//! next to a trade is looked up in the roster on read.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::models::{Dog, Expense, Purchase, Sale};
use crate::types::{DogId, ExpenseCategory, Gender, Money};

/// Totals over the kennel's books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub total_purchases: Money,
    pub total_sales: Money,
    pub total_expenses: Money,
    /// Sales minus purchases minus expenses.
    pub net_profit: Money,
    pub dog_count: usize,
    pub expenses_by_category: BTreeMap<ExpenseCategory, Money>,
}

impl FinancialSummary {
    #[must_use]
    pub fn compute(
        purchases: &[Purchase],
        sales: &[Sale],
        expenses: &[Expense],
        dog_count: usize,
    ) -> Self {
        let total_purchases: Money = purchases.iter().map(|p| p.price).sum();
        let total_sales: Money = sales.iter().map(|s| s.price).sum();
        let total_expenses: Money = expenses.iter().map(|e| e.amount).sum();

        let mut expenses_by_category = BTreeMap::new();
        for expense in expenses {
            let entry = expenses_by_category
                .entry(expense.category)
                .or_insert(Money::ZERO);
            *entry = *entry + expense.amount;
        }

        Self {
            total_purchases,
            total_sales,
            total_expenses,
            net_profit: total_sales - total_purchases - total_expenses,
            dog_count,
            expenses_by_category,
        }
    }
}

/// Net cash flow per calendar month, keyed `YYYY-MM`.
#[must_use]
pub fn monthly_net(
    purchases: &[Purchase],
    sales: &[Sale],
    expenses: &[Expense],
) -> BTreeMap<String, Money> {
    let mut months: BTreeMap<String, Money> = BTreeMap::new();
    let mut book = |date: NaiveDate, amount: Money| {
        let key = format!("{:04}-{:02}", date.year(), date.month());
        let entry = months.entry(key).or_insert(Money::ZERO);
        *entry = *entry + amount;
    };

    for sale in sales {
        book(sale.sale_date, sale.price);
    }
    for purchase in purchases {
        book(purchase.purchase_date, Money::ZERO - purchase.price);
    }
    for expense in expenses {
        book(expense.expense_date, Money::ZERO - expense.amount);
    }
    months
}

/// Display fields copied from a dog for a trade row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DogSnapshot {
    pub name: String,
    pub breed: String,
    pub gender: Gender,
}

impl DogSnapshot {
    fn lookup(roster: &[Dog], dog_id: DogId) -> Option<Self> {
        roster.iter().find(|dog| dog.id == dog_id).map(|dog| Self {
            name: dog.name.clone(),
            breed: dog.breed.clone(),
            gender: dog.gender,
        })
    }
}

/// A purchase with the traded dog's details joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseView {
    #[serde(flatten)]
    pub purchase: Purchase,
    /// `None` when the dog is not in the roster (deleted or not loaded).
    pub dog: Option<DogSnapshot>,
}

/// A sale with the traded dog's details joined in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleView {
    #[serde(flatten)]
    pub sale: Sale,
    pub dog: Option<DogSnapshot>,
}

#[must_use]
pub fn join_purchases(purchases: Vec<Purchase>, roster: &[Dog]) -> Vec<PurchaseView> {
    purchases
        .into_iter()
        .map(|purchase| PurchaseView {
            dog: DogSnapshot::lookup(roster, purchase.dog_id),
            purchase,
        })
        .collect()
}

#[must_use]
pub fn join_sales(sales: Vec<Sale>, roster: &[Dog]) -> Vec<SaleView> {
    sales
        .into_iter()
        .map(|sale| SaleView {
            dog: DogSnapshot::lookup(roster, sale.dog_id),
            sale,
        })
        .collect()
}
