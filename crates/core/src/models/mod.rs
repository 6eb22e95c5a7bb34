//! Kennel records as stored in the hosted data store.

pub mod dog;
pub mod records;
pub mod user;

pub use dog::{Dog, DogPatch, NewDog};
pub use records::{
    Expense, GrowthEvent, HealthRecord, Litter, NewExpense, NewGrowthEvent, NewHealthRecord,
    NewLitter, NewPurchase, NewSale, Purchase, QrCode, Sale,
};
pub use user::User;
