pub mod account;
pub mod transaction;

pub use account::{Entity as Account, Model as AccountModel};
pub use transaction::{Entity as Transaction, Model as TransactionModel};
