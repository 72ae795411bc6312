//! Business services. Each service owns an `Arc<DatabaseConnection>` and is
//! cheap to clone.

pub mod commerce;
