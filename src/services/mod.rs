// Service exports
pub mod distribution;
pub mod postgres;
pub mod regions;
pub mod store;

pub use distribution::{DistributionError, DistributionKey, DistributionRecord, DistributionSource, FileDistributionSource};
pub use postgres::PostgresClient;
pub use regions::ProvinceCityDirectory;
pub use store::{AdmissionStore, GroupRow, MajorRow, PriorAdmission, ProfileStore, StoreError};
