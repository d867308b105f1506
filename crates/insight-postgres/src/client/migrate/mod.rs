//! Embedded migration management for the application database.

mod custom_hooks;
mod migrate_result;
mod run_migration;
mod run_utility;

pub use migrate_result::{MigrationResult, MigrationStatus};
pub use run_migration::run_pending_migrations;
pub use run_utility::{get_applied_migrations, get_migration_status};
