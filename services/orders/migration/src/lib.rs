pub use sea_orm_migration::prelude::*;

mod m20261019_000001_create_orders;
mod m20261019_000002_add_pending_poll_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261019_000001_create_orders::Migration),
            Box::new(m20261019_000002_add_pending_poll_index::Migration),
        ]
    }
}
