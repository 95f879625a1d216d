//! One module per CLI mode (§6), mirroring the teacher's
//! `src/commands/*.rs` + `#[derive(Parser)] struct FooArgs` / `pub fn
//! run(&FooArgs) -> Result<()>` convention.

pub mod create;
pub mod delete;
pub mod repartition;
pub mod shape;
pub mod test_data;

pub use create::{CreateArgs, run as run_create};
pub use delete::{DeleteArgs, run as run_delete};
pub use repartition::{RepartitionArgs, run as run_repartition};
pub use test_data::{TestDataArgs, run as run_test_data};
