pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod storage;

pub use policy::ExplorationStrategy;
pub use seeds::{resolve_seeds, split_csv};
pub use simulation::{
    SimulationAggregate, SimulationConfig, SimulationRecord, aggregate_records, run_simulation,
};
