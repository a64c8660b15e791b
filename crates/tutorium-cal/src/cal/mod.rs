pub mod clock;
pub mod free_period;
pub mod plan;
pub mod policy;
pub mod recurrence;

pub use clock::{occurrence_instants, resolve_timezone, zoned_instant};
pub use free_period::{FreePeriod, FreePeriodIndex};
pub use plan::{
    ExistingSession, GenerationPlan, Occurrence, build_occurrences, overlaps, plan_generation,
};
pub use policy::requires_regeneration;
pub use recurrence::{BoundingPeriod, Recurrence, expand};
