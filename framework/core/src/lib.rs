mod measurement;
mod shutdown;

pub mod prelude {
    pub use crate::measurement::{ResultRow, ResultTable, StatsSample, SweepParameter};
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener, ShutdownSignalError};
}
