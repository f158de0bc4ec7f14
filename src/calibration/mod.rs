//! Raw similarity score → calibrated genuine-match probability.
//!
//! Two interchangeable families behind one tagged [`Calibrator`]:
//! logistic (Platt) scaling and isotonic regression. A fitted calibrator is
//! immutable and persists as a framed JSON artifact.

pub mod calibrator;
pub mod error;
pub mod isotonic;
pub mod platt;
pub mod reliability;


pub use calibrator::{CalibrationMethod, Calibrator};
pub use error::{CalibrationError, CalibrationResult};
pub use isotonic::IsotonicModel;
pub use platt::{PlattConfig, PlattModel};
pub use reliability::{ReliabilityCurve, evaluate};
