mod error;
pub mod geodetic;
mod observer;
pub mod sidereal;
mod topocentric;

pub use error::FrameError;
pub use geodetic::{ecef_to_geodetic, geodetic_to_ecef, Geodetic};
pub use observer::ObserverLocation;
pub use sidereal::gmst;
pub use topocentric::{FrameTransformer, ObserverRelativeGeometry};
