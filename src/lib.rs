//! LEO satellite geometry and radio link engine.
//!
//! Element sets are parsed into [`tle::TleRecord`]s, propagated to inertial
//! states by [`orbit::OrbitalPropagator`], placed relative to a ground
//! observer by [`frames::FrameTransformer`] and turned into path loss, SINR
//! and Doppler by [`link::LinkBudgetModel`].

pub mod config;
pub mod constants;
pub mod frames;
pub mod link;
pub mod orbit;
pub mod tle;
pub mod track;
pub mod visibility;
