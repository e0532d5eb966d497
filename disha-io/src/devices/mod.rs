//! Device implementations

pub mod dsp1750;
