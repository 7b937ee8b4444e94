// src/config/mod.rs
pub mod profile;
pub mod run;

pub use profile::{load_profile_default, load_profile_from, EligibilityRule, Profile, ScoreWeights};
pub use run::{Mirrors, RunConfig};
