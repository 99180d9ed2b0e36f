pub mod config;
mod profile;

pub use profile::{PROFILE_FILE, Profile, ProfileError};
