//! Domain model - commits, tags and releases, plus version rules

pub mod commit;
pub mod release;
pub mod tag;
pub mod version;

pub use commit::{Commit, Fix, Merge};
pub use release::{FixEntry, Release};
pub use tag::Tag;
pub use version::VersionBump;
