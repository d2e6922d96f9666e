//! Small shared helpers that don't deserve their own module.

use rand::distr::{Alphanumeric, SampleString};

/// A short lowercase-alphanumeric random suffix, used to mint mail ids and
/// agent names (§4.E, §4.L). Not content-addressed — unlike the teacher's
/// `terseid`-derived conflict ids (see `merge::conflict_history`), nothing
/// here needs to be reproducible from its input.
#[must_use]
pub fn random_suffix(len: usize) -> String {
    Alphanumeric
        .sample_string(&mut rand::rng(), len)
        .to_lowercase()
}
