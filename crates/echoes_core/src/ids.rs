//! Record identifiers of the form `<prefix>_<timestamp>_<random>`.

use crate::domain::Millis;
use uuid::Uuid;

const RANDOM_LEN: usize = 9;

pub fn generate_id(prefix: &str, now: Millis) -> String {
    let random: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(RANDOM_LEN)
        .collect();
    format!("{prefix}_{now}_{random}")
}
