use crate::models::card::Card;
use chrono::NaiveDate;
use rand::Rng;

pub const SERIAL_PREFIX: &str = "SCB";

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 4;

/// Build a serial of the form `SCB-<SKI>-<batch:03>-<XXXX>`
///
/// The skill part is the first three characters of the code, uppercased.
/// The suffix is not checked against existing serials.
pub fn generate_serial<R: Rng>(skill_code: &str, batch_index: u32, rng: &mut R) -> String {
    let skill_prefix: String = skill_code.chars().take(3).collect::<String>().to_uppercase();

    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{SERIAL_PREFIX}-{skill_prefix}-{batch_index:03}-{suffix}")
}

/// Issue `count` unclaimed cards for a skill, batch indexes 1..=count
///
/// A non-positive count yields an empty batch.
pub fn issue_batch<R: Rng>(
    skill_code: &str,
    count: i64,
    created_at: NaiveDate,
    rng: &mut R,
) -> Vec<Card> {
    if count <= 0 {
        return Vec::new();
    }

    (1..=count)
        .map(|index| {
            let batch_index = u32::try_from(index).unwrap_or(u32::MAX);
            Card::new(
                generate_serial(skill_code, batch_index, rng),
                skill_code.to_string(),
                created_at,
            )
        })
        .collect()
}
