//! Backend identifiers: `{prefix}_{epoch-millis}_{9-char base36 suffix}`.
//!
//! Uniqueness comes from the timestamp plus the random suffix; there is no
//! central counter, so ids minted on different runs never collide in
//! practice.

use chrono::Utc;
use rand_core::{OsRng, RngCore};

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mint a fresh id such as `shop_1718000000000_k3j9x0a1b`.
pub fn generate_backend_id(prefix: &str) -> String {
  let millis = Utc::now().timestamp_millis();
  format!("{prefix}_{millis}_{}", random_suffix(&mut OsRng))
}

fn random_suffix(rng: &mut impl RngCore) -> String {
  let mut n = rng.next_u64();
  (0..SUFFIX_LEN)
    .map(|_| {
      let c = BASE36[(n % 36) as usize] as char;
      n /= 36;
      c
    })
    .collect()
}
