// storefront/src/repository/order_number.rs

//! Human-readable order numbers.
//!
//! Format: `ORD-{yyMMddHHmmssSSS}-{suffix}` where the suffix is eight symbols
//! of Crockford base32. The millisecond timestamp keeps numbers roughly
//! sortable and the 40 random bits keep them apart without a shared counter.

use chrono::Utc;
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const SUFFIX_LEN: usize = 8;

pub fn generate_order_number() -> String {
  let stamp = Utc::now().format("%y%m%d%H%M%S%3f");
  let mut rng = rand::thread_rng();
  let suffix: String = (0..SUFFIX_LEN)
    .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
    .collect();
  format!("ORD-{}-{}", stamp, suffix)
}
