//! Serde form of satoshi amounts: a decimal string, so values wider than
//! 53 bits survive JSON readers that parse numbers as doubles.

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_str_radix(10))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(de::Error::custom(format!("invalid satoshi amount: {:?}", s)));
    }
    BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| de::Error::custom(format!("invalid satoshi amount: {:?}", s)))
}
