use proptest::prelude::*;

use obelisk_primitives::address::Address;
use obelisk_primitives::base58;
use obelisk_primitives::chainhash::Hash256;
use obelisk_primitives::codec::{encode_uint32, decode_uint32};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn address_wire_text_roundtrip(wire in prop::array::uniform21(any::<u8>())) {
        let address = Address::from_wire(&wire).unwrap();
        let text = address.to_string();
        let decoded = Address::from_string(&text).unwrap();
        prop_assert_eq!(decoded.to_wire(), wire);
    }

    #[test]
    fn address_checksum_tamper_fails(
        wire in prop::array::uniform21(any::<u8>()),
        position in 0usize..4,
        flip in 1u8..=255,
    ) {
        let text = Address::from_wire(&wire).unwrap().to_string();
        let mut raw = base58::decode(&text).unwrap();
        let len = raw.len();
        raw[len - 4 + position] ^= flip;
        let tampered = base58::encode(&raw);
        prop_assert!(Address::from_string(&tampered).is_err());
    }

    #[test]
    fn hash_hex_roundtrip(display in prop::array::uniform32(any::<u8>())) {
        let hex_str = hex::encode(display);
        let hash = Hash256::from_hex(&hex_str).unwrap();
        let mut reversed = display;
        reversed.reverse();
        prop_assert_eq!(hash.to_wire(), reversed);
        prop_assert_eq!(Hash256::from_wire(hash.to_wire()).to_string(), hex_str);
        prop_assert_eq!(hash.to_display_bytes(), display);
    }

    #[test]
    fn uint32_roundtrip(n in any::<u32>()) {
        let bytes = encode_uint32(i64::from(n)).unwrap();
        prop_assert_eq!(decode_uint32(&bytes).unwrap(), n);
    }
}
