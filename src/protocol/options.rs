//! LayerZero executor options
//!
//! The validator forwards `extraOptions` verbatim to the LayerZero endpoint.
//! Options use the type-3 layout: a `uint16` type header followed by
//! `(worker id, uint16 size, option type, params)` records.

use alloy_primitives::{Address, Bytes};

const OPTIONS_TYPE_3: u16 = 3;
const EXECUTOR_WORKER_ID: u8 = 1;
const OPTION_TYPE_LZRECEIVE: u8 = 1;
const OPTION_TYPE_NATIVE_DROP: u8 = 2;

/// Destination gas granted to `lzReceive` by default
pub const DEFAULT_LZ_RECEIVE_GAS: u128 = 60_000;

/// Builder for type-3 executor options
///
/// # Example
///
/// ```rust
/// use permit2_bridge::LzOptions;
///
/// let options = LzOptions::new().lz_receive(60_000, 0).build();
/// assert_eq!(options.to_string(), "0x0003010011010000000000000000000000000000ea60");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzOptions {
    encoded: Vec<u8>,
}

impl Default for LzOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl LzOptions {
    pub fn new() -> Self {
        Self {
            encoded: OPTIONS_TYPE_3.to_be_bytes().to_vec(),
        }
    }

    /// Gas (and optional native value) for `lzReceive` on the destination.
    pub fn lz_receive(self, gas: u128, value: u128) -> Self {
        let mut params = gas.to_be_bytes().to_vec();
        if value > 0 {
            params.extend_from_slice(&value.to_be_bytes());
        }
        self.executor_option(OPTION_TYPE_LZRECEIVE, &params)
    }

    /// Native gas token dropped to `receiver` on the destination.
    pub fn native_drop(self, amount: u128, receiver: Address) -> Self {
        let mut params = amount.to_be_bytes().to_vec();
        params.extend_from_slice(receiver.into_word().as_slice());
        self.executor_option(OPTION_TYPE_NATIVE_DROP, &params)
    }

    fn executor_option(mut self, option_type: u8, params: &[u8]) -> Self {
        // Params are at most 48 bytes, well inside a u16.
        let size = (params.len() + 1) as u16;
        self.encoded.push(EXECUTOR_WORKER_ID);
        self.encoded.extend_from_slice(&size.to_be_bytes());
        self.encoded.push(option_type);
        self.encoded.extend_from_slice(params);
        self
    }

    pub fn build(self) -> Bytes {
        Bytes::from(self.encoded)
    }
}

/// Options used when a relation does not override them: `lzReceive` with
/// 60 000 gas and no value.
pub fn default_extra_options() -> Bytes {
    LzOptions::new().lz_receive(DEFAULT_LZ_RECEIVE_GAS, 0).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn default_options_encoding() {
        insta::assert_snapshot!(
            default_extra_options(),
            @"0x0003010011010000000000000000000000000000ea60"
        );
    }

    #[test]
    fn lz_receive_with_value() {
        let options = LzOptions::new().lz_receive(60_000, 1_000).build();
        insta::assert_snapshot!(
            options,
            @"0x0003010021010000000000000000000000000000ea60000000000000000000000000000003e8"
        );
    }

    #[test]
    fn native_drop_appends_second_record() {
        let receiver = address!("00000000000000000000000000000000000000aa");
        let options = LzOptions::new()
            .lz_receive(60_000, 0)
            .native_drop(5, receiver)
            .build();
        // header + lzReceive record (4 + 16) + native drop record (4 + 16 + 32)
        assert_eq!(options.len(), 2 + 20 + 52);
        assert_eq!(&options[22..26], &[0x01, 0x00, 0x31, 0x02]);
        assert_eq!(options[options.len() - 1], 0xaa);
    }

    #[test]
    fn bare_header_is_type_three() {
        assert_eq!(LzOptions::new().build().as_ref(), &[0x00, 0x03]);
    }
}
