//! Protocol types for Permit2 transfers and LayerZero routing
//!
//! This module contains the typed-data structures the owner signs, the nonce
//! bitmap arithmetic used to pick unused SignatureTransfer nonces, USDC amount
//! helpers, and LayerZero endpoint IDs and executor options.

mod amount;
mod endpoint_id;
mod nonce;
mod options;
mod permit;

pub use amount::{
    apply_slippage, format_usdc, parse_usdc, share_of, validate_percentage, MAX_BPS,
    USDC_DECIMALS,
};
pub use endpoint_id::{EndpointId, InvalidEndpointId};
pub use nonce::NonceBitmap;
pub use options::{default_extra_options, LzOptions, DEFAULT_LZ_RECEIVE_GAS};
pub use permit::{
    permit2_domain, typed_data_json, PermitDetails, PermitSingle, PermitTransferFrom,
    TokenPermissions, PERMIT2_DOMAIN_NAME,
};
