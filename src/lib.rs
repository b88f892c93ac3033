/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

mod config;
mod decode;
mod dns;
mod error;
mod marshal;
mod oid;
mod registry;
mod session;
mod transport;
mod usm;
mod walk;

pub use config::{
    AuthProtocol, CommunityParams, PrivacyProtocol, SecurityLevel, SessionParams, UsmParams,
    MAX_OIDS,
};
pub use decode::{build_result, RawType, RawValue, SnmpResult};
pub use error::{DecodeError, Error, Result, UsmError};
pub use marshal::to_json;
pub use oid::{format_oid, has_prefix, split, total_order, Oid, OidError};
pub use registry::SessionRegistry;
pub use session::Session;
pub use transport::{Binding, SnmpTransport};
pub use walk::{walk, walk_bulk, BulkWalkController};
