//! UUID <-> protobuf conversion helpers.

use crate::proto::Uuid as ProtoUuid;

/// Extension trait converting a protobuf [`Uuid`](ProtoUuid) to the
/// standard `uuid` crate representation.
pub trait ProtoUuidExt {
    /// Parse the raw bytes into a standard UUID.
    fn to_uuid(&self) -> Result<::uuid::Uuid, ::uuid::Error>;

    /// Hex-encode the raw bytes.
    fn to_hex(&self) -> String;
}

impl ProtoUuidExt for ProtoUuid {
    fn to_uuid(&self) -> Result<::uuid::Uuid, ::uuid::Error> {
        ::uuid::Uuid::from_slice(&self.value)
    }

    fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }
}

/// Extension trait converting a standard UUID into its protobuf
/// representation.
pub trait UuidExt {
    fn to_proto_uuid(&self) -> ProtoUuid;
}

impl UuidExt for ::uuid::Uuid {
    fn to_proto_uuid(&self) -> ProtoUuid {
        ProtoUuid {
            value: self.as_bytes().to_vec(),
        }
    }
}
