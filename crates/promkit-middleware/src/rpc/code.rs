//! RPC call shapes and canonical status codes.

use std::fmt;

/// Shape of an RPC, used as the `grpc_type` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcType {
    Unary,
    ClientStream,
    ServerStream,
    BidiStream,
}

impl RpcType {
    pub fn as_str(self) -> &'static str {
        match self {
            RpcType::Unary => "unary",
            RpcType::ClientStream => "client_stream",
            RpcType::ServerStream => "server_stream",
            RpcType::BidiStream => "bidi_stream",
        }
    }

    /// Classify from streaming flags.
    pub fn from_flags(client_stream: bool, server_stream: bool) -> Self {
        match (client_stream, server_stream) {
            (false, false) => RpcType::Unary,
            (true, false) => RpcType::ClientStream,
            (false, true) => RpcType::ServerStream,
            (true, true) => RpcType::BidiStream,
        }
    }
}

/// Canonical RPC status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Code {
    Ok = 0,
    Canceled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl Code {
    pub const ALL: [Code; 17] = [
        Code::Ok,
        Code::Canceled,
        Code::Unknown,
        Code::InvalidArgument,
        Code::DeadlineExceeded,
        Code::NotFound,
        Code::AlreadyExists,
        Code::PermissionDenied,
        Code::ResourceExhausted,
        Code::FailedPrecondition,
        Code::Aborted,
        Code::OutOfRange,
        Code::Unimplemented,
        Code::Internal,
        Code::Unavailable,
        Code::DataLoss,
        Code::Unauthenticated,
    ];

    /// Label value, e.g. `OK`, `DeadlineExceeded`.
    pub fn as_str(self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Canceled => "Canceled",
            Code::Unknown => "Unknown",
            Code::InvalidArgument => "InvalidArgument",
            Code::DeadlineExceeded => "DeadlineExceeded",
            Code::NotFound => "NotFound",
            Code::AlreadyExists => "AlreadyExists",
            Code::PermissionDenied => "PermissionDenied",
            Code::ResourceExhausted => "ResourceExhausted",
            Code::FailedPrecondition => "FailedPrecondition",
            Code::Aborted => "Aborted",
            Code::OutOfRange => "OutOfRange",
            Code::Unimplemented => "Unimplemented",
            Code::Internal => "Internal",
            Code::Unavailable => "Unavailable",
            Code::DataLoss => "DataLoss",
            Code::Unauthenticated => "Unauthenticated",
        }
    }

    /// Numeric wire value; out-of-range values map to `Unknown`.
    pub fn from_i32(v: i32) -> Self {
        Code::ALL
            .iter()
            .copied()
            .find(|c| *c as i32 == v)
            .unwrap_or(Code::Unknown)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that carry an RPC status code. Handler errors are reported
/// under the code they map to.
pub trait RpcStatus {
    fn code(&self) -> Code;
}

impl RpcStatus for Code {
    fn code(&self) -> Code {
        *self
    }
}

impl RpcStatus for std::convert::Infallible {
    fn code(&self) -> Code {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_wire_value() {
        for c in Code::ALL {
            assert_eq!(Code::from_i32(c as i32), c);
        }
        assert_eq!(Code::from_i32(99), Code::Unknown);
        assert_eq!(Code::from_i32(-1), Code::Unknown);
    }

    #[test]
    fn rpc_type_from_flags() {
        assert_eq!(RpcType::from_flags(false, false), RpcType::Unary);
        assert_eq!(RpcType::from_flags(true, false).as_str(), "client_stream");
        assert_eq!(RpcType::from_flags(false, true).as_str(), "server_stream");
        assert_eq!(RpcType::from_flags(true, true).as_str(), "bidi_stream");
    }
}
