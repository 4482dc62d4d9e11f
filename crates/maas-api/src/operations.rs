//! Operation names and per-operation status translation tables.
//!
//! Every call site translates transport failures through exactly one of these
//! policies. A 403 is always `PermissionDenied`; anything not listed becomes
//! `Unexpected`.

use std::fmt;

use maas_core::{ErrorKind, StatusPolicy};
use reqwest::StatusCode;

/// Policy for reads and lists: only 403 is mapped.
pub const LIST: StatusPolicy = StatusPolicy::new("list", &[]);

/// Policy for fetching a single file or its content.
pub const GET_FILE: StatusPolicy =
    StatusPolicy::new("get_file", &[(StatusCode::NOT_FOUND, ErrorKind::NotFound)]);

/// Policy for creating a node.
pub const CREATE_NODE: StatusPolicy = StatusPolicy::new(
    "create_node",
    &[(StatusCode::BAD_REQUEST, ErrorKind::BadRequest)],
);

/// Policy for uploading a file.
pub const ADD_FILE: StatusPolicy =
    StatusPolicy::new("add_file", &[(StatusCode::BAD_REQUEST, ErrorKind::BadRequest)]);

/// Policy for allocation; 409 means no machine satisfies the constraints.
pub const ALLOCATE_MACHINE: StatusPolicy = StatusPolicy::new(
    "allocate_machine",
    &[(StatusCode::CONFLICT, ErrorKind::NoMatch)],
);

/// Policy for batch release.
pub const RELEASE_MACHINES: StatusPolicy = StatusPolicy::new(
    "release_machines",
    &[
        (StatusCode::BAD_REQUEST, ErrorKind::BadRequest),
        (StatusCode::CONFLICT, ErrorKind::CannotComplete),
    ],
);

const MACHINE_ACTION_RULES: &[(StatusCode, ErrorKind)] = &[
    (StatusCode::NOT_FOUND, ErrorKind::BadRequest),
    (StatusCode::CONFLICT, ErrorKind::BadRequest),
    (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::CannotComplete),
];

/// Policy for deploy.
pub const DEPLOY: StatusPolicy = StatusPolicy::new("deploy", MACHINE_ACTION_RULES);

/// Policy for commission.
pub const COMMISSION: StatusPolicy = StatusPolicy::new("commission", MACHINE_ACTION_RULES);

/// Policy for creating a physical interface.
pub const CREATE_INTERFACE: StatusPolicy =
    StatusPolicy::new("create_interface", MACHINE_ACTION_RULES);

/// Policy for linking an interface to a subnet.
pub const LINK_SUBNET: StatusPolicy = StatusPolicy::new(
    "link_subnet",
    &[
        (StatusCode::BAD_REQUEST, ErrorKind::BadRequest),
        (StatusCode::NOT_FOUND, ErrorKind::BadRequest),
        (StatusCode::SERVICE_UNAVAILABLE, ErrorKind::CannotComplete),
    ],
);

/// Policy for unlinking an interface from a subnet.
pub const UNLINK_SUBNET: StatusPolicy = StatusPolicy::new(
    "unlink_subnet",
    &[
        (StatusCode::BAD_REQUEST, ErrorKind::BadRequest),
        (StatusCode::NOT_FOUND, ErrorKind::BadRequest),
    ],
);

/// Policy for updating an interface.
pub const UPDATE_INTERFACE: StatusPolicy = StatusPolicy::new(
    "update_interface",
    &[(StatusCode::NOT_FOUND, ErrorKind::NotFound)],
);

/// Policy for setting owner data.
pub const SET_OWNER_DATA: StatusPolicy = StatusPolicy::new("set_owner_data", &[]);

/// Policy for deleting a node or device. A 409 stays `Unexpected`.
pub const DELETE: StatusPolicy =
    StatusPolicy::new("delete", &[(StatusCode::NOT_FOUND, ErrorKind::NotFound)]);

/// Operations on the machines collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachinesOp {
    /// Acquire a machine matching constraints.
    Allocate,
    /// Release a batch of machines.
    Release,
}

impl MachinesOp {
    /// Wire value of the `op` parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for MachinesOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations on a single machine's resource URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineOp {
    /// Start commissioning.
    Commission,
    /// Deploy an operating system.
    Deploy,
    /// Set owner key/value data.
    SetOwnerData,
}

impl MachineOp {
    /// Wire value of the `op` parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Commission => "commission",
            Self::Deploy => "deploy",
            Self::SetOwnerData => "set_owner_data",
        }
    }
}

impl fmt::Display for MachineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maas_core::{Error, ServerError};

    fn server(status: u16, body: &str) -> Error {
        Error::Server(ServerError::new(
            StatusCode::from_u16(status).unwrap(),
            body,
        ))
    }

    #[test]
    fn deploy_table() {
        assert_eq!(
            DEPLOY.translate(server(404, "no such machine")),
            Error::BadRequest("no such machine".into())
        );
        assert_eq!(DEPLOY.translate(server(409, "busy")).kind(), ErrorKind::BadRequest);
        assert_eq!(
            DEPLOY.translate(server(403, "go away")),
            Error::PermissionDenied("go away".into())
        );
        assert_eq!(
            DEPLOY.translate(server(503, "no images")).kind(),
            ErrorKind::CannotComplete
        );
        assert_eq!(
            DEPLOY.translate(server(405, "wat?")).to_string(),
            "unexpected: ServerError: 405 Method Not Allowed (wat?)"
        );
    }

    #[test]
    fn allocate_conflict_is_no_match() {
        let err = ALLOCATE_MACHINE.translate(server(409, "no machines available"));
        assert_eq!(err.kind(), ErrorKind::NoMatch);
        assert_eq!(err.to_string(), "no machines available");
    }

    #[test]
    fn release_table() {
        assert_eq!(
            RELEASE_MACHINES.translate(server(400, "bad")).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            RELEASE_MACHINES.translate(server(409, "locked")).kind(),
            ErrorKind::CannotComplete
        );
        assert_eq!(
            RELEASE_MACHINES.translate(server(404, "gone")).kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn delete_conflict_stays_unexpected() {
        assert_eq!(DELETE.translate(server(404, "gone")).kind(), ErrorKind::NotFound);
        assert_eq!(DELETE.translate(server(409, "busy")).kind(), ErrorKind::Unexpected);
        assert_eq!(
            DELETE.translate(server(403, "no")).kind(),
            ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn link_tables_differ_on_503() {
        assert_eq!(
            LINK_SUBNET.translate(server(503, "later")).kind(),
            ErrorKind::CannotComplete
        );
        assert_eq!(
            UNLINK_SUBNET.translate(server(503, "later")).kind(),
            ErrorKind::Unexpected
        );
        assert_eq!(
            UNLINK_SUBNET.translate(server(404, "no link")).kind(),
            ErrorKind::BadRequest
        );
    }

    #[test]
    fn list_maps_only_forbidden() {
        assert_eq!(LIST.translate(server(404, "x")).kind(), ErrorKind::Unexpected);
        assert_eq!(LIST.translate(server(403, "x")).kind(), ErrorKind::PermissionDenied);
        assert_eq!(LIST.name(), "list");
    }

    #[test]
    fn transport_failures_become_unexpected() {
        let err = GET_FILE.translate(Error::Timeout("deadline".into()));
        assert_eq!(err.kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn op_names() {
        assert_eq!(MachineOp::Deploy.to_string(), "deploy");
        assert_eq!(MachineOp::SetOwnerData.as_str(), "set_owner_data");
        assert_eq!(MachineOp::Commission.as_str(), "commission");
        assert_eq!(MachinesOp::Allocate.to_string(), "allocate");
    }
}
