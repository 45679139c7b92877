//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the reconciliation core and an
//! external system (time, local files, the directory, the course registry,
//! the Kerberos ticket cache, the entitlement service).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod credentials;
pub mod directory;
pub mod entitlements;
pub mod filesystem;
pub mod registry;

pub use clock::Clock;
pub use credentials::{Ticket, TicketIssuer, TicketRequest};
pub use directory::Directory;
pub use entitlements::EntitlementService;
pub use filesystem::FileSystem;
pub use registry::{CourseRegistry, RealmUsername};
