//! Live adapters for real external interactions.

pub mod clock;
pub mod credentials;
pub mod directory;
pub mod entitlements;
pub mod filesystem;
pub mod registry;

pub use clock::LiveClock;
pub use credentials::LiveTicketIssuer;
pub use directory::LiveDirectory;
pub use entitlements::LiveEntitlementService;
pub use filesystem::LiveFileSystem;
pub use registry::LiveCourseRegistry;
