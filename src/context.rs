//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::live::{
    LiveClock, LiveCourseRegistry, LiveDirectory, LiveEntitlementService, LiveFileSystem,
    LiveTicketIssuer,
};
use crate::adapters::recording::{
    RecordingClock, RecordingCourseRegistry, RecordingDirectory, RecordingEntitlementService,
    RecordingTicketIssuer,
};
use crate::adapters::replaying::{
    ReplayingClock, ReplayingCourseRegistry, ReplayingDirectory, ReplayingEntitlementService,
    ReplayingTicketIssuer,
};
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::ports::{Clock, CourseRegistry, Directory, EntitlementService, FileSystem, TicketIssuer};

/// Bundles all port trait objects into a single context.
///
/// Constructors wire up live, recording or replaying adapters. The mapping
/// file is always accessed through the live filesystem.
pub struct ServiceContext {
    /// Source of today's date.
    pub clock: Box<dyn Clock>,
    /// Access to the mapping file.
    pub fs: Box<dyn FileSystem>,
    /// Identity directory connection.
    pub directory: Box<dyn Directory>,
    /// Course registration API.
    pub registry: Box<dyn CourseRegistry>,
    /// Service ticket issuer.
    pub credentials: Box<dyn TicketIssuer>,
    /// Entitlement service API.
    pub entitlements: Box<dyn EntitlementService>,
    /// Cassette written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

/// Live clients that need settings to be built. None of them contacts its
/// server before the first request.
struct LiveClients {
    directory: LiveDirectory,
    registry: LiveCourseRegistry,
    entitlements: LiveEntitlementService,
}

impl LiveClients {
    fn new(settings: &Settings) -> Result<Self> {
        let directory = LiveDirectory::new(&settings.directory);
        let registry = LiveCourseRegistry::new(&settings.course_registry)
            .map_err(|e| Error::Config(format!("course registry client: {e}")))?;
        let entitlements = LiveEntitlementService::new(&settings.entitlement_api.url)
            .map_err(|e| Error::Config(format!("entitlement service client: {e}")))?;
        Ok(Self { directory, registry, entitlements })
    }
}

impl ServiceContext {
    /// Wires every port to the real systems.
    ///
    /// Nothing is contacted here. The directory binds on its first search,
    /// so commands that only talk to the entitlement service keep working
    /// while the directory is down.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a client cannot be built from the settings.
    pub fn live(settings: &Settings) -> Result<Self> {
        let clients = LiveClients::new(settings)?;
        Ok(Self {
            clock: Box::new(LiveClock),
            fs: Box::new(LiveFileSystem),
            directory: Box::new(clients.directory),
            registry: Box::new(clients.registry),
            credentials: Box::new(LiveTicketIssuer),
            entitlements: Box::new(clients.entitlements),
            recorder: None,
        })
    }

    /// Like [`ServiceContext::live`], recording every interaction into a
    /// cassette written to `path` when the context is dropped.
    ///
    /// # Errors
    ///
    /// Fails like [`ServiceContext::live`].
    pub fn recording(settings: &Settings, path: &Path) -> Result<Self> {
        let clients = LiveClients::new(settings)?;
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "entsync-session")));
        Ok(Self {
            clock: Box::new(RecordingClock::new(Box::new(LiveClock), Arc::clone(&recorder))),
            fs: Box::new(LiveFileSystem),
            directory: Box::new(RecordingDirectory::new(
                Box::new(clients.directory),
                Arc::clone(&recorder),
            )),
            registry: Box::new(RecordingCourseRegistry::new(
                Box::new(clients.registry),
                Arc::clone(&recorder),
            )),
            credentials: Box::new(RecordingTicketIssuer::new(
                Box::new(LiveTicketIssuer),
                Arc::clone(&recorder),
            )),
            entitlements: Box::new(RecordingEntitlementService::new(
                Box::new(clients.entitlements),
                Arc::clone(&recorder),
            )),
            recorder: Some(recorder),
        })
    }

    /// Serves every network, time and credential port from a cassette.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the cassette cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self> {
        let cassette = Cassette::load(path).map_err(Error::Config)?;
        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));

        Ok(Self {
            clock: Box::new(ReplayingClock::new(Arc::clone(&replayer))),
            fs: Box::new(LiveFileSystem),
            directory: Box::new(ReplayingDirectory::new(Arc::clone(&replayer))),
            registry: Box::new(ReplayingCourseRegistry::new(Arc::clone(&replayer))),
            credentials: Box::new(ReplayingTicketIssuer::new(Arc::clone(&replayer))),
            entitlements: Box::new(ReplayingEntitlementService::new(replayer)),
            recorder: None,
        })
    }

    /// Builds a context from arbitrary port implementations.
    #[must_use]
    pub fn from_ports(
        clock: Box<dyn Clock>,
        fs: Box<dyn FileSystem>,
        directory: Box<dyn Directory>,
        registry: Box<dyn CourseRegistry>,
        credentials: Box<dyn TicketIssuer>,
        entitlements: Box<dyn EntitlementService>,
    ) -> Self {
        Self { clock, fs, directory, registry, credentials, entitlements, recorder: None }
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else { return };
        let Ok(recorder) = recorder.lock() else {
            warn!("cassette recorder lock poisoned; cassette not written");
            return;
        };
        match recorder.write() {
            Ok(path) => info!(path = %path.display(), "cassette written"),
            Err(e) => warn!(error = %e, "failed to write cassette"),
        }
    }
}
