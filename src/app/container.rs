use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{FFmpegAdapter, FsLocalAdapter, YtDlpAdapter};
use crate::app::random::SharedRng;
use crate::app::{
    AcquireInteractor, AssembleInteractor, ExtractInteractor, GenerationSession,
    LibraryInteractor, OverlayInteractor, Scheduler,
};
use crate::config::AppConfig;
use crate::domain::errors::DomainError;
use crate::ports::{FsPort, ProbePort, RenderPort, SourcePort};

pub trait AppContainer: Send + Sync {
    fn acquire_interactor(&self) -> Arc<AcquireInteractor>;
    fn extract_interactor(&self) -> Arc<ExtractInteractor>;
    fn overlay_interactor(&self) -> Arc<OverlayInteractor>;
    fn assemble_interactor(&self) -> Arc<AssembleInteractor>;
    fn library_interactor(&self) -> Arc<LibraryInteractor>;
    fn session(&self) -> Arc<GenerationSession>;
    fn scheduler(&self) -> Arc<Scheduler>;
}

pub struct DefaultAppContainer {
    acquire_interactor: Arc<AcquireInteractor>,
    extract_interactor: Arc<ExtractInteractor>,
    overlay_interactor: Arc<OverlayInteractor>,
    assemble_interactor: Arc<AssembleInteractor>,
    library_interactor: Arc<LibraryInteractor>,
    session: Arc<GenerationSession>,
    scheduler: Arc<Scheduler>,
}

impl DefaultAppContainer {
    /// Wire the production adapters for `config`
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate()?;

        #[cfg(feature = "libav")]
        let probe_port: Arc<dyn ProbePort> = Arc::new(crate::adapters::ProbeLibavAdapter::new()?);
        #[cfg(not(feature = "libav"))]
        let probe_port: Arc<dyn ProbePort> = 
            Arc::new(crate::adapters::FFprobeAdapter::new(config.tools.ffprobe.clone()));

        Ok(Self::with_ports(
            config,
            probe_port,
            Arc::new(YtDlpAdapter::new(config.tools.yt_dlp.clone())),
            Arc::new(FFmpegAdapter::new(config.tools.ffmpeg.clone())),
            Arc::new(FsLocalAdapter::new()),
            None,
        ))
    }

    /// Wire interactors over arbitrary ports. A seed makes every random
    /// choice reproducible.
    pub fn with_ports(
        config: &AppConfig,
        probe_port: Arc<dyn ProbePort>,
        source_port: Arc<dyn SourcePort>,
        render_port: Arc<dyn RenderPort>,
        fs_port: Arc<dyn FsPort>,
        seed: Option<u64>,
    ) -> Self {
        let rng = |offset: u64| match seed {
            Some(seed) => SharedRng::seeded(seed.wrapping_add(offset)),
            None => SharedRng::from_entropy(),
        };

        let acquire_interactor = Arc::new(AcquireInteractor::new(
            Arc::clone(&source_port),
            Arc::clone(&probe_port),
            Arc::clone(&fs_port),
            config,
            rng(1),
        ));

        let extract_interactor = Arc::new(ExtractInteractor::new(
            Arc::clone(&render_port),
            Arc::clone(&fs_port),
            config,
            rng(2),
        ));

        let overlay_interactor = Arc::new(OverlayInteractor::new(
            Arc::clone(&render_port),
            Arc::clone(&fs_port),
            config,
        ));

        let assemble_interactor = Arc::new(AssembleInteractor::new(
            Arc::clone(&extract_interactor),
            Arc::clone(&overlay_interactor),
            Arc::clone(&render_port),
            Arc::clone(&probe_port),
            Arc::clone(&fs_port),
            config,
            rng(3),
        ));

        let library_interactor = Arc::new(LibraryInteractor::new(
            Arc::clone(&probe_port),
            Arc::clone(&fs_port),
            config,
        ));

        let session = Arc::new(GenerationSession::new(
            Arc::clone(&acquire_interactor),
            Arc::clone(&assemble_interactor),
            config.source_batch_size,
        ));

        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&session),
            Duration::from_secs(config.generation_interval_hours * 3600),
        ));

        Self {
            acquire_interactor,
            extract_interactor,
            overlay_interactor,
            assemble_interactor,
            library_interactor,
            session,
            scheduler,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn acquire_interactor(&self) -> Arc<AcquireInteractor> {
        Arc::clone(&self.acquire_interactor)
    }

    fn extract_interactor(&self) -> Arc<ExtractInteractor> {
        Arc::clone(&self.extract_interactor)
    }

    fn overlay_interactor(&self) -> Arc<OverlayInteractor> {
        Arc::clone(&self.overlay_interactor)
    }

    fn assemble_interactor(&self) -> Arc<AssembleInteractor> {
        Arc::clone(&self.assemble_interactor)
    }

    fn library_interactor(&self) -> Arc<LibraryInteractor> {
        Arc::clone(&self.library_interactor)
    }

    fn session(&self) -> Arc<GenerationSession> {
        Arc::clone(&self.session)
    }

    fn scheduler(&self) -> Arc<Scheduler> {
        Arc::clone(&self.scheduler)
    }
}
