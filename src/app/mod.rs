// Application layer - Use case interactors

pub mod acquire_interactor;
pub mod assemble_interactor;
pub mod container;
pub mod extract_interactor;
pub mod library_interactor;
pub mod overlay_interactor;
pub mod random;
pub mod scheduler;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-export interactors
pub use acquire_interactor::AcquireInteractor;
pub use assemble_interactor::AssembleInteractor;
pub use container::{AppContainer, DefaultAppContainer};
pub use extract_interactor::ExtractInteractor;
pub use library_interactor::LibraryInteractor;
pub use overlay_interactor::OverlayInteractor;
pub use scheduler::Scheduler;
pub use session::GenerationSession;
