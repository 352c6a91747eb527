//! Thread-safety helper bounds shared by every bridge trait.
//!
//! Bridge implementations are held behind `Arc<dyn Trait>` and shared freely
//! across request-handling tasks, so every capability must be `Send + Sync`.

/// Marker trait for `Send + Sync` bridge implementations.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync {}
