/// Ability validation and effects.
pub mod abilities;
/// OpenAPI documentation generation.
pub mod documentation;
/// Command orchestration: locking, publishing and arming deadlines.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Announcement rendering and publication.
pub mod notifications;
/// Staleness-checked round deadlines.
pub mod round_scheduler;
/// Per-minigame scoring rules.
pub mod scoring;
/// Server-Sent Events streaming service.
pub mod sse_service;
