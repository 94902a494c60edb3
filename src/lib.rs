//! synheart-hsi-core — an on-device streaming fusion core that turns
//! biosignal, behavioral, and contextual signals into signed HSI 1.0 Human
//! State Vector snapshots.
//!
//! # Privacy Guarantees
//!
//! - **No raw biosignal export**: only derived metrics ever leave the device
//! - **No key content or cursor coordinates**: only timing and magnitude
//! - **Consent-gated**: each module (biosignal/behavior/context) is only
//!   fused when the user has granted consent and capability allows it
//! - **Transparency**: every pipeline stage is counted and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      synheart-hsi-core                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐  │
//! │  │ Ingestion │──▶│  Window   │──▶│  Features   │──▶│  Fusion   │  │
//! │  │  fan-in   │   │ aggregator│   │ extractors  │   │  engine   │  │
//! │  └───────────┘   └───────────┘   └────────────┘   └─────┬─────┘  │
//! │                         ▲ driven by Scheduler             │        │
//! │                                                            ▼        │
//! │                                            ┌────────────────────┐  │
//! │                                            │   HSI exporter      │  │
//! │                                            └──────────┬─────────┘  │
//! │                                                        ▼            │
//! │                                            ┌────────────────────┐  │
//! │                                            │   Upload client      │  │
//! │                                            └────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod exporter;
pub mod features;
pub mod fusion;
pub mod ingestion;
pub mod oracles;
pub mod scheduler;
pub mod transparency;
pub mod types;
pub mod window;

#[cfg(feature = "gateway")]
pub mod upload;

#[cfg(feature = "server")]
pub mod server;

pub use config::Config;
pub use error::{CoreError, SourceStreamError, UploadError};
pub use exporter::{HsiExporter, HsiSnapshot, HSI_VERSION};
pub use fusion::FusionEngine;
pub use ingestion::Fanin;
pub use oracles::{CapabilityLevel, CapabilityOracle, ConsentOracle, ConsentRecord, Module};
pub use scheduler::WindowScheduler;
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};
pub use types::{Hsv, WindowType, HSV_VERSION};
pub use window::WindowAggregator;

#[cfg(feature = "gateway")]
pub use upload::{UploadClient, UploadConfig, UploadQueue, UploadRequest, UploadResponse, UploadSubject};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              SYNHEART HSI CORE - PRIVACY DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This core fuses biosignal, behavioral, and contextual signals   ║
║  on-device into a Human State Vector.                            ║
║                                                                  ║
║  ✓ WHAT LEAVES THE DEVICE (only if consented and uploaded):      ║
║    • Derived, aggregated metrics (rates, ratios, indices)         ║
║    • A fixed-dimension state embedding                           ║
║                                                                  ║
║  ✗ WHAT NEVER LEAVES THE DEVICE:                                 ║
║    • Raw biosignal waveforms or RR-interval series                ║
║    • Which keys are pressed, message content, or cursor position ║
║    • Per-module data when consent for that module is withheld    ║
║                                                                  ║
║  You can view collection statistics anytime with:                ║
║    synheart-hsi status                                           ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
