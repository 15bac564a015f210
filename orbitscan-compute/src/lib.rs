mod algorithms;
pub mod cancellation;
pub mod computers;
pub mod engine;
pub mod iterate;
pub mod periodicity;
pub mod plugin;
pub mod registry;
pub mod store;
pub mod symmetry;
pub mod worklist;

pub use cancellation::{AtomicBoolChecker, CancelAfterPolls, CancellationChecker, NeverCancel};
pub use computers::{
    BigMandelbrotPlugin, ConstantEscape, FieldOrbit, JuliaPlugin, MandelbrotPlugin, PeriodicOrbit,
};
pub use engine::Engine;
pub use plugin::{Attractor, ImageSetup, OrbitPlugin};
pub use registry::{create_plugin, get_plugin_entry, select_plugin, PluginEntry, PLUGINS};
pub use store::{Canvas, PixelStore};
pub use worklist::WorkList;

// Re-export core types for convenience
pub use orbitscan_core::*;
