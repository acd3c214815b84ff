//! In-memory scene used to exercise `reflect_mcp` end to end
//!
//! [`SceneHost`] owns entities (`GameObject`), components (`Transform`, `Light`,
//! `MeshRenderer`) and assets (`Material`) behind integer handles. [`scene_reflector`] registers
//! the matching types and methods.

mod host;
mod methods;
pub mod scene;

pub use host::DemoScene;
pub use host::SceneHost;
pub use methods::scene_methods;
pub use methods::scene_reflector;
