#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod error;
pub mod geometry;
pub mod input;
pub mod job;
pub mod persistence;
pub mod profile;
pub mod selector;
pub mod signal;
pub mod surface;

pub use app::ProfilerApp;
pub use error::{ProfileError, Result};
pub use geometry::{Extent, Handle, RenderPrimitive, ShapeKind};
pub use input::{DragModifiers, PointerEvent, PointerLocation};
pub use job::{ActiveLine, JobInput, JobStatus, LineProfilesJob, LineRecord, OutputRecord};
pub use persistence::{JobSnapshot, PersistenceError, StatePersistence};
pub use profile::{LineProfile, LineRegion, LineStyle};
pub use selector::roi::RoiSelector;
pub use selector::{SelectionResult, ShapeSelector};
pub use signal::{AxisCalibration, Profile1d, Signal2d};
pub use surface::{DisplaySurface, ShapeStyle, ShapeVisual, SurfaceHandle};
