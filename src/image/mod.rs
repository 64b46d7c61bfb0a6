//! Native-image build step
//!
//! The leaf resolvers ([`ClasspathResolver`], [`VolumeMapper`],
//! [`UidResolver`], [`MainClassResolver`]) are independent of each other.
//! [`VersionProbe`] and [`CommandBuilder`] build on them and
//! [`NativeImageStep`] drives the whole sequence.

pub mod classpath;
pub mod command;
pub mod identity;
pub mod main_class;
pub mod orchestrator;
pub mod version;
pub mod volumes;

pub use classpath::{Classpath, ClasspathResolver, LayoutWarning};
pub use command::{compiler_args, BuildCommand, CommandBuilder, ContainerInvocation};
pub use identity::{ContainerUser, UidResolver};
pub use main_class::{MainClassProvider, MainClassResolver, MainClassSource, ResolvedMainClass};
pub use orchestrator::{BuildPlan, ContainerPlan, NativeImageStep, StepOutcome};
pub use version::{
    check_compatibility, major_minor, CompilerLocation, VersionInfo, VersionMismatch,
    VersionProbe, UNKNOWN_VERSION,
};
pub use volumes::{DiscardReason, DiscardedVolume, VolumeMapper, VolumeMapping, VolumeSet};
