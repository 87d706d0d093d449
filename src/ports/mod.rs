use anyhow::Result;

use crate::domain::surface::SurfaceSnapshot;

/// Where an API surface comes from: the stub tree, a captured snapshot file,
/// or anything else able to list module members.
pub trait SurfaceSource {
    fn load(&self) -> Result<SurfaceSnapshot>;

    /// Short label for log and error messages.
    fn describe(&self) -> String;
}
