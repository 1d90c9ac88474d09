//! Read-only state shared by every step of a mapping run.

use qmap_platform::Platform;

use crate::grid::Grid;
use crate::options::MapperOptions;

/// Platform, grid and options of one mapping run.
///
/// Passed by value into every component instead of being looked up
/// globally; it is three references and copies freely.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    /// Target platform.
    pub platform: &'a Platform,
    /// Its topology.
    pub grid: &'a Grid,
    /// Mapper options.
    pub options: &'a MapperOptions,
}

impl<'a> MapContext<'a> {
    /// Bundle the three.
    pub fn new(platform: &'a Platform, grid: &'a Grid, options: &'a MapperOptions) -> Self {
        Self {
            platform,
            grid,
            options,
        }
    }

    /// Device time units per cycle.
    pub fn cycle_time(&self) -> u64 {
        self.platform.cycle_time()
    }
}
