//! 🧊欢迎光临🧊
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Coord3d, Idx3d};

pub use crate::{Aabb, Padding};

pub use crate::{RectangularTiling, TileGrid, WindowedTiling};

pub use crate::{AbsoluteCanvas, Canvas, CanvasRead, CanvasWrite};

pub use crate::{Tiler, VolumeTiler};

pub use crate::consts::{DEFAULT_CONTEXT_SHAPE, DEFAULT_CORE_SHAPE, DEFAULT_HALO};

pub use crate::{
    EmptyRegionError, InitCanvasError, InitTilingError, OutOfRangeError, TileIoError,
};
