//! 平铺网格的索引算术.

use std::fmt;

use crate::aabb::Aabb;
use crate::tiling::InitTilingError;
use crate::{Coord3d, Idx3d};

/// 平铺索引或网格坐标越界错误.
///
/// 该错误永远意味着调用方违反契约, 不应重试, 应当立即向上传播.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutOfRangeError {
    /// tile 的平铺索引越界.
    Index {
        /// 请求的索引.
        index: usize,
        /// 网格内 tile 总数.
        len: usize,
    },

    /// tile 的网格坐标越界.
    Coords {
        /// 请求的网格坐标.
        coords: Idx3d,
        /// 网格形状.
        shape: Idx3d,
    },
}

impl fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index { index, len } => {
                write!(f, "平铺索引 {index} 越界, 网格内共 {len} 个 tile")
            }
            Self::Coords { coords, shape } => {
                write!(f, "网格坐标 {coords:?} 越界, 网格形状为 {shape:?}")
            }
        }
    }
}

impl std::error::Error for OutOfRangeError {}

/// 平铺网格: 记录覆盖范围内各轴的网格线起点, 并提供平铺索引与网格坐标
/// 的互换.
///
/// 网格线在构造时一次性算出, 每轴严格递增, 首条网格线即覆盖范围在该轴
/// 的低角点; 此后不再变化. 平铺索引按行优先排列, 最后一轴变化最快
/// (`x` 最慢, `z` 最快).
#[derive(Clone, Debug)]
pub struct TileGrid {
    extent: Aabb,
    lines: [Vec<i64>; 3],
    shape: Idx3d,
}

impl TileGrid {
    /// 在 `extent` 内以 `step` 为间距生成网格线.
    ///
    /// 每轴网格线为 `low, low + step, low + 2 * step, ...`, 严格小于该轴
    /// 的 `high`. 末尾不足一个完整步距的网格线同样保留, 其对应 tile 是否
    /// 截断由调用方决定.
    ///
    /// `step` 任一轴为 0 时网格线无法前进, 返回
    /// [`InitTilingError::ZeroStride`].
    pub fn with_step(extent: Aabb, step: Idx3d) -> Result<Self, InitTilingError> {
        let step = [step.0, step.1, step.2];
        let mut lines: [Vec<i64>; 3] = Default::default();
        for d in 0..3 {
            if step[d] == 0 {
                return Err(InitTilingError::ZeroStride { axis: d });
            }
            let mut pos = extent.low()[d];
            while pos < extent.high()[d] {
                lines[d].push(pos);
                pos += step[d] as i64;
            }
        }
        Ok(Self::from_lines(extent, lines))
    }

    /// 由已算好的网格线直接组装网格. 网格线须每轴严格递增.
    pub(crate) fn from_lines(extent: Aabb, lines: [Vec<i64>; 3]) -> Self {
        debug_assert!(lines
            .iter()
            .all(|l| l.windows(2).all(|w| w[0] < w[1])));
        let shape = (lines[0].len(), lines[1].len(), lines[2].len());
        Self {
            extent,
            lines,
            shape,
        }
    }

    /// 网格覆盖的范围盒.
    #[inline]
    pub fn extent(&self) -> Aabb {
        self.extent
    }

    /// 网格形状, 即每轴网格线条数.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.shape
    }

    /// 网格内 tile 总数.
    #[inline]
    pub fn len(&self) -> usize {
        let (x, y, z) = self.shape;
        x * y * z
    }

    /// 网格是否不含任何 tile.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 将平铺索引转换为网格坐标.
    ///
    /// `index` 不在 `[0, len)` 内时返回 `Err`.
    pub fn index_to_coords(&self, index: usize) -> Result<Idx3d, OutOfRangeError> {
        let (_, ny, nz) = self.shape;
        if index >= self.len() {
            return Err(OutOfRangeError::Index {
                index,
                len: self.len(),
            });
        }
        // 混合进制分解, 最后一轴最快.
        let x = index / (ny * nz);
        let rem = index % (ny * nz);
        Ok((x, rem / nz, rem % nz))
    }

    /// 将网格坐标转换为平铺索引. [`Self::index_to_coords`] 的精确逆运算.
    ///
    /// 任一坐标分量不在 `[0, shape[d])` 内时返回 `Err`.
    pub fn coords_to_index(&self, coords: Idx3d) -> Result<usize, OutOfRangeError> {
        let (x, y, z) = coords;
        let (nx, ny, nz) = self.shape;
        if x >= nx || y >= ny || z >= nz {
            return Err(OutOfRangeError::Coords {
                coords,
                shape: self.shape,
            });
        }
        Ok(x * ny * nz + y * nz + z)
    }

    /// 网格坐标对应的 tile 原点, 即各轴网格线起点.
    ///
    /// 坐标越界时程序 panic; 调用前须自行完成越界检查.
    #[inline]
    pub fn origin(&self, (x, y, z): Idx3d) -> Coord3d {
        [self.lines[0][x], self.lines[1][y], self.lines[2][z]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_10_4() -> TileGrid {
        TileGrid::with_step(Aabb::from_shape((10, 10, 10)), (4, 4, 4)).unwrap()
    }

    #[test]
    fn test_grid_lines() {
        let g = grid_10_4();
        assert_eq!(g.shape(), (3, 3, 3));
        assert_eq!(g.len(), 27);
        assert_eq!(g.origin((0, 0, 0)), [0, 0, 0]);
        assert_eq!(g.origin((2, 1, 0)), [8, 4, 0]);

        // 整除时不产生多余网格线.
        let g = TileGrid::with_step(Aabb::from_shape((8, 8, 8)), (4, 4, 4)).unwrap();
        assert_eq!(g.shape(), (2, 2, 2));
    }

    #[test]
    fn test_lines_of_offset_extent() {
        let g = TileGrid::with_step(Aabb::from_corners(5, 5, 5, 15, 15, 15), (4, 4, 4)).unwrap();
        assert_eq!(g.shape(), (3, 3, 3));
        assert_eq!(g.origin((0, 0, 0)), [5, 5, 5]);
        assert_eq!(g.origin((2, 2, 2)), [13, 13, 13]);
    }

    #[test]
    fn test_zero_step_is_error() {
        assert_eq!(
            TileGrid::with_step(Aabb::from_shape((10, 10, 10)), (4, 0, 4)).unwrap_err(),
            InitTilingError::ZeroStride { axis: 1 }
        );
    }

    #[test]
    fn test_index_round_trip() {
        let g = grid_10_4();
        for i in 0..g.len() {
            let coords = g.index_to_coords(i).unwrap();
            assert_eq!(g.coords_to_index(coords).unwrap(), i);
        }
        // 最后一轴最快.
        assert_eq!(g.index_to_coords(1).unwrap(), (0, 0, 1));
        assert_eq!(g.index_to_coords(3).unwrap(), (0, 1, 0));
        assert_eq!(g.index_to_coords(9).unwrap(), (1, 0, 0));
    }

    #[test]
    fn test_out_of_range() {
        let g = grid_10_4();
        assert_eq!(
            g.index_to_coords(27),
            Err(OutOfRangeError::Index { index: 27, len: 27 })
        );
        assert_eq!(
            g.coords_to_index((0, 3, 0)),
            Err(OutOfRangeError::Coords {
                coords: (0, 3, 0),
                shape: (3, 3, 3)
            })
        );
    }

    #[test]
    fn test_anisotropic_shape() {
        let g = TileGrid::with_step(Aabb::from_shape((10, 6, 3)), (4, 3, 2)).unwrap();
        assert_eq!(g.shape(), (3, 2, 2));
        for i in 0..g.len() {
            let coords = g.index_to_coords(i).unwrap();
            assert_eq!(g.coords_to_index(coords).unwrap(), i);
        }
    }
}
