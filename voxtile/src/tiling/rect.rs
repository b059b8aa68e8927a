//! 图像对齐的矩形分块.

use itertools::iproduct;

use super::InitTilingError;
use crate::aabb::Aabb;
use crate::grid::{OutOfRangeError, TileGrid};
use crate::Idx3d;

/// 将体积划分为与图像对齐、互不重叠的固定形状块的平铺.
///
/// 各轴最后一块若伸出图像边界, 其高角点被截断到图像边界; 因此该平铺的
/// 读取永远不需要补齐 (补齐是 canvas 的职责, 此处用不到).
#[derive(Clone, Debug)]
pub struct RectangularTiling {
    grid: TileGrid,
    image: Aabb,
    chunk_shape: Idx3d,
}

impl RectangularTiling {
    /// 以 `chunk_shape` 为块形状划分形状为 `image_shape` 的图像.
    ///
    /// 图像与块形状每轴都必须为正, 否则返回 `Err`.
    pub fn new(image_shape: Idx3d, chunk_shape: Idx3d) -> Result<Self, InitTilingError> {
        let image = Aabb::from_shape(image_shape);
        if image.is_empty() {
            return Err(InitTilingError::EmptySubvolume { subvolume: image });
        }
        let chunk = [chunk_shape.0, chunk_shape.1, chunk_shape.2];
        for (axis, len) in chunk.into_iter().enumerate() {
            if len == 0 {
                return Err(InitTilingError::EmptyTileShape { axis });
            }
        }
        let grid = TileGrid::with_step(image, chunk_shape)?;
        Ok(Self {
            grid,
            image,
            chunk_shape,
        })
    }

    /// 内部网格, 提供索引算术.
    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// tile 总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// 是否不含任何 tile. 构造保证网格非空, 该方法只为满足惯例.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// 平铺形状, 即每轴块数.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.grid.shape()
    }

    /// 块形状.
    #[inline]
    pub fn chunk_shape(&self) -> Idx3d {
        self.chunk_shape
    }

    /// 将平铺索引转换为网格坐标.
    #[inline]
    pub fn index_to_coords(&self, index: usize) -> Result<Idx3d, OutOfRangeError> {
        self.grid.index_to_coords(index)
    }

    /// 将网格坐标转换为平铺索引.
    #[inline]
    pub fn coords_to_index(&self, coords: Idx3d) -> Result<usize, OutOfRangeError> {
        self.grid.coords_to_index(coords)
    }

    /// 第 `index` 块的包围盒. 高角点已截断到图像边界.
    pub fn tile_at(&self, index: usize) -> Result<Aabb, OutOfRangeError> {
        Ok(self.tile_at_coords(self.grid.index_to_coords(index)?))
    }

    /// 由网格坐标直接生成包围盒. 坐标须已通过越界检查.
    fn tile_at_coords(&self, coords: Idx3d) -> Aabb {
        let low = self.grid.origin(coords);
        let chunk = [
            self.chunk_shape.0 as i64,
            self.chunk_shape.1 as i64,
            self.chunk_shape.2 as i64,
        ];
        let mut high = [0i64; 3];
        for d in 0..3 {
            high[d] = (low[d] + chunk[d]).min(self.image.high()[d]);
        }
        Aabb::new(low, high)
    }

    /// 按平铺索引升序迭代所有块的包围盒.
    pub fn iter(&self) -> impl Iterator<Item = Aabb> + '_ {
        let (nx, ny, nz) = self.grid.shape();
        iproduct!(0..nx, 0..ny, 0..nz).map(|c| self.tile_at_coords(c))
    }
}
