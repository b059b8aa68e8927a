//! 平铺与画布的组合: 按平铺索引读写 tile.

use std::fmt;

use cfg_if::cfg_if;
use ndarray::{Array3, ArrayView3, OwnedRepr, ViewRepr};
use num::Zero;

use crate::canvas::{Canvas, CanvasRead, CanvasWrite, EmptyRegionError};
use crate::grid::OutOfRangeError;
use crate::tiling::{InitTilingError, WindowedTiling};
use crate::Idx3d;

cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::prelude::*;
    }
}

/// 按索引读写 tile 时可能出现的错误.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileIoError {
    /// 平铺索引或网格坐标越界.
    OutOfRange(OutOfRangeError),

    /// 请求盒与画布有效范围完全不相交.
    EmptyRegion(EmptyRegionError),
}

impl fmt::Display for TileIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(e) => e.fmt(f),
            Self::EmptyRegion(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for TileIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::OutOfRange(e) => Some(e),
            Self::EmptyRegion(e) => Some(e),
        }
    }
}

impl From<OutOfRangeError> for TileIoError {
    #[inline]
    fn from(e: OutOfRangeError) -> Self {
        Self::OutOfRange(e)
    }
}

impl From<EmptyRegionError> for TileIoError {
    #[inline]
    fn from(e: EmptyRegionError) -> Self {
        Self::EmptyRegion(e)
    }
}

/// 整幅图像在内存中时的标准组合: 输入为不可变视图上的画布, 输出为持有
/// 数组的画布.
pub type VolumeTiler<'a, A> = Tiler<Canvas<ViewRepr<&'a A>>, Canvas<OwnedRepr<A>>>;

/// 将滑动窗口平铺与一对画布组合起来, 提供按平铺索引的 tile 读写.
///
/// 输入画布承载原始体视数据, 只读; 输出画布承载处理结果, 可读可写.
/// 处理循环的基本形态:
///
/// 1. `context_tile(i)` 读出第 `i` 个 tile 的 context 体积 (越界部分已
///    反射补齐);
/// 2. 交给外部处理单元, 得到 core 形状的结果;
/// 3. `write_core_tile(i, result)` 写回输出画布 (越界部分被裁剪).
///
/// 各索引之间不共享可变状态, 读取侧可以安全地按索引并行.
pub struct Tiler<I, O>
where
    I: CanvasRead,
    O: CanvasWrite<Elem = I::Elem>,
{
    tiling: WindowedTiling,
    input: I,
    output: O,
}

impl<I, O> Tiler<I, O>
where
    I: CanvasRead,
    O: CanvasWrite<Elem = I::Elem>,
{
    /// 组合平铺与输入/输出画布.
    ///
    /// 画布的有效范围不必覆盖所有 tile: 越界读取反射补齐, 越界写入裁剪
    /// 丢弃, 都由画布自行处理.
    #[inline]
    pub fn new(tiling: WindowedTiling, input: I, output: O) -> Self {
        Self {
            tiling,
            input,
            output,
        }
    }

    /// 内部平铺.
    #[inline]
    pub fn tiling(&self) -> &WindowedTiling {
        &self.tiling
    }

    /// 输入画布.
    #[inline]
    pub fn input(&self) -> &I {
        &self.input
    }

    /// 输出画布.
    #[inline]
    pub fn output(&self) -> &O {
        &self.output
    }

    /// 输出画布的可变借用.
    #[inline]
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// 拆解自身, 取回输出画布. 处理循环结束后提取结果用.
    #[inline]
    pub fn into_output(self) -> O {
        self.output
    }

    /// tile 总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiling.len()
    }

    /// 是否不含任何 tile.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiling.is_empty()
    }

    /// 平铺形状, 即每轴 tile 数.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.tiling.shape()
    }

    /// 从输入画布读出第 `index` 个 tile 的 context 体积.
    ///
    /// 返回数组形状恒等于 context 形状.
    pub fn context_tile(&self, index: usize) -> Result<Array3<I::Elem>, TileIoError> {
        let aabb = self.tiling.context_tile_at(index)?;
        Ok(self.input.crop_and_pad_aabb(&aabb)?)
    }

    /// 从输出画布读出第 `index` 个 tile.
    ///
    /// `cropped` 为真时读 core 盒 (形状等于 core 形状); 为假时读 context
    /// 盒, 得到与 [`Self::context_tile`] 逐体素对齐的 context 形状数组,
    /// 供需要对输入与输出做同构变换的调用方使用.
    pub fn core_tile(&self, index: usize, cropped: bool) -> Result<Array3<I::Elem>, TileIoError> {
        let aabb = if cropped {
            self.tiling.core_tile_at(index)?
        } else {
            self.tiling.context_tile_at(index)?
        };
        Ok(self.output.crop_and_pad_aabb(&aabb)?)
    }

    /// 将 core 形状的结果写回输出画布的第 `index` 个 core 盒.
    ///
    /// 越界部分被裁剪丢弃. `tile` 形状必须等于 core 形状, 否则程序
    /// panic.
    pub fn write_core_tile(
        &mut self,
        index: usize,
        tile: ArrayView3<'_, I::Elem>,
    ) -> Result<(), TileIoError> {
        let aabb = self.tiling.core_tile_at(index)?;
        self.output.write_aabb(&aabb, tile);
        Ok(())
    }

    /// 按平铺索引升序迭代所有 context tile.
    pub fn context_tiles(
        &self,
    ) -> impl Iterator<Item = Result<Array3<I::Elem>, TileIoError>> + '_ {
        (0..self.len()).map(move |i| self.context_tile(i))
    }

    /// 并行地对每个 (索引, context tile) 对调用 `op`.
    ///
    /// 只涉及输入画布的只读访问, 各索引互不相干; 写回侧仍须由调用方
    /// 串行完成 (或自行对输出分段加锁).
    #[cfg(feature = "rayon")]
    pub fn par_for_each_context_tile<F>(&self, op: F) -> Result<(), TileIoError>
    where
        I: Sync,
        I::Elem: Send,
        O: Sync,
        F: Fn(usize, Array3<I::Elem>) + Sync,
    {
        (0..self.len()).into_par_iter().try_for_each(|i| {
            let tile = self.context_tile(i)?;
            op(i, tile);
            Ok(())
        })
    }
}

impl<'a, A> VolumeTiler<'a, A>
where
    A: Clone + Zero,
{
    /// 对一幅完整在内存中的图像建立标准 tiler: 输入画布包装 `image`
    /// 视图, 输出画布持有 `mask` (缺省为同形状的全零数组), 平铺覆盖整幅
    /// 图像.
    ///
    /// `mask` 与 `image` 形状必须一致, 否则程序 panic.
    pub fn for_entire_volume(
        image: ArrayView3<'a, A>,
        mask: Option<Array3<A>>,
        core_shape: Idx3d,
        context_shape: Idx3d,
    ) -> Result<Self, InitTilingError> {
        let dim = image.dim();
        let mask = mask.unwrap_or_else(|| Array3::zeros(dim));
        assert_eq!(
            mask.dim(),
            dim,
            "mask 形状 {:?} 与图像形状 {:?} 不一致",
            mask.dim(),
            dim
        );
        let tiling = WindowedTiling::new(dim, None, core_shape, context_shape)?;
        Ok(Self::new(tiling, Canvas::new(image), Canvas::new(mask)))
    }
}

impl<I, O> fmt::Debug for Tiler<I, O>
where
    I: CanvasRead,
    O: CanvasWrite<Elem = I::Elem>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tiler")
            .field("tiling", &self.tiling)
            .field("input_domain", &self.input.domain())
            .field("output_domain", &self.output.domain())
            .finish()
    }
}
