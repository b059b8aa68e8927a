//! 对 3D 数组的边界安全读写.
//!
//! 画布接受任意 (可越界的) aabb: 读取时把越界部分按镜面反射补齐, 使
//! 返回数组形状恒等于请求盒的形状; 写入时把越界部分静默裁剪丢弃.
//! 反射采用 "镜面不重复边界体素" 约定, 即最靠外的在界体素不会在补齐
//! 区域中再次出现.

use std::fmt;

use ndarray::{s, Array3, ArrayBase, ArrayView3, Data, DataMut, Ix3, RawData};

use crate::aabb::{Aabb, Padding};
use crate::Idx3d;

/// 读取盒与画布有效范围完全不相交.
///
/// 对良构的平铺来说该情况不可能发生, 因此应视为平铺算术的断言失败,
/// 而非可恢复的用户错误.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EmptyRegionError {
    /// 请求的盒 (寻址坐标系下).
    pub requested: Aabb,

    /// 画布有效范围.
    pub domain: Aabb,
}

impl fmt::Display for EmptyRegionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "读取盒 {:?} 与画布有效范围 {:?} 完全不相交",
            self.requested, self.domain
        )
    }
}

impl std::error::Error for EmptyRegionError {}

/// [`AbsoluteCanvas`] 构造参数错误.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitCanvasError {
    /// 背景数组的形状与画布区域的形状不一致.
    AreaShapeMismatch {
        /// 出错的轴.
        axis: usize,
        /// 画布区域在该轴上的长度.
        area: usize,
        /// 背景数组在该轴上的长度.
        array: usize,
    },

    /// 画布区域未完全处于全局图像范围内.
    AreaOutOfImage {
        /// 画布区域.
        area: Aabb,
        /// 全局图像范围.
        image: Aabb,
    },
}

impl fmt::Display for InitCanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AreaShapeMismatch { axis, area, array } => {
                write!(
                    f,
                    "第 {axis} 轴上画布区域长度 ({area}) 与背景数组长度 ({array}) 不一致"
                )
            }
            Self::AreaOutOfImage { area, image } => {
                write!(f, "画布区域 {area:?} 未完全处于全局图像范围 {image:?} 内")
            }
        }
    }
}

impl std::error::Error for InitCanvasError {}

/// 画布的只读一侧: 对任意 aabb 的裁剪-补齐读取.
pub trait CanvasRead {
    /// 体素类型.
    type Elem: Clone;

    /// 画布的有效范围 (寻址坐标系下).
    fn domain(&self) -> Aabb;

    /// 读取 `aabb` 指定的区域.
    ///
    /// 若盒伸出有效范围, 越界部分按镜面反射 (不重复边界体素) 补齐,
    /// 返回数组的形状恒等于 `aabb.shape()`. 盒与有效范围完全不相交时
    /// 返回 `Err`.
    fn crop_and_pad_aabb(&self, aabb: &Aabb) -> Result<Array3<Self::Elem>, EmptyRegionError>;
}

/// 画布的可写一侧.
pub trait CanvasWrite: CanvasRead {
    /// 将 `tile` 写入 `aabb` 指定的区域.
    ///
    /// 盒伸出有效范围时, `tile` 的对应部分被裁剪丢弃; 完全在范围外的
    /// 写入是静默 no-op (写入零体积).
    ///
    /// `tile` 形状必须等于 `aabb.shape()`, 否则程序 panic.
    fn write_aabb(&mut self, aabb: &Aabb, tile: ArrayView3<'_, Self::Elem>);
}

/// 镜面反射下标: 补齐后第 `t` 个位置对应的源数组下标.
///
/// 低位侧 `-1, -2, ...` 依次映射到 `1, 2, ...`; 高位侧 `n, n + 1, ...`
/// 依次映射到 `n - 2, n - 3, ...` (边界体素不重复). 越界量超过一个轴长
/// 时按周期 `2 * (n - 1)` 的三角波反复折返, 与 numpy 的 `reflect` 模式
/// 一致; 单体素轴退化为复制该体素.
#[inline]
fn reflect_index(t: usize, pad_low: usize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as i64 - 1);
    let m = (t as i64 - pad_low as i64).rem_euclid(period);
    if m >= n as i64 {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// 将 `data` 按 `pad` 镜面反射补齐. 反射不重复边界体素.
fn reflect_pad<A: Clone>(data: ArrayView3<'_, A>, pad: &Padding) -> Array3<A> {
    if pad.is_zero() {
        return data.to_owned();
    }
    let dim = data.dim();
    let n = [dim.0, dim.1, dim.2];
    Array3::from_shape_fn(
        (
            n[0] + pad.low[0] + pad.high[0],
            n[1] + pad.low[1] + pad.high[1],
            n[2] + pad.low[2] + pad.high[2],
        ),
        |(i, j, k)| {
            data[(
                reflect_index(i, pad.low[0], n[0]),
                reflect_index(j, pad.low[1], n[1]),
                reflect_index(k, pad.low[2], n[2]),
            )]
                .clone()
        },
    )
}

/// 裁剪-补齐读取的公共实现. `domain` 为画布有效范围, 背景数组的原点
/// 与 `domain` 低角点对齐.
fn read_clipped<A, S>(
    image: &ArrayBase<S, Ix3>,
    domain: &Aabb,
    aabb: &Aabb,
) -> Result<Array3<A>, EmptyRegionError>
where
    A: Clone,
    S: Data<Elem = A>,
{
    let (clipped, pad) = aabb.clip_to(domain);
    if clipped.is_empty() {
        return Err(EmptyRegionError {
            requested: *aabb,
            domain: *domain,
        });
    }
    // 平移到背景数组的局部坐标系.
    let origin = domain.low();
    let local = clipped.translate([-origin[0], -origin[1], -origin[2]]);
    let (lo, hi) = (local.low(), local.high());
    let view = image.slice(s![
        lo[0] as usize..hi[0] as usize,
        lo[1] as usize..hi[1] as usize,
        lo[2] as usize..hi[2] as usize
    ]);
    Ok(reflect_pad(view, &pad))
}

/// 裁剪写入的公共实现. 约定同 [`read_clipped`].
fn write_clipped<A, S>(
    image: &mut ArrayBase<S, Ix3>,
    domain: &Aabb,
    aabb: &Aabb,
    tile: ArrayView3<'_, A>,
) where
    A: Clone,
    S: DataMut<Elem = A>,
{
    let (tx, ty, tz) = tile.dim();
    assert_eq!(
        (tx, ty, tz),
        aabb.shape(),
        "tile 形状 {:?} 与目标盒形状 {:?} 不一致",
        (tx, ty, tz),
        aabb.shape()
    );
    let (clipped, pad) = aabb.clip_to(domain);
    if clipped.is_empty() {
        // 完全在画布外, 静默丢弃.
        return;
    }
    let cropped = tile.slice(s![
        pad.low[0]..tx - pad.high[0],
        pad.low[1]..ty - pad.high[1],
        pad.low[2]..tz - pad.high[2]
    ]);
    let origin = domain.low();
    let local = clipped.translate([-origin[0], -origin[1], -origin[2]]);
    let (lo, hi) = (local.low(), local.high());
    image
        .slice_mut(s![
            lo[0] as usize..hi[0] as usize,
            lo[1] as usize..hi[1] as usize,
            lo[2] as usize..hi[2] as usize
        ])
        .assign(&cropped);
}

/// 对单个内存 3D 数组的边界安全读写适配器, 寻址原点即数组原点.
///
/// 通过存储参数 `S` 同时适配持有数组、不可变视图与可变视图
/// (分别对应输出的组装、输入的只读访问与原地写回).
pub struct Canvas<S: RawData> {
    image: ArrayBase<S, Ix3>,
}

impl<S: RawData> Canvas<S> {
    /// 包装一个 3D 数组.
    #[inline]
    pub fn new(image: ArrayBase<S, Ix3>) -> Self {
        Self { image }
    }

    /// 背景数组的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.image.dim()
    }

    /// 取回背景数组.
    #[inline]
    pub fn into_inner(self) -> ArrayBase<S, Ix3> {
        self.image
    }
}

impl<S: Data> Canvas<S> {
    /// 背景数组的一份不可变 shallow copy.
    #[inline]
    pub fn view(&self) -> ArrayView3<'_, S::Elem> {
        self.image.view()
    }
}

impl<S> fmt::Debug for Canvas<S>
where
    S: RawData,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("shape", &self.image.dim())
            .finish_non_exhaustive()
    }
}

impl<S> CanvasRead for Canvas<S>
where
    S: Data,
    S::Elem: Clone,
{
    type Elem = S::Elem;

    #[inline]
    fn domain(&self) -> Aabb {
        Aabb::from_shape(self.image.dim())
    }

    fn crop_and_pad_aabb(&self, aabb: &Aabb) -> Result<Array3<S::Elem>, EmptyRegionError> {
        read_clipped(&self.image, &self.domain(), aabb)
    }
}

impl<S> CanvasWrite for Canvas<S>
where
    S: DataMut,
    S::Elem: Clone,
{
    fn write_aabb(&mut self, aabb: &Aabb, tile: ArrayView3<'_, S::Elem>) {
        let domain = self.domain();
        write_clipped(&mut self.image, &domain, aabb, tile);
    }
}

/// 背景数组只覆盖更大逻辑坐标空间中一个子盒的画布.
///
/// 所有请求盒都以全局坐标表示; 读写前先裁剪到子盒 (`canvas_area`)
/// 范围, 再平移到背景数组的局部坐标系. 全局图像形状只用于构造时校验
/// 画布区域的合法性, 不参与内存分配.
pub struct AbsoluteCanvas<S: RawData> {
    image: ArrayBase<S, Ix3>,
    canvas_area: Aabb,
    image_shape: Idx3d,
}

impl<S: RawData> AbsoluteCanvas<S> {
    /// 以 `canvas_area` 定位 `image` 在形状为 `image_shape` 的全局坐标
    /// 空间中的位置. `canvas_area` 缺省为整幅图像.
    ///
    /// 背景数组形状必须与 `canvas_area` 形状一致, 且 `canvas_area` 必须
    /// 处于全局图像范围内, 否则返回 `Err`.
    pub fn new(
        image_shape: Idx3d,
        canvas_area: Option<Aabb>,
        image: ArrayBase<S, Ix3>,
    ) -> Result<Self, InitCanvasError> {
        let image_extent = Aabb::from_shape(image_shape);
        let canvas_area = canvas_area.unwrap_or(image_extent);
        if !image_extent.contains(&canvas_area) {
            return Err(InitCanvasError::AreaOutOfImage {
                area: canvas_area,
                image: image_extent,
            });
        }
        let dim = image.dim();
        let array = [dim.0, dim.1, dim.2];
        let shape = canvas_area.shape();
        let area = [shape.0, shape.1, shape.2];
        for axis in 0..3 {
            if area[axis] != array[axis] {
                return Err(InitCanvasError::AreaShapeMismatch {
                    axis,
                    area: area[axis],
                    array: array[axis],
                });
            }
        }
        Ok(Self {
            image,
            canvas_area,
            image_shape,
        })
    }

    /// 画布区域, 即背景数组在全局坐标空间中的位置.
    #[inline]
    pub fn canvas_area(&self) -> Aabb {
        self.canvas_area
    }

    /// 全局图像形状.
    #[inline]
    pub fn image_shape(&self) -> Idx3d {
        self.image_shape
    }

    /// 取回背景数组.
    #[inline]
    pub fn into_inner(self) -> ArrayBase<S, Ix3> {
        self.image
    }
}

impl<S: Data> AbsoluteCanvas<S> {
    /// 背景数组的一份不可变 shallow copy.
    #[inline]
    pub fn view(&self) -> ArrayView3<'_, S::Elem> {
        self.image.view()
    }
}

impl<S> fmt::Debug for AbsoluteCanvas<S>
where
    S: RawData,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsoluteCanvas")
            .field("canvas_area", &self.canvas_area)
            .field("image_shape", &self.image_shape)
            .finish_non_exhaustive()
    }
}

impl<S> CanvasRead for AbsoluteCanvas<S>
where
    S: Data,
    S::Elem: Clone,
{
    type Elem = S::Elem;

    #[inline]
    fn domain(&self) -> Aabb {
        self.canvas_area
    }

    fn crop_and_pad_aabb(&self, aabb: &Aabb) -> Result<Array3<S::Elem>, EmptyRegionError> {
        read_clipped(&self.image, &self.canvas_area, aabb)
    }
}

impl<S> CanvasWrite for AbsoluteCanvas<S>
where
    S: DataMut,
    S::Elem: Clone,
{
    fn write_aabb(&mut self, aabb: &Aabb, tile: ArrayView3<'_, S::Elem>) {
        let domain = self.canvas_area;
        write_clipped(&mut self.image, &domain, aabb, tile);
    }
}
