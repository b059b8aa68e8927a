//! 轴对齐包围盒.

use crate::{Coord3d, Idx3d};

/// 包围盒被裁剪后各轴两侧的缺口量, 以体素为单位.
///
/// 读取时该量即反射补齐量, 写入时即 tile 两侧被裁掉的量.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Padding {
    /// 各轴低位侧 (靠近原点一侧) 的缺口量.
    pub low: [usize; 3],

    /// 各轴高位侧的缺口量.
    pub high: [usize; 3],
}

impl Padding {
    /// 六个方向是否都没有缺口.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.low == [0; 3] && self.high == [0; 3]
    }
}

/// 轴对齐包围盒 (axis aligned bounding box), 即六元组
/// `(x0, y0, z0, x1, y1, z1)` 所描述的长方体.
///
/// 低角点包含, 高角点不包含. 坐标允许为负 (如 context 盒从图像低边缘
/// 向外扩张), 因此以 `i64` 存储. 该结构是只读值类型, 每次平铺计算都
/// 产生新盒, 从不原地修改.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    low: Coord3d,
    high: Coord3d,
}

impl Aabb {
    /// 由低角点和高角点创建包围盒.
    ///
    /// 若任一轴上 `high < low`, 则程序 panic.
    pub fn new(low: Coord3d, high: Coord3d) -> Self {
        for d in 0..3 {
            assert!(
                low[d] <= high[d],
                "第 {d} 轴角点反转: low = {}, high = {}",
                low[d],
                high[d]
            );
        }
        Self { low, high }
    }

    /// 由六元组 `(x0, y0, z0, x1, y1, z1)` 创建包围盒.
    #[inline]
    pub fn from_corners(x0: i64, y0: i64, z0: i64, x1: i64, y1: i64, z1: i64) -> Self {
        Self::new([x0, y0, z0], [x1, y1, z1])
    }

    /// 创建低角点位于原点、形状为 `shape` 的包围盒.
    #[inline]
    pub fn from_shape((x, y, z): Idx3d) -> Self {
        Self::new([0; 3], [x as i64, y as i64, z as i64])
    }

    /// 低角点.
    #[inline]
    pub fn low(&self) -> Coord3d {
        self.low
    }

    /// 高角点.
    #[inline]
    pub fn high(&self) -> Coord3d {
        self.high
    }

    /// 形状, 即各轴长度.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        (
            (self.high[0] - self.low[0]) as usize,
            (self.high[1] - self.low[1]) as usize,
            (self.high[2] - self.low[2]) as usize,
        )
    }

    /// 体积, 即盒内体素总数.
    #[inline]
    pub fn volume(&self) -> usize {
        let (x, y, z) = self.shape();
        x * y * z
    }

    /// 是否为空盒 (任一轴长度为 0).
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|d| self.low[d] == self.high[d])
    }

    /// 将两个角点同时平移 `offset`, 返回新盒.
    #[inline]
    pub fn translate(&self, offset: Coord3d) -> Self {
        let mut low = self.low;
        let mut high = self.high;
        for d in 0..3 {
            low[d] += offset[d];
            high[d] += offset[d];
        }
        Self { low, high }
    }

    /// 将包围盒沿每轴向两侧各对称扩张 `delta`, 返回新盒.
    ///
    /// 若扩张量为负且导致角点反转, 则程序 panic.
    #[inline]
    pub fn expand(&self, delta: Coord3d) -> Self {
        let mut low = self.low;
        let mut high = self.high;
        for d in 0..3 {
            low[d] -= delta[d];
            high[d] += delta[d];
        }
        Self::new(low, high)
    }

    /// 判断 `other` 是否完全处于 `self` 内.
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        (0..3).all(|d| self.low[d] <= other.low[d] && other.high[d] <= self.high[d])
    }

    /// 求两盒交集. 互不相交时返回贴在 `other` 边界上的空盒.
    #[inline]
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        self.clip_to(other).0
    }

    /// 将 `self` 的两个角点钳制到 `bounds` 内, 返回钳制后的盒, 以及原盒
    /// 在各轴两侧伸出 `bounds` 的量.
    ///
    /// 对任意输入都有定义; 当原盒与 `bounds` 完全不相交时返回空盒.
    pub fn clip_to(&self, bounds: &Aabb) -> (Aabb, Padding) {
        let mut low = [0i64; 3];
        let mut high = [0i64; 3];
        let mut pad = Padding::default();
        for d in 0..3 {
            low[d] = self.low[d].clamp(bounds.low[d], bounds.high[d]);
            high[d] = self.high[d].clamp(bounds.low[d], bounds.high[d]);
            pad.low[d] = (bounds.low[d] - self.low[d]).max(0) as usize;
            pad.high[d] = (self.high[d] - bounds.high[d]).max(0) as usize;
        }
        (Aabb { low, high }, pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_and_volume() {
        let b = Aabb::from_corners(-1, 0, 2, 5, 4, 2);
        assert_eq!(b.shape(), (6, 4, 0));
        assert_eq!(b.volume(), 0);
        assert!(b.is_empty());

        let b = Aabb::from_shape((10, 20, 30));
        assert_eq!(b.shape(), (10, 20, 30));
        assert_eq!(b.volume(), 6000);
        assert!(!b.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_inverted_corners() {
        let _ = Aabb::from_corners(0, 0, 0, -1, 4, 4);
    }

    #[test]
    fn test_translate_and_expand() {
        let b = Aabb::from_corners(0, 0, 0, 4, 4, 4);
        assert_eq!(
            b.translate([-2, 3, 0]),
            Aabb::from_corners(-2, 3, 0, 2, 7, 4)
        );
        assert_eq!(
            b.expand([1, 2, 0]),
            Aabb::from_corners(-1, -2, 0, 5, 6, 4)
        );
        // 扩张不改变中心对齐: 形状每轴增加 2 * delta.
        assert_eq!(b.expand([1, 2, 0]).shape(), (6, 8, 4));
    }

    #[test]
    fn test_clip_inside_is_identity() {
        let bounds = Aabb::from_shape((10, 10, 10));
        let b = Aabb::from_corners(2, 3, 4, 5, 6, 7);
        let (clipped, pad) = b.clip_to(&bounds);
        assert_eq!(clipped, b);
        assert!(pad.is_zero());
    }

    #[test]
    fn test_clip_protruding() {
        let bounds = Aabb::from_shape((10, 10, 10));
        let b = Aabb::from_corners(-1, 8, 0, 5, 12, 10);
        let (clipped, pad) = b.clip_to(&bounds);
        assert_eq!(clipped, Aabb::from_corners(0, 8, 0, 5, 10, 10));
        assert_eq!(pad.low, [1, 0, 0]);
        assert_eq!(pad.high, [0, 2, 0]);
    }

    #[test]
    fn test_clip_disjoint_is_empty() {
        let bounds = Aabb::from_shape((10, 10, 10));
        let b = Aabb::from_corners(20, 0, 0, 24, 4, 4);
        let (clipped, _) = b.clip_to(&bounds);
        assert!(clipped.is_empty());
        assert!(b.intersection(&bounds).is_empty());
    }

    #[test]
    fn test_contains() {
        let outer = Aabb::from_shape((10, 10, 10));
        assert!(outer.contains(&Aabb::from_corners(0, 0, 0, 10, 10, 10)));
        assert!(outer.contains(&Aabb::from_corners(2, 2, 2, 5, 5, 5)));
        assert!(!outer.contains(&Aabb::from_corners(-1, 0, 0, 5, 5, 5)));
        assert!(!outer.contains(&Aabb::from_corners(0, 0, 0, 5, 5, 11)));
    }
}
