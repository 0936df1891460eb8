use phf::phf_map;

/// 检测边界数据结构定义
/// Data structures at the detection boundary

// ========== 公共常量 ==========

/// 模型类别索引 → 标签 (COCO编号, 操作台只关心其中一小部分)
pub static CLASS_NAMES: phf::Map<u32, &'static str> = phf_map! {
    0u32 => "person",
    1u32 => "bicycle",
    2u32 => "car",
    3u32 => "motorcycle",
    5u32 => "bus",
    7u32 => "truck",
};

/// 类别索引对应的标签, 未知索引返回 "unknown"
pub fn class_label(class_id: u32) -> &'static str {
    CLASS_NAMES.get(&class_id).copied().unwrap_or("unknown")
}

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// 中心点
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// 追踪标识: 检测库未关联轨迹时使用显式的 Untracked 哨兵值
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackId {
    Id(u32),
    Untracked,
}

impl TrackId {
    pub fn id(self) -> Option<u32> {
        match self {
            TrackId::Id(id) => Some(id),
            TrackId::Untracked => None,
        }
    }
}

/// 单个检测结果 (同一帧内产生后不再修改)
///
/// 外部检测库返回的松散结果在边界处立即转换为该结构,
/// 内部代码不依赖外部库的数据形状。
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    /// 置信度 [0, 1]
    pub confidence: f32,
    /// 模型类别索引
    pub class_id: u32,
    pub class_name: &'static str,
    pub track: TrackId,
}

impl Detection {
    pub fn new(bbox: BBox, confidence: f32, class_id: u32, track: TrackId) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            class_name: class_label(class_id),
            track,
        }
    }
}

// ========== 类别过滤 ==========

/// 当前生效的检测类别限制 (闭合枚举)
///
/// Default 表示不过滤; 其余每项映射到一组非空的模型类别索引。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ClassFilter {
    #[default]
    Default,
    Person,
    Car,
}

/// 人 = COCO 0
static PERSON_INDICES: [u32; 1] = [0];
/// 车 = COCO 2
static CAR_INDICES: [u32; 1] = [2];

impl ClassFilter {
    /// 控制面板下拉框的完整选项集
    pub const ALL: [ClassFilter; 3] = [ClassFilter::Default, ClassFilter::Person, ClassFilter::Car];

    /// 名称解析, 未知名称返回 None (调用方决定忽略还是报错)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Default" => Some(ClassFilter::Default),
            "Person" => Some(ClassFilter::Person),
            "Car" => Some(ClassFilter::Car),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassFilter::Default => "Default",
            ClassFilter::Person => "Person",
            ClassFilter::Car => "Car",
        }
    }

    /// 解析为底层类别索引集, None 表示不限制
    pub fn class_indices(self) -> Option<&'static [u32]> {
        match self {
            ClassFilter::Default => None,
            ClassFilter::Person => Some(&PERSON_INDICES),
            ClassFilter::Car => Some(&CAR_INDICES),
        }
    }

    /// 检测结果是否通过当前过滤
    pub fn matches(self, class_id: u32) -> bool {
        match self.class_indices() {
            None => true,
            Some(indices) => indices.contains(&class_id),
        }
    }
}
