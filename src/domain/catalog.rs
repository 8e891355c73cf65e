// ==========================================
// 农业天气图抓取系统 - 作物/地区目录
// ==========================================
// 作物 → 国家 → 子地区 的静态层级表
// 进程内唯一、只读；运行期间不增删条目
// 越界查询返回空序列或 InvalidCoordinate，不 panic
// ==========================================

use crate::error::{SpiderError, SpiderResult};

/// 国家条目
#[derive(Debug)]
pub struct RegionEntry {
    pub name: &'static str,
    pub subregions: &'static [&'static str],
}

/// 作物条目
#[derive(Debug)]
pub struct CropEntry {
    pub name: &'static str,
    pub regions: &'static [RegionEntry],
}

const CROPS: &[CropEntry] = &[
    CropEntry {
        name: "corn",
        regions: &[
            RegionEntry { name: "usa", subregions: &["usa", "iowa", "illinois", "nebraska", "minnesota", "indiana"] },
            RegionEntry { name: "brazil", subregions: &["brazil", "parana", "matogrosso", "minasgerais", "goias", "riograndedosul"] },
            RegionEntry { name: "argentina", subregions: &["argentina", "buenosaires", "cordoba", "santafe", "entrerios", "santiagodelestero"] },
            RegionEntry { name: "china", subregions: &["china", "shandong", "heilongjiang", "jilin", "henan", "hebei"] },
        ],
    },
    CropEntry {
        name: "soybeans",
        regions: &[
            RegionEntry { name: "usa", subregions: &["usa", "iowa", "illinois", "minnesota", "indiana", "nebraska"] },
            RegionEntry { name: "brazil", subregions: &["brazil", "matogrosso", "parana", "riograndedosul", "goias", "matogrossodosul"] },
            RegionEntry { name: "argentina", subregions: &["argentina", "buenosaires", "cordoba", "santafe", "entrerios", "santiagodelestero"] },
        ],
    },
    CropEntry {
        name: "wheat",
        regions: &[
            RegionEntry { name: "usa", subregions: &["idaho", "kansas", "minnesota", "montana", "northdakota", "oklahoma", "southdakota", "texas", "washington"] },
            RegionEntry { name: "canada", subregions: &["canada", "alberta", "saskatchewan", "manitoba"] },
            RegionEntry { name: "europe", subregions: &["france", "germany", "uk", "poland", "spain"] },
            RegionEntry { name: "ukraine", subregions: &["ukraine", "central", "southern", "volga", "urals", "siberia", "kazakhstan"] },
            RegionEntry { name: "china", subregions: &["china", "henan", "shandong", "hebei", "anhui", "jiangsu"] },
            RegionEntry { name: "australia", subregions: &["australia", "westernaustralia", "victoria", "newsouthwales"] },
            RegionEntry { name: "india", subregions: &["india"] },
        ],
    },
    CropEntry {
        name: "rapeseed",
        regions: &[
            RegionEntry { name: "canada", subregions: &["canada", "alberta", "saskatchewan", "manitoba"] },
            RegionEntry { name: "europe", subregions: &["france", "germany", "uk", "poland", "czech"] },
        ],
    },
    CropEntry {
        name: "barley",
        regions: &[
            RegionEntry { name: "canada", subregions: &["canada", "alberta", "saskatchewan", "manitoba"] },
            RegionEntry { name: "europe", subregions: &["france", "germany", "spain", "uk", "denmark"] },
        ],
    },
];

// 作物/地区代码 → 中文显示名
static DISPLAY_NAMES: &[(&str, &str)] = &[
    ("corn", "玉米"),
    ("soybeans", "大豆"),
    ("wheat", "小麦"),
    ("rapeseed", "油菜籽"),
    ("barley", "大麦"),
    ("usa", "美国"),
    ("brazil", "巴西"),
    ("argentina", "阿根廷"),
    ("china", "中国"),
    ("canada", "加拿大"),
    ("europe", "欧洲"),
    ("ukraine", "乌克兰"),
    ("australia", "澳大利亚"),
    ("india", "印度"),
    ("iowa", "艾奥瓦州"),
    ("illinois", "伊利诺伊州"),
    ("nebraska", "内布拉斯加州"),
    ("minnesota", "明尼苏达州"),
    ("indiana", "印第安纳州"),
    ("parana", "巴拉那州"),
    ("matogrosso", "马托格罗索州"),
    ("minasgerais", "米纳斯吉拉斯州"),
    ("goias", "戈亚斯州"),
    ("riograndedosul", "南里奥格兰德州"),
    ("buenosaires", "布宜诺斯艾利斯省"),
    ("cordoba", "科尔多瓦省"),
    ("santafe", "圣菲省"),
    ("entrerios", "恩特雷里奥斯省"),
    ("santiagodelestero", "圣地亚哥-德尔埃斯特罗省"),
    ("shandong", "山东省"),
    ("heilongjiang", "黑龙江省"),
    ("jilin", "吉林省"),
    ("henan", "河南省"),
    ("hebei", "河北省"),
    ("matogrossodosul", "南马托格罗索州"),
    ("idaho", "爱达荷州"),
    ("kansas", "堪萨斯州"),
    ("montana", "蒙大拿州"),
    ("northdakota", "北达科他州"),
    ("oklahoma", "俄克拉荷马州"),
    ("southdakota", "南达科他州"),
    ("texas", "得克萨斯州"),
    ("washington", "华盛顿州"),
    ("alberta", "艾伯塔省"),
    ("saskatchewan", "萨斯喀彻温省"),
    ("manitoba", "曼尼托巴省"),
    ("france", "法国"),
    ("germany", "德国"),
    ("uk", "英国"),
    ("poland", "波兰"),
    ("spain", "西班牙"),
    ("czech", "捷克"),
    ("denmark", "丹麦"),
    ("central", "中部地区"),
    ("southern", "南部地区"),
    ("volga", "伏尔加地区"),
    ("urals", "乌拉尔地区"),
    ("siberia", "西伯利亚地区"),
    ("kazakhstan", "哈萨克斯坦"),
    ("anhui", "安徽省"),
    ("jiangsu", "江苏省"),
    ("westernaustralia", "西澳大利亚州"),
    ("victoria", "维多利亚州"),
    ("newsouthwales", "新南威尔士州"),
];

static CATALOG: Catalog = Catalog { crops: CROPS };

/// 已校验的目录坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub crop_index: usize,
    pub region_index: usize,
    pub subregion_index: usize,
    pub crop: &'static str,
    pub region: &'static str,
    pub subregion: &'static str,
}

// ==========================================
// Catalog - 静态目录
// ==========================================
#[derive(Debug)]
pub struct Catalog {
    crops: &'static [CropEntry],
}

impl Catalog {
    /// 进程级目录实例
    pub fn global() -> &'static Catalog {
        &CATALOG
    }

    /// 支持的作物列表
    pub fn crops(&self) -> Vec<&'static str> {
        self.crops.iter().map(|c| c.name).collect()
    }

    pub fn crop_name(&self, crop_index: usize) -> Option<&'static str> {
        self.crops.get(crop_index).map(|c| c.name)
    }

    /// 按作物名称查找索引
    pub fn find_crop(&self, name: &str) -> Option<usize> {
        let name = name.trim().to_lowercase();
        self.crops.iter().position(|c| c.name == name)
    }

    /// 作物支持的国家列表（越界返回空）
    pub fn regions_of(&self, crop_index: usize) -> Vec<&'static str> {
        self.crops
            .get(crop_index)
            .map(|c| c.regions.iter().map(|r| r.name).collect())
            .unwrap_or_default()
    }

    /// 作物+国家支持的子地区列表（越界返回空）
    pub fn subregions_of(&self, crop_index: usize, region_index: usize) -> Vec<&'static str> {
        self.crops
            .get(crop_index)
            .and_then(|c| c.regions.get(region_index))
            .map(|r| r.subregions.to_vec())
            .unwrap_or_default()
    }

    /// 代码 → 显示名；无映射时回退为代码本身
    pub fn name_of<'a>(&self, code: &'a str) -> &'a str {
        DISPLAY_NAMES
            .iter()
            .find(|(k, _)| *k == code)
            .map(|(_, v)| *v)
            .unwrap_or(code)
    }

    /// 校验三级索引并返回名称
    pub fn resolve(
        &self,
        crop_index: usize,
        region_index: usize,
        subregion_index: usize,
    ) -> SpiderResult<CatalogEntry> {
        let crop = self.crops.get(crop_index).ok_or_else(|| {
            SpiderError::InvalidCoordinate(format!(
                "作物索引越界: {} (共 {} 种)",
                crop_index,
                self.crops.len()
            ))
        })?;
        let region = crop.regions.get(region_index).ok_or_else(|| {
            SpiderError::InvalidCoordinate(format!(
                "地区索引越界: {}/{} ({} 共 {} 个)",
                crop.name,
                region_index,
                crop.name,
                crop.regions.len()
            ))
        })?;
        let subregion = region.subregions.get(subregion_index).ok_or_else(|| {
            SpiderError::InvalidCoordinate(format!(
                "子地区索引越界: {}/{}/{} ({} 共 {} 个)",
                crop.name,
                region.name,
                subregion_index,
                region.name,
                region.subregions.len()
            ))
        })?;

        Ok(CatalogEntry {
            crop_index,
            region_index,
            subregion_index,
            crop: crop.name,
            region: region.name,
            subregion: *subregion,
        })
    }

    /// 枚举作物下所有 (国家, 子地区) 坐标，按目录顺序
    pub fn entries_of(&self, crop_index: usize) -> Vec<CatalogEntry> {
        let Some(crop) = self.crops.get(crop_index) else {
            return Vec::new();
        };
        crop.regions
            .iter()
            .enumerate()
            .flat_map(|(ri, region)| {
                region
                    .subregions
                    .iter()
                    .enumerate()
                    .map(move |(si, sub)| CatalogEntry {
                        crop_index,
                        region_index: ri,
                        subregion_index: si,
                        crop: crop.name,
                        region: region.name,
                        subregion: *sub,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        let catalog = Catalog::global();
        assert_eq!(catalog.crops(), vec!["corn", "soybeans", "wheat", "rapeseed", "barley"]);
        assert_eq!(catalog.regions_of(1), vec!["usa", "brazil", "argentina"]);
        assert_eq!(catalog.subregions_of(2, 6), vec!["india"]);
        assert_eq!(catalog.entries_of(1).len(), 18);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let catalog = Catalog::global();
        assert!(catalog.regions_of(5).is_empty());
        assert!(catalog.subregions_of(1, 3).is_empty());
        assert!(catalog.subregions_of(99, 0).is_empty());
        assert!(catalog.entries_of(42).is_empty());
    }

    #[test]
    fn test_resolve_bounds() {
        let catalog = Catalog::global();
        let entry = catalog.resolve(1, 0, 2).unwrap();
        assert_eq!((entry.crop, entry.region, entry.subregion), ("soybeans", "usa", "illinois"));

        assert!(matches!(catalog.resolve(5, 0, 0), Err(SpiderError::InvalidCoordinate(_))));
        assert!(matches!(catalog.resolve(1, 3, 0), Err(SpiderError::InvalidCoordinate(_))));
        assert!(matches!(catalog.resolve(1, 0, 6), Err(SpiderError::InvalidCoordinate(_))));
    }

    #[test]
    fn test_name_of_fallback() {
        let catalog = Catalog::global();
        assert_eq!(catalog.name_of("usa"), "美国");
        assert_eq!(catalog.name_of("matogrossodosul"), "南马托格罗索州");
        // 未翻译的新子地区直接显示代码
        assert_eq!(catalog.name_of("tocantins"), "tocantins");
    }

    #[test]
    fn test_find_crop() {
        let catalog = Catalog::global();
        assert_eq!(catalog.find_crop("Soybeans"), Some(1));
        assert_eq!(catalog.find_crop("rice"), None);
    }
}
