use crate::config::CatalogSettings;

/// Column names of the historical admission table
pub mod columns {
    pub const SCHOOL_CODE: &str = "school_code";
    pub const SCHOOL_NAME: &str = "school_name";
    pub const SCHOOL_PROVINCE: &str = "school_province";
    pub const SCHOOL_CITY: &str = "school_city";
    pub const SCHOOL_LEVELS: &str = "school_levels";
    pub const SCHOOL_TAGS: &str = "school_tags";
    pub const SCHOOL_OWNERSHIP: &str = "school_ownership";
    pub const SOURCE_PROVINCE: &str = "source_province";
    pub const SUBJECT_CATEGORY: &str = "subject_category";
    pub const MAJOR_GROUP_CODE: &str = "major_group_code";
    pub const MAJOR_GROUP_MIN_SCORE: &str = "major_group_min_score";
    pub const ID: &str = "id";
    pub const MAJOR_CODE: &str = "major_code";
    pub const MAJOR_NAME: &str = "major_name";
    pub const MAJOR_MIN_SCORE: &str = "major_min_score";
    pub const MAJOR_MIN_RANK: &str = "major_min_rank";
    pub const PLAN_COUNT: &str = "plan_count";
    pub const TUITION_FEE: &str = "tuition_fee";
    pub const STUDY_DURATION: &str = "study_duration";
    pub const MAJOR_REMARK: &str = "major_remark";

    /// Prior admission columns are `<prefix>_<years back>`
    pub const MIN_SCORE_PREV: &str = "min_score_prev";
    pub const MIN_RANK_PREV: &str = "min_rank_prev";
    pub const PLAN_COUNT_PREV: &str = "plan_count_prev";
    pub const PRIOR_YEARS: i32 = 3;

    pub fn prior(prefix: &str, years_back: i32) -> String {
        format!("{}_{}", prefix, years_back)
    }

    pub const REQUIRE_PHYSICS: &str = "require_physics";
    pub const REQUIRE_CHEMISTRY: &str = "require_chemistry";
    pub const REQUIRE_BIOLOGY: &str = "require_biology";
    pub const REQUIRE_POLITICS: &str = "require_politics";
    pub const REQUIRE_HISTORY: &str = "require_history";
    pub const REQUIRE_GEOGRAPHY: &str = "require_geography";
}

/// Province display name, value stored in the admission table, and the
/// pinyin key of its distribution files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvinceAlias {
    pub name: String,
    pub stored: String,
    pub pinyin: String,
}

const BUILTIN_PROVINCES: [(&str, &str); 31] = [
    ("湖北", "hubei"),
    ("湖南", "hunan"),
    ("河北", "hebei"),
    ("河南", "henan"),
    ("山东", "shandong"),
    ("山西", "shanxi"),
    ("陕西", "shaanxi"),
    ("四川", "sichuan"),
    ("江苏", "jiangsu"),
    ("江西", "jiangxi"),
    ("浙江", "zhejiang"),
    ("安徽", "anhui"),
    ("福建", "fujian"),
    ("广东", "guangdong"),
    ("广西", "guangxi"),
    ("海南", "hainan"),
    ("贵州", "guizhou"),
    ("云南", "yunnan"),
    ("西藏", "xizang"),
    ("青海", "qinghai"),
    ("甘肃", "gansu"),
    ("宁夏", "ningxia"),
    ("新疆", "xinjiang"),
    ("内蒙古", "neimenggu"),
    ("辽宁", "liaoning"),
    ("吉林", "jilin"),
    ("黑龙江", "heilongjiang"),
    ("北京", "beijing"),
    ("天津", "tianjin"),
    ("上海", "shanghai"),
    ("重庆", "chongqing"),
];

/// Table identifiers and enumeration tables the recommender works against
#[derive(Debug, Clone)]
pub struct Catalog {
    pub admission_table: String,
    /// Year the current admission columns describe
    pub data_year: i32,
    pub ownership_values: Vec<String>,
    provinces: Vec<ProvinceAlias>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            admission_table: "admission_records".to_string(),
            data_year: 2024,
            ownership_values: vec!["公办".to_string(), "民办".to_string()],
            provinces: builtin_provinces(),
        }
    }
}

fn builtin_provinces() -> Vec<ProvinceAlias> {
    BUILTIN_PROVINCES
        .iter()
        .map(|(name, pinyin)| ProvinceAlias {
            name: name.to_string(),
            stored: name.to_string(),
            pinyin: pinyin.to_string(),
        })
        .collect()
}

impl Catalog {
    pub fn from_settings(settings: &CatalogSettings, data_year: i32) -> Self {
        let provinces = if settings.provinces.is_empty() {
            builtin_provinces()
        } else {
            settings
                .provinces
                .iter()
                .map(|p| ProvinceAlias {
                    name: p.name.clone(),
                    stored: p.stored.clone().unwrap_or_else(|| p.name.clone()),
                    pinyin: p.pinyin.to_lowercase(),
                })
                .collect()
        };

        Self {
            admission_table: settings.admission_table.clone(),
            data_year,
            ownership_values: settings.ownership_values.clone(),
            provinces,
        }
    }

    fn find_province(&self, input: &str) -> Option<&ProvinceAlias> {
        let input = input.trim();
        self.provinces.iter().find(|p| {
            p.name == input || p.stored == input || p.pinyin.eq_ignore_ascii_case(input)
        })
    }

    /// Value of `source_province` for a province given by name, stored value or pinyin
    pub fn stored_province(&self, input: &str) -> String {
        self.find_province(input)
            .map(|p| p.stored.clone())
            .unwrap_or_else(|| input.trim().to_string())
    }

    /// Pinyin key of a province's distribution files, falling back to the lower-cased input
    pub fn distribution_province(&self, input: &str) -> String {
        self.find_province(input)
            .map(|p| p.pinyin.clone())
            .unwrap_or_else(|| input.trim().to_lowercase())
    }

    /// Whether a college-type token names an ownership value (公办 / 民办)
    pub fn is_ownership(&self, token: &str) -> bool {
        self.ownership_values.iter().any(|v| v == token)
    }
}
