//! Static category table for the default forum.
//!
//! Discourse search filters by numeric category id while users refer to
//! categories by their localized display name, so tools resolve names
//! through this table. Categories are stable and change rarely; the table is
//! compiled in rather than fetched.

/// One forum category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Numeric category id used in search filters and topic records.
    pub id: u32,
    /// Localized display name.
    pub name: &'static str,
    /// URL slug ("" for categories without one).
    pub slug: &'static str,
    /// Optional description.
    pub description: Option<&'static str>,
    /// Parent category id for subcategories.
    pub parent_category_id: Option<u32>,
}

const fn cat(
    id: u32,
    name: &'static str,
    slug: &'static str,
    description: Option<&'static str>,
    parent_category_id: Option<u32>,
) -> CategoryInfo {
    CategoryInfo { id, name, slug, description, parent_category_id }
}

/// All known categories for the default forum (uscardforum.com).
pub const CATEGORIES: &[CategoryInfo] = &[
    cat(12, "玩卡", "rewards", Some("信用卡/银行账户/点数里程/信用分数等"), None),
    cat(5, "信用卡", "credit-cards", None, Some(12)),
    cat(6, "银行账户", "bank-accounts", None, Some(12)),
    cat(32, "信用分数", "credit-score", None, Some(12)),
    cat(56, "Refer专区", "special", None, Some(12)),
    cat(15, "旅行", "travel", Some("常旅客/飞行体验/住宿体验/景点游记攻略等"), None),
    cat(38, "航空常旅客", "airline-programs", None, Some(15)),
    cat(7, "酒店常旅客", "hotel-programs", None, Some(15)),
    cat(17, "游记攻略", "trip-report", None, Some(15)),
    cat(50, "租车", "car-rental", None, Some(15)),
    cat(58, "驴友", "travel-friends", None, Some(15)),
    cat(9, "理财", "investment", Some("股市房产等投资问题"), None),
    cat(13, "股市投资", "stock-market", None, Some(9)),
    cat(14, "房地产", "real-estate", None, Some(9)),
    cat(10, "税务", "tax", None, Some(9)),
    cat(43, "加密货币", "coins", None, Some(9)),
    cat(20, "败家", "shopping", Some("折扣信息/好物使用体验"), None),
    cat(26, "好物推荐", "good-stuff", None, Some(20)),
    cat(21, "购物折扣", "deals", None, Some(20)),
    cat(23, "电子产品", "tech", None, Some(20)),
    cat(25, "汽车", "", None, Some(20)),
    cat(44, "手机卡", "wireless-services", None, Some(20)),
    cat(51, "生活", "life", Some("美好生活的点点滴滴"), None),
    cat(22, "吃货", "foodie", None, Some(51)),
    cat(47, "影音娱乐", "movies", None, Some(51)),
    cat(49, "游戏", "games", None, Some(51)),
    cat(55, "健康", "health", None, Some(51)),
    cat(52, "园艺种菜", "", None, Some(51)),
    cat(37, "宠物", "pets", None, Some(51)),
    cat(53, "体育", "", None, Some(51)),
    cat(60, "育儿", "children", None, Some(51)),
    cat(62, "社会新闻", "news-in-the-us", None, Some(51)),
    cat(45, "回国or留美", "china-us-comparison", None, Some(51)),
    cat(18, "法律", "laws", Some("签证/身份/出入境禁令等问题"), None),
    cat(19, "签证与身份（美国）", "visa", None, Some(18)),
    cat(61, "签证与身份（美国以外）", "visa-other-countries-and-regions", None, Some(18)),
    cat(27, "新政", "orders", None, Some(18)),
    cat(28, "情感", "feelings", Some("各种情感想要倾诉"), None),
    cat(29, "爱情", "love", None, Some(28)),
    cat(31, "鹊桥", "piebridge", None, Some(28)),
    cat(33, "搬砖", "jobs", Some("找工作/职场/求学/学术圈"), None),
    cat(34, "面经", "interviews", None, Some(33)),
    cat(36, "内推", "job-refer", None, Some(33)),
    cat(48, "学术", "academics", None, Some(33)),
    cat(54, "求学", "study", None, Some(33)),
    cat(57, "文艺", "literature-and-art", Some("文艺创作"), None),
    cat(1, "闲聊", "", Some("不需要类别或不适合任何其他现有类别的话题"), None),
    cat(68, "白金", "", Some("仅白金会员可见"), None),
    cat(67, "钛金", "", Some("仅钛金会员可见"), None),
    cat(63, "性爱", "", Some("性爱话题收容类别"), None),
    cat(42, "吵架", "politics", Some("广义的政治话题"), None),
    cat(3, "公告", "announcements", Some("论坛公告"), None),
    cat(65, "测试", "test", Some("测试分类"), None),
    cat(66, "私密", "private", Some("私密分类"), None),
];

/// Looks up a category by numeric id.
pub fn category_by_id(id: u32) -> Option<&'static CategoryInfo> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Looks up a category by display name (case-insensitive, trimmed).
pub fn category_by_name(name: &str) -> Option<&'static CategoryInfo> {
    let needle = name.trim().to_lowercase();
    CATEGORIES.iter().find(|c| c.name.to_lowercase() == needle)
}

/// Returns the display name for a category id, or `Category {id}` when the
/// id is not in the table.
pub fn category_name(id: u32) -> String {
    match category_by_id(id) {
        Some(c) => c.name.to_string(),
        None => format!("Category {id}"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(category_by_id(12).map(|c| c.name), Some("玩卡"));
        assert!(category_by_id(9999).is_none());
    }

    #[test]
    fn test_lookup_by_name_is_case_insensitive_and_trimmed() {
        assert_eq!(category_by_name("  玩卡 ").map(|c| c.id), Some(12));
        assert_eq!(category_by_name("refer专区").map(|c| c.id), Some(56));
        assert!(category_by_name("nonexistent").is_none());
    }

    #[test]
    fn test_name_fallback() {
        assert_eq!(category_name(15), "旅行");
        assert_eq!(category_name(9999), "Category 9999");
    }

    #[test]
    fn test_subcategories_point_at_known_parents() {
        for c in CATEGORIES {
            if let Some(parent) = c.parent_category_id {
                assert!(category_by_id(parent).is_some(), "missing parent for {}", c.id);
            }
        }
    }
}
