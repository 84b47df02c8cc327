//! Entry classification by title markers.

use crate::types::Category;

/// Title markers of canonical texts, compilations and schools of thought.
const CANON_MARKERS: &[&str] = &["大典", "纲目", "开物", "实录", "会典", "大明律", "心学"];

/// Title markers of events, wars, reforms and institutions.
const EVENT_MARKERS: &[&str] = &[
    "战", "役", "之变", "之乱", "之治", "案", "制度", "中兴", "南巡", "倭患", "三大征", "北伐",
    "下西洋", "大礼议", "鞭法", "货币化", "三饷", "党", "专政", "东渐", "南明", "十日", "三屠",
    "攻占", "入关", "厂卫", "长城", "九边",
];

/// Derive the category of an entry from its title.
///
/// Canon markers win over event markers; anything else is a person.
pub fn classify(name: &str) -> Category {
    if CANON_MARKERS.iter().any(|m| name.contains(m)) {
        Category::TextCanon
    } else if EVENT_MARKERS.iter().any(|m| name.contains(m)) {
        Category::EventInstitution
    } else {
        Category::Person
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_default() {
        assert_eq!(classify("张居正"), Category::Person);
        assert_eq!(classify("王振_(明朝宦官)"), Category::Person);
        assert_eq!(classify(""), Category::Person);
    }

    #[test]
    fn test_event_markers() {
        assert_eq!(classify("靖难之役"), Category::EventInstitution);
        assert_eq!(classify("土木堡之变"), Category::EventInstitution);
        assert_eq!(classify("一条鞭法"), Category::EventInstitution);
        assert_eq!(classify("郑和下西洋"), Category::EventInstitution);
        assert_eq!(classify("东林党争"), Category::EventInstitution);
        assert_eq!(classify("松锦大战"), Category::EventInstitution);
    }

    #[test]
    fn test_canon_markers() {
        assert_eq!(classify("永乐大典"), Category::TextCanon);
        assert_eq!(classify("本草纲目"), Category::TextCanon);
        assert_eq!(classify("天工开物"), Category::TextCanon);
        assert_eq!(classify("心学"), Category::TextCanon);
    }

    #[test]
    fn test_canon_checked_before_event() {
        // "大明律" has no event marker but "明实录之战" has both
        assert_eq!(classify("大明律"), Category::TextCanon);
        assert_eq!(classify("明实录之战"), Category::TextCanon);
    }
}
