use application::SubjectCatalog;
use domain::Subject;

const JUNIOR: &[&str] = &["Mathematics", "Science", "Social Science", "English", "Hindi"];
const SENIOR_SCIENCE: &[&str] = &["Physics", "Chemistry", "Mathematics", "Biology", "English"];
const SENIOR_COMMERCE: &[&str] = &[
    "Accountancy",
    "Business Studies",
    "Economics",
    "Mathematics",
    "English",
];
const SENIOR_ARTS: &[&str] = &[
    "History",
    "Geography",
    "Political Science",
    "Economics",
    "English",
];

/// 内置的科目表：9/10 年级不分科，11/12 年级按 Science / Commerce / Arts 区分
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSubjectCatalog;

impl StaticSubjectCatalog {
    fn names(class_level: &str, stream: &str) -> &'static [&'static str] {
        match class_level {
            "9" | "10" => JUNIOR,
            _ if stream.eq_ignore_ascii_case("commerce") => SENIOR_COMMERCE,
            _ if stream.eq_ignore_ascii_case("arts") || stream.eq_ignore_ascii_case("humanities") => {
                SENIOR_ARTS
            }
            _ => SENIOR_SCIENCE,
        }
    }
}

impl SubjectCatalog for StaticSubjectCatalog {
    fn subjects(&self, class_level: &str, stream: &str) -> Vec<Subject> {
        Self::names(class_level, stream)
            .iter()
            .map(|name| Subject::new(name.to_lowercase().replace(' ', "-"), *name))
            .collect()
    }
}
