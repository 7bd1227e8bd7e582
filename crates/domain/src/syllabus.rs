//! 课程大纲搜索相关类型
//!
//! 章节命中后生成“虚拟”内容条目，真实内容在用户点击后才加载。

use serde::{Deserialize, Serialize};

use crate::value_objects::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Chapter {
    /// `needle` 须已转为小写
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentKind {
    PdfPremium,
    VideoLecture,
}

impl ContentKind {
    pub fn is_video(self) -> bool {
        matches!(self, ContentKind::VideoLecture)
    }
}

/// 搜索结果条目，`content` 在打开时才获取
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRef {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub kind: ContentKind,
    pub subject_name: String,
    pub created_at: Timestamp,
}

impl LessonRef {
    /// 一个命中章节对应的讲义与视频两个条目
    pub fn pair_for(subject: &Subject, chapter: &Chapter, now: Timestamp) -> [LessonRef; 2] {
        [
            LessonRef {
                id: format!("pdf-{}", chapter.id),
                title: chapter.title.clone(),
                subtitle: format!("{} • Notes", subject.name),
                kind: ContentKind::PdfPremium,
                subject_name: subject.name.clone(),
                created_at: now,
            },
            LessonRef {
                id: format!("vid-{}", chapter.id),
                title: chapter.title.clone(),
                subtitle: format!("{} • Lecture", subject.name),
                kind: ContentKind::VideoLecture,
                subject_name: subject.name.clone(),
                created_at: now,
            },
        ]
    }
}
