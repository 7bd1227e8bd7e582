//! 跨科目课程搜索
//!
//! 对学生所在年级/分科的所有科目并发拉取章节目录，按关键字过滤，
//! 每个命中章节生成讲义与视频两个虚拟条目。

use std::fmt;
use std::sync::Arc;

use domain::{LessonRef, User};
use futures::future::try_join_all;
use serde::Serialize;

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{ChapterQuery, ChapterSource, SubjectCatalog},
};

/// 档案缺省值与支持的年级
#[derive(Debug, Clone)]
pub struct SearchDefaults {
    pub board: String,
    pub stream: String,
    pub language: String,
    pub supported_classes: Vec<String>,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            board: "CBSE".into(),
            stream: "Science".into(),
            language: "English".into(),
            supported_classes: ["9", "10", "11", "12"].map(String::from).to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum SearchStatus {
    EmptyQuery,
    UnsupportedClass { supported: Vec<String> },
    Found(usize),
    NoMatches { query: String, class_level: String },
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::EmptyQuery => Ok(()),
            SearchStatus::UnsupportedClass { supported } => match (supported.first(), supported.last()) {
                (Some(first), Some(last)) => {
                    write!(f, "Smart Session is optimized for Class {first}-{last}.")
                }
                _ => write!(f, "Smart Session is not available for your class."),
            },
            SearchStatus::Found(count) => write!(f, "Found {count} results"),
            SearchStatus::NoMatches { query, class_level } => write!(
                f,
                "No topics found for \"{query}\" in Class {class_level} syllabus."
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<LessonRef>,
    pub status: SearchStatus,
}

impl SearchOutcome {
    fn empty(status: SearchStatus) -> Self {
        Self {
            results: Vec::new(),
            status,
        }
    }
}

pub struct SyllabusSearchDependencies {
    pub catalog: Arc<dyn SubjectCatalog>,
    pub chapters: Arc<dyn ChapterSource>,
    pub clock: Arc<dyn Clock>,
    pub defaults: SearchDefaults,
}

pub struct SyllabusSearchService {
    deps: SyllabusSearchDependencies,
}

impl SyllabusSearchService {
    pub fn new(deps: SyllabusSearchDependencies) -> Self {
        Self { deps }
    }

    pub async fn search(&self, user: &User, term: &str) -> Result<SearchOutcome, ApplicationError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(SearchOutcome::empty(SearchStatus::EmptyQuery));
        }

        let defaults = &self.deps.defaults;
        let class_level = match user.profile.class_level.as_deref() {
            Some(level) if defaults.supported_classes.iter().any(|c| c == level) => level,
            _ => {
                return Ok(SearchOutcome::empty(SearchStatus::UnsupportedClass {
                    supported: defaults.supported_classes.clone(),
                }))
            }
        };
        let board = user.profile.board.as_deref().unwrap_or(&defaults.board);
        let stream = user.profile.stream.as_deref().unwrap_or(&defaults.stream);

        let needle = term.to_lowercase();
        let subjects = self.deps.catalog.subjects(class_level, stream);
        tracing::debug!(
            user_id = %user.id,
            class_level,
            stream,
            subjects = subjects.len(),
            "开始跨科目搜索"
        );

        let fetches = subjects.iter().map(|subject| {
            let query = ChapterQuery {
                board: board.to_owned(),
                class_level: class_level.to_owned(),
                stream: stream.to_owned(),
                subject: subject.clone(),
                language: defaults.language.clone(),
            };
            let source = Arc::clone(&self.deps.chapters);
            async move {
                tracing::trace!(subject = %subject.name, "扫描科目");
                source
                    .fetch_chapters(query)
                    .await
                    .map(|chapters| (subject, chapters))
            }
        });
        let scanned = try_join_all(fetches).await.map_err(|err| {
            tracing::warn!(user_id = %user.id, error = %err, "章节目录获取失败");
            ApplicationError::SearchFailed(err.to_string())
        })?;

        let now = self.deps.clock.now();
        let needle = needle.as_str();
        let results: Vec<LessonRef> = scanned
            .iter()
            .flat_map(|(subject, chapters)| {
                chapters
                    .iter()
                    .filter(move |chapter| chapter.matches(needle))
                    .flat_map(move |chapter| LessonRef::pair_for(subject, chapter, now))
            })
            .collect();

        let status = if results.is_empty() {
            SearchStatus::NoMatches {
                query: term.to_owned(),
                class_level: class_level.to_owned(),
            }
        } else {
            SearchStatus::Found(results.len())
        };
        Ok(SearchOutcome { results, status })
    }
}
