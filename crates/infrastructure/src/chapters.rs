use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use application::{ChapterQuery, ChapterSource};
use async_trait::async_trait;
use domain::{Chapter, RepositoryError};

/// 预先装载的章节目录，按 (年级, 科目 ID) 索引
///
/// 未登记的科目返回空目录，和内容服务对未知科目的表现一致。
#[derive(Clone, Default)]
pub struct InMemoryChapterSource {
    chapters: Arc<RwLock<HashMap<(String, String), Vec<Chapter>>>>,
}

impl InMemoryChapterSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        class_level: impl Into<String>,
        subject_id: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> Result<(), RepositoryError> {
        let mut map = self
            .chapters
            .write()
            .map_err(|_| RepositoryError::storage("chapter source lock poisoned"))?;
        map.insert((class_level.into(), subject_id.into()), chapters);
        Ok(())
    }

    pub fn with_chapters(
        self,
        class_level: impl Into<String>,
        subject_id: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> Result<Self, RepositoryError> {
        self.insert(class_level, subject_id, chapters)?;
        Ok(self)
    }
}

#[async_trait]
impl ChapterSource for InMemoryChapterSource {
    async fn fetch_chapters(&self, query: ChapterQuery) -> Result<Vec<Chapter>, RepositoryError> {
        let map = self
            .chapters
            .read()
            .map_err(|_| RepositoryError::storage("chapter source lock poisoned"))?;
        Ok(map
            .get(&(query.class_level, query.subject.id))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Subject;

    fn query(class_level: &str, subject_id: &str) -> ChapterQuery {
        ChapterQuery {
            board: "CBSE".into(),
            class_level: class_level.into(),
            stream: "Science".into(),
            subject: Subject::new(subject_id, "Physics"),
            language: "English".into(),
        }
    }

    #[tokio::test]
    async fn lookup_is_keyed_by_class_and_subject() {
        let source = InMemoryChapterSource::new()
            .with_chapters(
                "11",
                "physics",
                vec![Chapter {
                    id: "ph-1".into(),
                    title: "Units and Measurement".into(),
                    description: None,
                }],
            )
            .unwrap();

        assert_eq!(source.fetch_chapters(query("11", "physics")).await.unwrap().len(), 1);
        assert!(source.fetch_chapters(query("12", "physics")).await.unwrap().is_empty());
    }
}
