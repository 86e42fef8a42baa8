use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde_json::from_str;

use super::model::{CourseType, LessonDefinition};
use crate::error::CatalogError;

static LESSON_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lesson/content");

/// Read-only source of lesson content keyed by identifier
pub trait LessonCatalog {
    fn lesson(&self, id: u32) -> Option<&LessonDefinition>;

    /// All lessons ordered by id
    fn lessons(&self) -> &[LessonDefinition];

    fn course(&self, course: CourseType) -> Vec<&LessonDefinition> {
        self.lessons()
            .iter()
            .filter(|l| l.course == course)
            .collect()
    }
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    lessons: Vec<LessonDefinition>,
}

impl StaticCatalog {
    pub fn new(lessons: Vec<LessonDefinition>) -> Result<Self, CatalogError> {
        if let Some(dup) = lessons.iter().map(|l| l.id).duplicates().next() {
            return Err(CatalogError::DuplicateId(dup));
        }
        if let Some(empty) = lessons.iter().find(|l| l.steps.is_empty()) {
            return Err(CatalogError::NoSteps(empty.id));
        }

        let lessons = lessons.into_iter().sorted_by_key(|l| l.id).collect_vec();
        for lesson in &lessons {
            let malformed = lesson.malformed_steps();
            if !malformed.is_empty() {
                log::warn!(
                    "lesson {} has unanswerable practice steps at {:?}",
                    lesson.id,
                    malformed
                );
            }
        }

        Ok(Self { lessons })
    }

    /// Build from `(file name, json)` pairs, one lesson per document
    pub fn from_json<'a, I>(files: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let lessons = files
            .into_iter()
            .map(|(name, json)| {
                from_str::<LessonDefinition>(json).map_err(|source| CatalogError::Parse {
                    file: name.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(lessons)
    }

    /// The lessons shipped inside the binary
    pub fn bundled() -> Self {
        let files = LESSON_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .map(|f| {
                let name = f.path().to_str().unwrap_or("<non-utf8 path>");
                let json = f
                    .contents_utf8()
                    .expect("Unable to interpret lesson file as a string");
                (name, json)
            });

        Self::from_json(files).expect("Bundled lesson content is invalid")
    }
}

impl LessonCatalog for StaticCatalog {
    fn lesson(&self, id: u32) -> Option<&LessonDefinition> {
        self.lessons
            .binary_search_by_key(&id, |l| l.id)
            .ok()
            .map(|idx| &self.lessons[idx])
    }

    fn lessons(&self) -> &[LessonDefinition] {
        &self.lessons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::model::Category;
    use assert_matches::assert_matches;

    const LESSON_A: &str = r#"
    {
        "id": 20,
        "title": "Colours",
        "course": "beginner",
        "category": "vocabulary",
        "steps": [
            { "type": "intro", "title": "Colours", "content": "Learn colours." },
            { "type": "completion", "title": "Done", "content": "Well done." }
        ]
    }
    "#;

    const LESSON_B: &str = r#"
    {
        "id": 3,
        "title": "Articles",
        "course": "advanced",
        "category": "grammar",
        "steps": [
            { "type": "intro", "title": "Articles", "content": "der, die, das" }
        ]
    }
    "#;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = StaticCatalog::bundled();

        assert!(!catalog.lessons().is_empty());
        let greetings = catalog.lesson(1).expect("lesson 1 is bundled");
        assert_eq!(greetings.title, "Basic Greetings");
        assert_eq!(greetings.category, Category::Phrases);
        assert_eq!(greetings.course, CourseType::Beginner);
    }

    #[test]
    fn test_bundled_lessons_are_well_formed() {
        let catalog = StaticCatalog::bundled();

        for lesson in catalog.lessons() {
            assert!(
                lesson.malformed_steps().is_empty(),
                "lesson {} has malformed steps",
                lesson.id
            );
            assert!(lesson.practice_count() > 0, "lesson {} has no practice", lesson.id);
            assert!(
                lesson.steps.last().is_some_and(|s| s.is_completion()),
                "lesson {} should end with a completion step",
                lesson.id
            );
        }
    }

    #[test]
    fn test_lookup_and_ordering() {
        let catalog =
            StaticCatalog::from_json([("a.json", LESSON_A), ("b.json", LESSON_B)]).unwrap();

        let ids: Vec<u32> = catalog.lessons().iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![3, 20]);
        assert_eq!(catalog.lesson(20).map(|l| l.title.as_str()), Some("Colours"));
        assert!(catalog.lesson(21).is_none());
    }

    #[test]
    fn test_course_filter() {
        let catalog =
            StaticCatalog::from_json([("a.json", LESSON_A), ("b.json", LESSON_B)]).unwrap();

        let beginner = catalog.course(CourseType::Beginner);
        assert_eq!(beginner.len(), 1);
        assert_eq!(beginner[0].id, 20);
        assert!(catalog.course(CourseType::Intermediate).is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = StaticCatalog::from_json([("a.json", LESSON_A), ("c.json", LESSON_A)]);
        assert_matches!(result, Err(CatalogError::DuplicateId(20)));
    }

    #[test]
    fn test_lesson_without_steps_rejected() {
        let empty = r#"{ "id": 4, "title": "Empty", "course": "beginner", "category": "culture", "steps": [] }"#;
        let result = StaticCatalog::from_json([("empty.json", empty)]);
        assert_matches!(result, Err(CatalogError::NoSteps(4)));
    }

    #[test]
    fn test_parse_error_names_file() {
        let result = StaticCatalog::from_json([("broken.json", "{ \"id\": 1 }")]);
        assert_matches!(result, Err(CatalogError::Parse { ref file, .. }) if file == "broken.json");
    }
}
