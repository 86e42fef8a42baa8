use serde::{Deserialize, Serialize};

/// Subject area of a lesson; drives the words-learned policy and time buckets
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Vocabulary,
    Grammar,
    Phrases,
    Culture,
    Practice,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Vocabulary,
        Category::Grammar,
        Category::Phrases,
        Category::Culture,
        Category::Practice,
    ];
}

/// Course level a lesson is listed under
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CourseType {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseType {
    pub const ALL: [CourseType; 3] = [
        CourseType::Beginner,
        CourseType::Intermediate,
        CourseType::Advanced,
    ];
}

/// A phrase in the language being learned next to its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepDefinition {
    Intro {
        title: String,
        content: String,
    },
    Explanation {
        title: String,
        content: String,
        #[serde(default)]
        examples: Vec<ExamplePair>,
    },
    Practice {
        question: String,
        options: Vec<String>,
        correct_answer: String,
        #[serde(default)]
        hint: String,
        #[serde(default)]
        explanation: String,
    },
    Completion {
        title: String,
        content: String,
        #[serde(default)]
        summary: Vec<String>,
    },
}

impl StepDefinition {
    pub fn is_practice(&self) -> bool {
        matches!(self, StepDefinition::Practice { .. })
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, StepDefinition::Completion { .. })
    }

    /// False only for a practice step whose correct answer is not among its options
    pub fn is_answerable(&self) -> bool {
        match self {
            StepDefinition::Practice {
                options,
                correct_answer,
                ..
            } => options.iter().any(|o| o == correct_answer),
            StepDefinition::Intro { .. }
            | StepDefinition::Explanation { .. }
            | StepDefinition::Completion { .. } => true,
        }
    }

    pub fn heading(&self) -> &str {
        match self {
            StepDefinition::Intro { title, .. }
            | StepDefinition::Explanation { title, .. }
            | StepDefinition::Completion { title, .. } => title,
            StepDefinition::Practice { question, .. } => question,
        }
    }
}

/// Immutable content of one lesson as supplied by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDefinition {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub course: CourseType,
    pub category: Category,
    #[serde(default)]
    pub duration_minutes: u32,
    pub steps: Vec<StepDefinition>,
}

impl LessonDefinition {
    pub fn practice_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_practice()).count()
    }

    /// Indices of practice steps that can never be answered correctly
    pub fn malformed_steps(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_answerable())
            .map(|(i, _)| i)
            .collect()
    }

    /// Words credited on completion: a fixed policy by category
    pub fn words_learned_delta(&self) -> u32 {
        match self.category {
            Category::Vocabulary => 10,
            _ => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::from_str;

    fn practice(options: &[&str], correct: &str) -> StepDefinition {
        StepDefinition::Practice {
            question: "?".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.into(),
            hint: String::new(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_step_deserialization() {
        let json = r#"
        {
            "type": "practice",
            "question": "What is the German word for 7?",
            "options": ["sechs", "sieben"],
            "correct_answer": "sieben",
            "hint": "Count up from 1"
        }
        "#;

        let step: StepDefinition = from_str(json).expect("practice step should parse");
        match step {
            StepDefinition::Practice {
                options,
                correct_answer,
                explanation,
                ..
            } => {
                assert_eq!(options.len(), 2);
                assert_eq!(correct_answer, "sieben");
                assert!(explanation.is_empty());
            }
            other => panic!("expected practice step, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_step_type_is_rejected() {
        let json = r#"{ "type": "quiz", "title": "x", "content": "y" }"#;
        assert!(from_str::<StepDefinition>(json).is_err());
    }

    #[test]
    fn test_practice_without_options_is_rejected() {
        let json = r#"{ "type": "practice", "question": "q", "correct_answer": "a" }"#;
        assert!(from_str::<StepDefinition>(json).is_err());
    }

    #[test]
    fn test_is_answerable() {
        assert!(practice(&["a", "b"], "b").is_answerable());
        assert!(!practice(&["a", "b"], "c").is_answerable());
        assert!(StepDefinition::Intro {
            title: "t".into(),
            content: "c".into()
        }
        .is_answerable());
    }

    #[test]
    fn test_malformed_steps_and_counts() {
        let lesson = LessonDefinition {
            id: 9,
            title: "Mixed".into(),
            description: String::new(),
            course: CourseType::Beginner,
            category: Category::Grammar,
            duration_minutes: 5,
            steps: vec![
                StepDefinition::Intro {
                    title: "t".into(),
                    content: "c".into(),
                },
                practice(&["a", "b"], "a"),
                practice(&["a", "b"], "z"),
            ],
        };

        assert_eq!(lesson.practice_count(), 2);
        assert_eq!(lesson.malformed_steps(), vec![2]);
        assert_eq!(lesson.words_learned_delta(), 5);
    }

    #[test]
    fn test_category_display_matches_serde() {
        assert_eq!(Category::Vocabulary.to_string(), "vocabulary");
        assert_eq!(
            serde_json::to_string(&Category::Phrases).unwrap(),
            "\"phrases\""
        );
        assert_eq!(CourseType::Intermediate.to_string(), "intermediate");
    }
}
