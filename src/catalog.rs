//! Symptom category catalog
//!
//! The catalog is immutable configuration: built once at startup and shared
//! as `Arc<Catalog>` with the state machine, the assessment engine and the
//! report builder.

use crate::state_machine::input::{EXIT_LABEL, RESTART_LABEL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Specialist used when a category has no doctor of its own
pub const FALLBACK_SPECIALIST: &str = "General practitioner";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog must contain at least one category")]
    Empty,
    #[error("Category name must not be blank")]
    BlankName,
    #[error("Category '{0}' has no questions")]
    NoQuestions(String),
    #[error("Duplicate category: {0}")]
    Duplicate(String),
    #[error("Category name '{0}' collides with a reserved command")]
    Reserved(String),
    #[error("Category not found: {0}")]
    NotFound(String),
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One questionnaire track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Asked in this order; drives the "Question i/N" progress line
    pub questions: Vec<String>,
    #[serde(default)]
    pub doctor: String,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        doctor: impl Into<String>,
        questions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            questions: questions.into_iter().map(Into::into).collect(),
            doctor: doctor.into(),
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// Validated, ordered set of categories
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        if categories.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for category in &categories {
            if category.name.trim().is_empty() {
                return Err(CatalogError::BlankName);
            }
            if category.name == RESTART_LABEL
                || category.name == EXIT_LABEL
                || category.name.starts_with('/')
            {
                return Err(CatalogError::Reserved(category.name.clone()));
            }
            if category.questions.is_empty() {
                return Err(CatalogError::NoQuestions(category.name.clone()));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(CatalogError::Duplicate(category.name.clone()));
            }
        }

        Ok(Self { categories })
    }

    /// Load a catalog from a JSON array of categories
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let categories: Vec<Category> = serde_json::from_str(&raw)?;
        Self::new(categories)
    }

    /// Category names in declared order
    pub fn list_categories(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get_category(&self, name: &str) -> Result<&Category, CatalogError> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    pub fn specialist_for(&self, name: &str) -> &str {
        self.get_category(name)
            .ok()
            .map(|c| c.doctor.trim())
            .filter(|d| !d.is_empty())
            .unwrap_or(FALLBACK_SPECIALIST)
    }

    /// The six body-system questionnaires shipped with the service
    pub fn builtin() -> Self {
        Self {
            categories: builtin_categories(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_categories() -> Vec<Category> {
    vec![
        Category::new(
            "Respiratory",
            "Pulmonologist",
            [
                "Do you have a persistent cough (longer than 2-3 weeks)?",
                "Does the cough bring up phlegm?",
                "Do you get short of breath with light exertion?",
                "Do you have chest pain when breathing?",
                "Does your body temperature rise?",
                "Do you have night-time coughing or choking fits?",
                "Do you wheeze when breathing?",
                "Do you smoke or spend time around smoke?",
                "Do you notice weakness, sweating or weight loss?",
                "Have you had lung diseases before?",
            ],
        ),
        Category::new(
            "Digestive",
            "Gastroenterologist",
            [
                "Do you have abdominal pain?",
                "Do you have nausea, vomiting or heartburn?",
                "Has the nature or frequency of your stool changed?",
                "Do you have bloating, rumbling or a feeling of heaviness?",
                "Have you noticed blood or mucus in your stool?",
                "Have you lost weight or appetite?",
                "Do you often eat fried or spicy food, or drink alcohol?",
                "Have you had gastritis, an ulcer or colitis before?",
                "Have you noticed yellowing of the skin or eyes?",
                "Do you have a bitter taste in the mouth or pain under the ribs?",
            ],
        ),
        Category::new(
            "Cardiovascular",
            "Cardiologist",
            [
                "Do you have pain or burning behind the breastbone?",
                "Does the pain appear during physical exertion?",
                "Are you short of breath when walking or at rest?",
                "Do you have a rapid heartbeat?",
                "Do you feel your heart skipping beats?",
                "Do your legs swell in the evening?",
                "Does your blood pressure often rise?",
                "Have you had dizziness or fainting?",
                "Do you have a chronic heart condition?",
                "Do you take medication for blood pressure or the heart?",
            ],
        ),
        Category::new(
            "Nervous system",
            "Neurologist",
            [
                "Do headaches bother you?",
                "Do you have numbness in your limbs or face?",
                "Do you have seizures, shaking or tremor?",
                "Do you have sleep problems or excessive sleepiness?",
                "Do you have sudden mood swings or anxiety?",
                "Do you often feel dizzy?",
                "Have you had head injuries?",
                "Do you have problems with memory, attention or speech?",
                "Is your coordination impaired?",
                "Do you ever lose consciousness?",
            ],
        ),
        Category::new(
            "Endocrine",
            "Endocrinologist",
            [
                "Do you tire quickly or feel weak?",
                "Has your weight changed for no reason?",
                "Are you unusually thirsty or urinating often?",
                "Have you noticed mood changes or irritability?",
                "Do you often feel cold or hot?",
                "Do you have dry skin, brittle nails or hair loss?",
                "Are your sleep, appetite or menstrual cycle disturbed?",
                "Have you had thyroid disease or diabetes?",
                "Do you have swelling of the face or limbs?",
                "Do you get tremor or palpitations?",
            ],
        ),
        Category::new(
            "Musculoskeletal",
            "Orthopedist / Rheumatologist",
            [
                "Do you have pain in the back, neck or joints?",
                "Do you feel stiff in the morning or after rest?",
                "Are your joints swollen, red or deformed?",
                "Does the pain get worse with movement?",
                "Do you have muscle weakness?",
                "Do you have problems with gait or balance?",
                "Do your joints crunch or click when moving?",
                "Have you had bone or ligament injuries?",
                "Do you tire easily after physical activity?",
                "Is movement limited in some parts of your body?",
            ],
        ),
    ]
}
