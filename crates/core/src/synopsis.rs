//! Synopsis drafting.
//!
//! One prompt is issued per section, in a fixed order, against the configured
//! [`CompletionService`].

use crate::completion::CompletionService;
use crate::{SynopsisError, SynopsisResult};
use std::sync::Arc;
use synopsis_types::{PaperRecord, Synopsis};

/// Synopsis sections in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Title,
    Introduction,
    Rationale,
    Objectives,
    LiteratureReview,
    Methodology,
    Feasibility,
    Facilities,
    Outcomes,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::Title,
        Section::Introduction,
        Section::Rationale,
        Section::Objectives,
        Section::LiteratureReview,
        Section::Methodology,
        Section::Feasibility,
        Section::Facilities,
        Section::Outcomes,
    ];

    /// Prompt text for this section about `topic`.
    pub fn prompt(self, topic: &str) -> String {
        match self {
            Section::Title => format!(
                "Generate a formal academic title for a research synopsis about {topic}."
            ),
            Section::Introduction => format!(
                "Write a comprehensive introduction paragraph (approximately 150 words) about \
                 {topic}. Focus on: current challenges, limitations of existing methods, and the \
                 need for better approaches. Keep it formal and academic."
            ),
            Section::Rationale => format!(
                "Write a single focused paragraph (approximately 120 words) explaining why this \
                 research on {topic} is important. Emphasize the advantages and potential impact \
                 of the proposed approach. Keep it concise and well-structured."
            ),
            Section::Objectives => format!(
                "List exactly 3 specific, measurable objectives for the research on {topic}. \
                 Format as numbered list (1. 2. 3.). Each objective should start with 'To' and \
                 include specific metrics or targets. Make them detailed and achievable."
            ),
            Section::LiteratureReview => format!(
                "Write a comprehensive literature review (approximately 250 words) about {topic}. \
                 Cover current approaches, methods being used, challenges, and recent \
                 advancements. Write in flowing paragraphs without points or headings. Keep it \
                 academic and concise."
            ),
            Section::Methodology => format!(
                "Write a detailed methodology section for {topic} with these components:\n\
                 1. Data Collection (numbered points)\n\
                 2. Data Preprocessing (numbered points)\n\
                 3. Feature Extraction (numbered points)\n\
                 4. Model Selection (numbered points)\n\
                 5. Evaluation Methods (numbered points)\n\
                 Make it technical and specific to the research topic."
            ),
            Section::Feasibility => format!(
                "Write a detailed feasibility analysis (approximately 300 words) for {topic} \
                 covering:\n\
                 1. Technical feasibility (available technologies and tools)\n\
                 2. Operational feasibility (implementation and deployment)\n\
                 3. Economic feasibility (cost-benefit analysis)\n\
                 4. Schedule feasibility (time requirements)\n\
                 Make it specific to the proposed research."
            ),
            Section::Facilities => format!(
                "List all required facilities and resources for the {topic} project, including:\n\
                 1. Hardware requirements\n\
                 2. Software requirements\n\
                 3. Data storage and processing facilities\n\
                 4. Development and testing environment\n\
                 5. Any specialized equipment or resources\n\
                 Make it comprehensive and specific to the research requirements."
            ),
            Section::Outcomes => format!(
                "Write a single comprehensive paragraph (approximately 150 words) describing the \
                 expected outcomes of the {topic} research. Include empirical results, practical \
                 applications, and potential impact. Keep it specific and measurable. Do not use \
                 any special formatting or bullet points."
            ),
        }
    }

    fn slot(self, synopsis: &mut Synopsis) -> &mut String {
        match self {
            Section::Title => &mut synopsis.title,
            Section::Introduction => &mut synopsis.introduction,
            Section::Rationale => &mut synopsis.rationale,
            Section::Objectives => &mut synopsis.objectives,
            Section::LiteratureReview => &mut synopsis.literature_review,
            Section::Methodology => &mut synopsis.methodology,
            Section::Feasibility => &mut synopsis.feasibility,
            Section::Facilities => &mut synopsis.facilities,
            Section::Outcomes => &mut synopsis.outcomes,
        }
    }
}

/// Drafts synopses through a completion service.
#[derive(Clone)]
pub struct SynopsisService {
    completion: Arc<dyn CompletionService>,
}

impl SynopsisService {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Drafts every section of a synopsis about the first paper's topic.
    ///
    /// The topic is the lower-cased title of the first paper. Prompts are issued sequentially;
    /// a failed prompt leaves the placeholder text in its section rather than aborting.
    ///
    /// # Errors
    ///
    /// Returns `SynopsisError::NoPapers` if `papers` is empty.
    pub async fn create_synopsis(&self, papers: &[PaperRecord]) -> SynopsisResult<Synopsis> {
        let first = papers
            .first()
            .ok_or_else(|| SynopsisError::NoPapers("no papers to summarise".into()))?;
        let topic = first.title.to_lowercase();

        let mut synopsis = Synopsis::default();
        for section in Section::ALL {
            tracing::info!("generating {:?} section", section);
            *section.slot(&mut synopsis) = self.completion.complete(&section.prompt(&topic)).await;
        }
        Ok(synopsis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCompletion {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionService for RecordingCompletion {
        async fn complete(&self, prompt: &str) -> String {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            format!("reply {}", prompts.len())
        }
    }

    fn paper(title: &str) -> PaperRecord {
        PaperRecord {
            title: title.into(),
            ..PaperRecord::default()
        }
    }

    #[tokio::test]
    async fn test_create_synopsis_fills_sections_in_order() {
        let completion = Arc::new(RecordingCompletion::default());
        let service = SynopsisService::new(completion.clone());

        let synopsis = service
            .create_synopsis(&[paper("Soil Moisture Sensing"), paper("Other")])
            .await
            .unwrap();

        assert_eq!(synopsis.title, "reply 1");
        assert_eq!(synopsis.introduction, "reply 2");
        assert_eq!(synopsis.methodology, "reply 6");
        assert_eq!(synopsis.outcomes, "reply 9");

        let prompts = completion.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 9);
        assert!(prompts.iter().all(|p| p.contains("soil moisture sensing")));
        assert!(prompts[0].starts_with("Generate a formal academic title"));
    }

    #[tokio::test]
    async fn test_create_synopsis_rejects_empty_list() {
        let service = SynopsisService::new(Arc::new(RecordingCompletion::default()));
        let result = service.create_synopsis(&[]).await;
        assert!(matches!(result, Err(SynopsisError::NoPapers(_))));
    }

    #[test]
    fn test_methodology_prompt_lists_numbered_components() {
        let prompt = Section::Methodology.prompt("topic");
        assert!(prompt.contains("\n1. Data Collection"));
        assert!(prompt.contains("\n5. Evaluation Methods"));
    }
}
